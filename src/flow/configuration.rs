use crate::domain::credentials::CredentialsProvider;
use crate::domain::ports::{
    DelegateRef, PaymentFlowDelegate, SharedApiClient, SharedContainerFactory, SharedIconCache,
    SharedViewFactory,
};
use crate::error::{FlowError, Result};
use crate::infrastructure::defaults::{DefaultViewFactory, TracingContainerFactory};
use crate::infrastructure::in_memory::InMemoryIconCache;
use crate::infrastructure::web_service::{HttpIconLoader, WebServiceApiClient};
use reqwest::Url;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Weak};
use tracing::debug;

/// Web service endpoint used when the host does not configure one.
pub const DEFAULT_API_BASE_URL: &str = "https://app-wallee.com/api/";

/// Everything a payment flow needs from its environment.
///
/// The configuration is immutable and can be shared between threads and
/// between flows. It can only be obtained from a [`FlowConfigurationBuilder`].
#[derive(Clone)]
pub struct FlowConfiguration {
    container_factory: SharedContainerFactory,
    view_factory: SharedViewFactory,
    icon_cache: SharedIconCache,
    delegate: Option<DelegateRef>,
    api_client: SharedApiClient,
}

impl FlowConfiguration {
    /// Starts a builder for the given credentials provider.
    pub fn builder(credentials_provider: CredentialsProvider) -> FlowConfigurationBuilder {
        FlowConfigurationBuilder::new(credentials_provider)
    }

    pub fn from_builder(builder: FlowConfigurationBuilder) -> Result<Self> {
        builder.build()
    }

    /// Hands a fresh builder to `configure` and builds it afterwards.
    ///
    /// The fresh builder has no credentials provider; `configure` has to set one.
    /// An error returned by `configure` is passed through unchanged, a panic
    /// inside it is reported as `InvalidState`.
    pub fn make_with<F>(configure: F) -> Result<Self>
    where
        F: FnOnce(&mut FlowConfigurationBuilder) -> Result<()>,
    {
        let mut builder = FlowConfigurationBuilder::default();
        panic::catch_unwind(AssertUnwindSafe(|| configure(&mut builder))).map_err(|_| {
            FlowError::illegal_state("the configuration callback panicked")
        })??;
        builder.build()
    }

    /// Creates the container which hosts the views of a flow.
    pub fn container_factory(&self) -> &SharedContainerFactory {
        &self.container_factory
    }

    pub fn view_factory(&self) -> &SharedViewFactory {
        &self.view_factory
    }

    /// Downloads and caches payment method icons.
    pub fn icon_cache(&self) -> &SharedIconCache {
        &self.icon_cache
    }

    /// The lifecycle observer, if the host set one and still keeps it alive.
    pub fn delegate(&self) -> Option<Arc<dyn PaymentFlowDelegate>> {
        self.delegate.as_ref().and_then(Weak::upgrade)
    }

    pub fn api_client(&self) -> &SharedApiClient {
        &self.api_client
    }
}

impl fmt::Debug for FlowConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlowConfiguration")
            .field("space_id", &self.api_client.space_id())
            .field("delegate_alive", &self.delegate().is_some())
            .finish_non_exhaustive()
    }
}

/// Collects the parts of a [`FlowConfiguration`] before validating them.
///
/// Setters never validate; the last write wins. Every field except the
/// delegate falls back to a default when it is left unset.
#[derive(Clone, Default)]
pub struct FlowConfigurationBuilder {
    credentials_provider: Option<CredentialsProvider>,
    api_base_url: Option<String>,
    container_factory: Option<SharedContainerFactory>,
    view_factory: Option<SharedViewFactory>,
    icon_cache: Option<SharedIconCache>,
    delegate: Option<DelegateRef>,
    api_client: Option<SharedApiClient>,
}

impl FlowConfigurationBuilder {
    pub fn new(credentials_provider: CredentialsProvider) -> Self {
        Self {
            credentials_provider: Some(credentials_provider),
            ..Self::default()
        }
    }

    pub fn set_credentials_provider(&mut self, provider: CredentialsProvider) -> &mut Self {
        self.credentials_provider = Some(provider);
        self
    }

    /// Base URL of the web service the default API client talks to.
    pub fn set_api_base_url(&mut self, url: impl Into<String>) -> &mut Self {
        self.api_base_url = Some(url.into());
        self
    }

    pub fn set_container_factory(&mut self, factory: SharedContainerFactory) -> &mut Self {
        self.container_factory = Some(factory);
        self
    }

    pub fn set_view_factory(&mut self, factory: SharedViewFactory) -> &mut Self {
        self.view_factory = Some(factory);
        self
    }

    pub fn set_icon_cache(&mut self, icon_cache: SharedIconCache) -> &mut Self {
        self.icon_cache = Some(icon_cache);
        self
    }

    /// Only a weak reference is kept; the host stays the owner of its delegate.
    pub fn set_delegate<D>(&mut self, delegate: &Arc<D>) -> &mut Self
    where
        D: PaymentFlowDelegate + 'static,
    {
        let delegate: Weak<D> = Arc::downgrade(delegate);
        self.delegate = Some(delegate);
        self
    }

    pub fn set_api_client(&mut self, api_client: SharedApiClient) -> &mut Self {
        self.api_client = Some(api_client);
        self
    }

    /// Validates the staged fields and produces the immutable configuration.
    pub fn build(self) -> Result<FlowConfiguration> {
        let credentials_provider = self.credentials_provider.ok_or_else(|| {
            FlowError::invalid_credentials(
                "a credentials provider is required to build a flow configuration",
            )
        })?;
        credentials_provider.check_well_formed()?;

        let api_base_url =
            parse_base_url(self.api_base_url.as_deref().unwrap_or(DEFAULT_API_BASE_URL))?;

        let api_client: SharedApiClient = match self.api_client {
            Some(api_client) => api_client,
            None => Arc::new(WebServiceApiClient::new(credentials_provider, api_base_url)?),
        };
        let icon_cache: SharedIconCache = match self.icon_cache {
            Some(icon_cache) => icon_cache,
            None => Arc::new(InMemoryIconCache::new(Arc::new(HttpIconLoader::new()?))),
        };
        let container_factory: SharedContainerFactory = match self.container_factory {
            Some(factory) => factory,
            None => Arc::new(TracingContainerFactory),
        };
        let view_factory: SharedViewFactory = match self.view_factory {
            Some(factory) => factory,
            None => Arc::new(DefaultViewFactory),
        };

        debug!(space_id = api_client.space_id(), "flow configuration built");
        Ok(FlowConfiguration {
            container_factory,
            view_factory,
            icon_cache,
            delegate: self.delegate,
            api_client,
        })
    }
}

fn parse_base_url(raw: &str) -> Result<Url> {
    let mut url = Url::parse(raw).map_err(|err| {
        FlowError::illegal_argument(format!("api_base_url '{raw}' is not a valid URL: {err}"))
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(FlowError::illegal_argument(format!(
            "api_base_url '{raw}' must use http or https"
        )));
    }
    // Relative endpoint paths are joined onto the base, which needs a trailing slash.
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

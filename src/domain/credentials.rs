use super::ports::SharedCredentialsFetcher;
use crate::error::{FlowError, Result};
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Credentials are refetched this long before they actually expire.
const EXPIRY_MARGIN_SECONDS: i64 = 20;

/// Authentication material that grants access to a single transaction of a space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    space_id: u64,
    transaction_id: u64,
    token: String,
    expires_at: DateTime<Utc>,
}

impl Credentials {
    pub fn new(
        space_id: u64,
        transaction_id: u64,
        token: impl Into<String>,
        expires_at: DateTime<Utc>,
    ) -> Result<Self> {
        let token = token.into();
        if space_id == 0 {
            return Err(FlowError::invalid_credentials("space id must not be zero"));
        }
        if transaction_id == 0 {
            return Err(FlowError::invalid_credentials(
                "transaction id must not be zero",
            ));
        }
        if token.trim().is_empty() {
            return Err(FlowError::invalid_credentials("token must not be blank"));
        }
        Ok(Self {
            space_id,
            transaction_id,
            token,
            expires_at,
        })
    }

    pub fn space_id(&self) -> u64 {
        self.space_id
    }

    pub fn transaction_id(&self) -> u64 {
        self.transaction_id
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Whether the credentials can still be used at `now`, keeping a safety margin.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(EXPIRY_MARGIN_SECONDS) < self.expires_at
    }
}

/// Hands out valid credentials for one space.
///
/// Credentials are fetched lazily through a [`CredentialsFetcher`](super::ports::CredentialsFetcher)
/// and cached until they are about to expire. The cache is shared between clones.
#[derive(Clone)]
pub struct CredentialsProvider {
    space_id: u64,
    fetcher: SharedCredentialsFetcher,
    cached: Arc<RwLock<Option<Credentials>>>,
}

impl CredentialsProvider {
    pub fn new(space_id: u64, fetcher: SharedCredentialsFetcher) -> Self {
        Self {
            space_id,
            fetcher,
            cached: Arc::new(RwLock::new(None)),
        }
    }

    pub fn space_id(&self) -> u64 {
        self.space_id
    }

    /// Validates the provider itself, without contacting the fetcher.
    pub fn check_well_formed(&self) -> Result<()> {
        if self.space_id == 0 {
            return Err(FlowError::invalid_credentials(
                "credentials provider is bound to space id 0",
            ));
        }
        Ok(())
    }

    /// Returns cached credentials while they are valid, fetches new ones otherwise.
    pub async fn get_credentials(&self) -> Result<Credentials> {
        let now = Utc::now();
        if let Some(credentials) = self.cached.read().await.as_ref()
            && credentials.is_valid_at(now)
        {
            return Ok(credentials.clone());
        }

        let mut cached = self.cached.write().await;
        // Another caller may have refreshed the cache while we waited for the lock.
        if let Some(credentials) = cached.as_ref()
            && credentials.is_valid_at(now)
        {
            return Ok(credentials.clone());
        }

        debug!(space_id = self.space_id, "fetching credentials");
        let credentials = self.fetcher.fetch().await?;
        if credentials.space_id() != self.space_id {
            return Err(FlowError::invalid_credentials(format!(
                "fetched credentials belong to space {} instead of {}",
                credentials.space_id(),
                self.space_id
            )));
        }
        if !credentials.is_valid_at(now) {
            return Err(FlowError::invalid_credentials(
                "fetched credentials are already expired",
            ));
        }

        *cached = Some(credentials.clone());
        Ok(credentials)
    }
}

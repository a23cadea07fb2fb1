//! Default adapters talking HTTP to the payment web service.

use crate::domain::credentials::CredentialsProvider;
use crate::domain::payment_method::{PaymentMethodConfiguration, PaymentMethodIcon};
use crate::domain::ports::{ApiClient, IconLoader};
use crate::domain::transaction::TransactionSummary;
use crate::error::{FlowError, Result, check_array_type, check_dictionary_type};
use async_trait::async_trait;
use reqwest::{Client, Url, header};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Header carrying the credentials token on every request.
pub const TOKEN_HEADER: &str = "x-mobile-sdk-token";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const USER_AGENT: &str = concat!("payflow/", env!("CARGO_PKG_VERSION"));

fn http_client() -> Result<Client> {
    Ok(Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .user_agent(USER_AGENT)
        .build()?)
}

/// API client bound to the transaction the credentials provider grants access to.
#[derive(Clone)]
pub struct WebServiceApiClient {
    http: Client,
    base_url: Url,
    credentials_provider: CredentialsProvider,
}

impl WebServiceApiClient {
    pub fn new(credentials_provider: CredentialsProvider, base_url: Url) -> Result<Self> {
        Ok(Self {
            http: http_client()?,
            base_url,
            credentials_provider,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn credentials_provider(&self) -> &CredentialsProvider {
        &self.credentials_provider
    }

    async fn get_json(&self, path: &str) -> Result<Value> {
        let credentials = self.credentials_provider.get_credentials().await?;
        let url = self.base_url.join(path).map_err(|err| {
            FlowError::illegal_argument(format!("cannot build request URL for '{path}': {err}"))
        })?;

        debug!(%url, transaction_id = credentials.transaction_id(), "requesting");
        let response = self
            .http
            .get(url)
            .query(&[
                ("spaceId", credentials.space_id()),
                ("id", credentials.transaction_id()),
            ])
            .header(TOKEN_HEADER, credentials.token())
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FlowError::http(format!("{status} for {path}: {body}")));
        }
        Ok(response.json::<Value>().await?)
    }
}

fn decode<T: DeserializeOwned>(value: Value, what: &str) -> Result<T> {
    serde_json::from_value(value)
        .map_err(|err| FlowError::http(format!("malformed {what} in response: {err}")))
}

#[async_trait]
impl ApiClient for WebServiceApiClient {
    fn space_id(&self) -> u64 {
        self.credentials_provider.space_id()
    }

    async fn fetch_possible_payment_methods(&self) -> Result<Vec<PaymentMethodConfiguration>> {
        let body = self
            .get_json("transaction/fetch-possible-payment-methods")
            .await?;
        check_array_type(&body, Some("possible payment methods response"))?
            .iter()
            .map(|item| decode(item.clone(), "payment method"))
            .collect()
    }

    async fn read_transaction(&self) -> Result<TransactionSummary> {
        let body = self.get_json("transaction/read").await?;
        check_dictionary_type(&body, "transaction response")?;
        decode(body, "transaction")
    }
}

/// Downloads icons from the `image_resource_path` of a payment method.
#[derive(Clone)]
pub struct HttpIconLoader {
    http: Client,
}

impl HttpIconLoader {
    pub fn new() -> Result<Self> {
        Ok(Self {
            http: http_client()?,
        })
    }
}

#[async_trait]
impl IconLoader for HttpIconLoader {
    async fn load(&self, method: &PaymentMethodConfiguration) -> Result<PaymentMethodIcon> {
        let path = method.image_resource_path.as_deref().ok_or_else(|| {
            FlowError::illegal_argument(format!("payment method {} has no icon", method.id))
        })?;

        let response = self.http.get(path).send().await?.error_for_status()?;
        let mime_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();
        let data = response.bytes().await?.to_vec();

        Ok(PaymentMethodIcon {
            method_id: method.id,
            mime_type,
            data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::credentials::Credentials;
    use crate::error::ErrorCategory;
    use crate::infrastructure::in_memory::StaticCredentialsFetcher;
    use chrono::{Duration as ChronoDuration, Utc};
    use serde_json::json;
    use std::sync::Arc;

    fn provider() -> CredentialsProvider {
        let credentials =
            Credentials::new(12, 34, "secret", Utc::now() + ChronoDuration::hours(1)).unwrap();
        CredentialsProvider::new(12, Arc::new(StaticCredentialsFetcher::new(credentials)))
    }

    #[test]
    fn test_client_space_follows_provider() {
        let base = Url::parse("https://example.com/api/").unwrap();
        let client = WebServiceApiClient::new(provider(), base).unwrap();
        assert_eq!(client.space_id(), 12);
        assert_eq!(client.base_url().as_str(), "https://example.com/api/");
    }

    #[test]
    fn test_decode_reports_http_category() {
        let err = decode::<TransactionSummary>(json!({"id": "x"}), "transaction").unwrap_err();
        assert_eq!(err.category(), ErrorCategory::HttpError);
        assert!(err.message().contains("transaction"));
    }

    #[tokio::test]
    async fn test_icon_loader_requires_path() {
        let loader = HttpIconLoader::new().unwrap();
        let method = PaymentMethodConfiguration {
            id: 5,
            space_id: 12,
            name: "Invoice".to_string(),
            description: None,
            image_resource_path: None,
            sort_order: 0,
        };
        let err = loader.load(&method).await.unwrap_err();
        assert_eq!(err.category(), ErrorCategory::InvalidArgument);
    }
}

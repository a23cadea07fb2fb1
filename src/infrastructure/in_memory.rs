use crate::domain::credentials::Credentials;
use crate::domain::payment_method::{PaymentMethodConfiguration, PaymentMethodIcon};
use crate::domain::ports::{ApiClient, CredentialsFetcher, IconCache, SharedIconLoader};
use crate::domain::transaction::TransactionSummary;
use crate::error::{FlowError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;

/// A thread-safe icon cache keeping downloaded icons in memory.
///
/// Uses `Arc<RwLock<HashMap<u64, PaymentMethodIcon>>>` keyed by payment method id,
/// so clones share the same cache. Misses are delegated to the icon loader.
#[derive(Clone)]
pub struct InMemoryIconCache {
    icons: Arc<RwLock<HashMap<u64, PaymentMethodIcon>>>,
    loader: SharedIconLoader,
}

impl InMemoryIconCache {
    pub fn new(loader: SharedIconLoader) -> Self {
        Self {
            icons: Arc::new(RwLock::new(HashMap::new())),
            loader,
        }
    }

    pub async fn len(&self) -> usize {
        self.icons.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.icons.read().await.is_empty()
    }
}

#[async_trait]
impl IconCache for InMemoryIconCache {
    async fn fetch(&self, method: &PaymentMethodConfiguration) -> Result<PaymentMethodIcon> {
        if let Some(icon) = self.icons.read().await.get(&method.id) {
            return Ok(icon.clone());
        }

        let icon = self.loader.load(method).await?;
        let mut icons = self.icons.write().await;
        icons.insert(method.id, icon.clone());
        Ok(icon)
    }
}

/// An API client answering from memory instead of the web service.
///
/// Serves canned payment methods and a canned transaction. Counts requests so
/// tests can observe what the flow asked for.
#[derive(Clone)]
pub struct InMemoryApiClient {
    space_id: u64,
    methods: Arc<RwLock<Vec<PaymentMethodConfiguration>>>,
    transaction: Arc<RwLock<Option<TransactionSummary>>>,
    failure: Option<FlowError>,
    method_requests: Arc<AtomicUsize>,
    transaction_reads: Arc<AtomicUsize>,
}

impl InMemoryApiClient {
    pub fn new(space_id: u64) -> Self {
        Self {
            space_id,
            methods: Arc::new(RwLock::new(Vec::new())),
            transaction: Arc::new(RwLock::new(None)),
            failure: None,
            method_requests: Arc::new(AtomicUsize::new(0)),
            transaction_reads: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_methods(mut self, methods: Vec<PaymentMethodConfiguration>) -> Self {
        self.methods = Arc::new(RwLock::new(methods));
        self
    }

    pub fn with_transaction(mut self, transaction: TransactionSummary) -> Self {
        self.transaction = Arc::new(RwLock::new(Some(transaction)));
        self
    }

    /// Every request fails with `error`.
    pub fn failing_with(mut self, error: FlowError) -> Self {
        self.failure = Some(error);
        self
    }

    pub async fn set_transaction(&self, transaction: TransactionSummary) {
        *self.transaction.write().await = Some(transaction);
    }

    pub fn method_requests(&self) -> Arc<AtomicUsize> {
        self.method_requests.clone()
    }

    pub fn transaction_reads(&self) -> Arc<AtomicUsize> {
        self.transaction_reads.clone()
    }
}

#[async_trait]
impl ApiClient for InMemoryApiClient {
    fn space_id(&self) -> u64 {
        self.space_id
    }

    async fn fetch_possible_payment_methods(&self) -> Result<Vec<PaymentMethodConfiguration>> {
        self.method_requests.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = &self.failure {
            return Err(error.clone());
        }
        Ok(self.methods.read().await.clone())
    }

    async fn read_transaction(&self) -> Result<TransactionSummary> {
        self.transaction_reads.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = &self.failure {
            return Err(error.clone());
        }
        self.transaction
            .read()
            .await
            .clone()
            .ok_or_else(|| FlowError::http("404 Not Found: no transaction available"))
    }
}

/// Hands out the same credentials on every fetch.
#[derive(Clone)]
pub struct StaticCredentialsFetcher {
    credentials: Credentials,
}

impl StaticCredentialsFetcher {
    pub fn new(credentials: Credentials) -> Self {
        Self { credentials }
    }
}

#[async_trait]
impl CredentialsFetcher for StaticCredentialsFetcher {
    async fn fetch(&self) -> Result<Credentials> {
        Ok(self.credentials.clone())
    }
}

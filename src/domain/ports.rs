use super::credentials::Credentials;
use super::payment_method::{PaymentMethodConfiguration, PaymentMethodIcon};
use super::transaction::TransactionSummary;
use super::view::PaymentView;
use crate::error::{FlowError, Result};
use crate::flow::state::FlowState;
use async_trait::async_trait;
use std::sync::{Arc, Weak};

/// Access to the remote payment web service, bound to one transaction.
#[async_trait]
pub trait ApiClient: Send + Sync {
    /// Space the client issues requests for.
    fn space_id(&self) -> u64;
    async fn fetch_possible_payment_methods(&self) -> Result<Vec<PaymentMethodConfiguration>>;
    async fn read_transaction(&self) -> Result<TransactionSummary>;
}

/// Hands out payment method icons, caching them internally.
#[async_trait]
pub trait IconCache: Send + Sync {
    async fn fetch(&self, method: &PaymentMethodConfiguration) -> Result<PaymentMethodIcon>;
}

/// Downloads a payment method icon without any caching.
#[async_trait]
pub trait IconLoader: Send + Sync {
    async fn load(&self, method: &PaymentMethodConfiguration) -> Result<PaymentMethodIcon>;
}

/// Obtains fresh credentials, typically from the merchant's backend.
#[async_trait]
pub trait CredentialsFetcher: Send + Sync {
    async fn fetch(&self) -> Result<Credentials>;
}

pub trait ViewFactory: Send + Sync {
    fn build_state_view(&self, state: &FlowState) -> PaymentView;
    fn build_failure_view(&self, error: &FlowError) -> PaymentView;
}

/// Hosts the views of one running flow.
pub trait PaymentFlowContainer: Send {
    fn display(&mut self, view: PaymentView);
}

pub trait PaymentFlowContainerFactory: Send + Sync {
    fn create(&self) -> Box<dyn PaymentFlowContainer>;
}

/// Lifecycle observer implemented by the host application.
pub trait PaymentFlowDelegate: Send + Sync {
    fn flow_started(&self) {}
    fn flow_state_changed(&self, _state: &FlowState) {}
    fn flow_completed(&self);
    fn flow_failed(&self, error: &FlowError);
    fn flow_cancelled(&self);
}

pub type SharedApiClient = Arc<dyn ApiClient>;
pub type SharedIconCache = Arc<dyn IconCache>;
pub type SharedIconLoader = Arc<dyn IconLoader>;
pub type SharedCredentialsFetcher = Arc<dyn CredentialsFetcher>;
pub type SharedViewFactory = Arc<dyn ViewFactory>;
pub type SharedContainerFactory = Arc<dyn PaymentFlowContainerFactory>;
pub type DelegateRef = Weak<dyn PaymentFlowDelegate>;

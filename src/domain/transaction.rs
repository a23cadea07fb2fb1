use rust_decimal::Decimal;
use serde::Deserialize;

/// Lifecycle states of a transaction as reported by the web service.
#[derive(Debug, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionState {
    Create,
    Pending,
    Confirmed,
    Processing,
    Authorized,
    Completed,
    Fulfill,
    Failed,
    Decline,
    Voided,
}

impl TransactionState {
    /// The payment went through and the flow can be completed.
    pub fn is_successful(self) -> bool {
        matches!(
            self,
            TransactionState::Authorized | TransactionState::Completed | TransactionState::Fulfill
        )
    }

    /// The payment cannot succeed anymore.
    pub fn is_failed(self) -> bool {
        matches!(
            self,
            TransactionState::Failed | TransactionState::Decline | TransactionState::Voided
        )
    }
}

#[derive(Debug, Deserialize, PartialEq, Eq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct TransactionSummary {
    pub id: u64,
    pub state: TransactionState,
    pub authorization_amount: Decimal,
    pub currency: String,
}

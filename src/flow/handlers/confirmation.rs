use crate::domain::payment_method::PaymentMethodConfiguration;
use crate::domain::ports::SharedApiClient;
use crate::error::{FlowError, Result};
use crate::flow::configuration::FlowConfiguration;
use crate::flow::handler::{FlowStateHandler, SimpleFlowStateHandler};
use crate::flow::state::{EventSender, FlowEvent, FlowStateKind, Transition};
use std::time::Duration;
use tracing::{debug, info};

const POLL_INTERVAL: Duration = Duration::from_secs(2);
const MAX_POLLS: u32 = 10;

/// Waits for the transaction to reach a final state after the form was submitted.
///
/// Pending transactions are read again every [`POLL_INTERVAL`] until they
/// succeed, fail, or the poll budget is exhausted.
pub struct ConfirmationStateHandler {
    base: SimpleFlowStateHandler,
    method: PaymentMethodConfiguration,
    api_client: Option<SharedApiClient>,
    events: Option<EventSender>,
    polls: u32,
}

impl ConfirmationStateHandler {
    pub fn new(method: PaymentMethodConfiguration) -> Self {
        Self {
            base: SimpleFlowStateHandler::new(FlowStateKind::Confirmation),
            method,
            api_client: None,
            events: None,
            polls: 0,
        }
    }

    fn poll(&mut self, delay: Duration) -> Result<()> {
        let (Some(api_client), Some(events)) = (self.api_client.clone(), self.events.clone())
        else {
            return Err(FlowError::illegal_state(
                "confirmation polled before it was entered",
            ));
        };
        self.polls += 1;
        let sender = events.clone();
        self.base.spawn(&sender, async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            let result = api_client.read_transaction().await;
            if events.send(FlowEvent::TransactionLoaded(result)).is_err() {
                debug!("transaction read after the flow went away");
            }
        })
    }
}

impl FlowStateHandler for ConfirmationStateHandler {
    fn state(&self) -> FlowStateKind {
        self.base.kind()
    }

    fn enter(&mut self, configuration: &FlowConfiguration, events: &EventSender) -> Result<()> {
        self.base.mark_entered()?;
        self.api_client = Some(configuration.api_client().clone());
        self.events = Some(events.clone());
        self.poll(Duration::ZERO)
    }

    fn handle_event(&mut self, event: FlowEvent) -> Transition {
        let transition = match event {
            FlowEvent::TransactionLoaded(Ok(transaction)) if transaction.state.is_successful() => {
                info!(
                    transaction_id = transaction.id,
                    method_id = self.method.id,
                    amount = %transaction.authorization_amount,
                    currency = %transaction.currency,
                    "transaction confirmed"
                );
                Transition::Complete
            }
            FlowEvent::TransactionLoaded(Ok(transaction)) if transaction.state.is_failed() => {
                Transition::Fail(FlowError::illegal_state(format!(
                    "transaction {} ended in state {:?}",
                    transaction.id, transaction.state
                )))
            }
            FlowEvent::TransactionLoaded(Ok(transaction)) => {
                if self.polls >= MAX_POLLS {
                    Transition::Fail(FlowError::illegal_state(format!(
                        "transaction {} is still {:?} after {} reads",
                        transaction.id, transaction.state, self.polls
                    )))
                } else {
                    debug!(transaction_id = transaction.id, state = ?transaction.state, "transaction pending");
                    match self.poll(POLL_INTERVAL) {
                        Ok(()) => Transition::Stay,
                        Err(error) => Transition::Fail(error),
                    }
                }
            }
            FlowEvent::TransactionLoaded(Err(error)) => Transition::Fail(error),
            _ => Transition::Stay,
        };
        self.base.settle(transition)
    }

    fn is_terminal(&self) -> bool {
        self.base.is_terminal()
    }

    fn cancel(&mut self) {
        self.base.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::transaction::{TransactionState, TransactionSummary};
    use crate::error::ErrorCategory;
    use crate::flow::handlers::test_support::{configuration_with, method};
    use crate::infrastructure::in_memory::InMemoryApiClient;
    use rust_decimal_macros::dec;
    use tokio::sync::mpsc;

    fn summary(state: TransactionState) -> TransactionSummary {
        TransactionSummary {
            id: 7,
            state,
            authorization_amount: dec!(25.00),
            currency: "CHF".to_string(),
        }
    }

    #[tokio::test]
    async fn test_authorized_transaction_completes() {
        let client = InMemoryApiClient::new(1).with_transaction(summary(TransactionState::Authorized));
        let configuration = configuration_with(client);
        let (events, mut received) = mpsc::unbounded_channel();

        let mut handler = ConfirmationStateHandler::new(method(1, 0));
        handler.enter(&configuration, &events).unwrap();
        let event = received.recv().await.unwrap();

        assert!(!handler.is_terminal());
        assert_eq!(handler.handle_event(event), Transition::Complete);
        assert!(handler.is_terminal());
        assert_eq!(
            handler.handle_event(FlowEvent::PaymentFormSubmitted),
            Transition::Stay
        );
    }

    #[test]
    fn test_declined_transaction_fails() {
        let mut handler = ConfirmationStateHandler::new(method(1, 0));
        let transition =
            handler.handle_event(FlowEvent::TransactionLoaded(Ok(summary(TransactionState::Decline))));
        assert!(matches!(
            transition,
            Transition::Fail(ref error) if error.category() == ErrorCategory::InvalidState
        ));
        assert!(handler.is_terminal());
    }

    #[tokio::test(start_paused = true)]
    async fn test_pending_transaction_is_read_again() {
        let client = InMemoryApiClient::new(1).with_transaction(summary(TransactionState::Pending));
        let reads = client.transaction_reads();
        let configuration = configuration_with(client);
        let (events, mut received) = mpsc::unbounded_channel();

        let mut handler = ConfirmationStateHandler::new(method(1, 0));
        handler.enter(&configuration, &events).unwrap();

        let event = received.recv().await.unwrap();
        assert_eq!(handler.handle_event(event), Transition::Stay);

        let event = received.recv().await.unwrap();
        assert!(matches!(event, FlowEvent::TransactionLoaded(Ok(_))));
        assert_eq!(reads.load(std::sync::atomic::Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pending_transaction_gives_up_after_max_polls() {
        let client = InMemoryApiClient::new(1).with_transaction(summary(TransactionState::Pending));
        let reads = client.transaction_reads();
        let configuration = configuration_with(client);
        let (events, mut received) = mpsc::unbounded_channel();

        let mut handler = ConfirmationStateHandler::new(method(1, 0));
        handler.enter(&configuration, &events).unwrap();

        let mut transition = Transition::Stay;
        for _ in 0..MAX_POLLS {
            let event = received.recv().await.unwrap();
            transition = handler.handle_event(event);
            if transition.is_terminal() {
                break;
            }
        }

        match transition {
            Transition::Fail(error) => {
                assert_eq!(error.category(), ErrorCategory::InvalidState);
                assert!(error.message().contains("after 10 reads"));
            }
            other => panic!("unexpected transition {other:?}"),
        }
        assert!(handler.is_terminal());
        assert_eq!(reads.load(std::sync::atomic::Ordering::SeqCst), 10);
        assert_eq!(handler.base.pending_tasks(), 0);
    }

    #[test]
    fn test_poll_before_enter_is_rejected() {
        let mut handler = ConfirmationStateHandler::new(method(1, 0));
        let err = handler.poll(Duration::ZERO).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::InvalidState);
    }
}

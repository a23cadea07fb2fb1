use crate::error::{FlowError, Result};
use crate::flow::configuration::FlowConfiguration;
use crate::flow::handler::{FlowStateHandler, SimpleFlowStateHandler};
use crate::flow::state::{EventSender, FlowEvent, FlowState, FlowStateKind, Transition};
use tracing::{debug, info};

/// Start state: loads the payment methods that are possible for the transaction.
///
/// Advances to method selection once the methods arrived, fails with the
/// client's error otherwise.
pub struct PaymentMethodLoadingStateHandler {
    base: SimpleFlowStateHandler,
}

impl PaymentMethodLoadingStateHandler {
    pub fn new() -> Self {
        Self {
            base: SimpleFlowStateHandler::new(FlowStateKind::MethodLoading),
        }
    }
}

impl Default for PaymentMethodLoadingStateHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl FlowStateHandler for PaymentMethodLoadingStateHandler {
    fn state(&self) -> FlowStateKind {
        self.base.kind()
    }

    fn enter(&mut self, configuration: &FlowConfiguration, events: &EventSender) -> Result<()> {
        self.base.mark_entered()?;
        let api_client = configuration.api_client().clone();
        let sender = events.clone();
        self.base.spawn(events, async move {
            let result = api_client.fetch_possible_payment_methods().await;
            if sender.send(FlowEvent::PaymentMethodsLoaded(result)).is_err() {
                debug!("payment methods loaded after the flow went away");
            }
        })
    }

    fn handle_event(&mut self, event: FlowEvent) -> Transition {
        let transition = match event {
            FlowEvent::PaymentMethodsLoaded(Ok(mut methods)) => {
                if methods.is_empty() {
                    Transition::Fail(FlowError::illegal_state(
                        "no payment method is available for this transaction",
                    ))
                } else {
                    info!(count = methods.len(), "payment methods loaded");
                    methods.sort_by_key(|method| method.sort_order);
                    Transition::Advance(FlowState::MethodSelection { methods })
                }
            }
            FlowEvent::PaymentMethodsLoaded(Err(error)) => Transition::Fail(error),
            _ => Transition::Stay,
        };
        self.base.settle(transition)
    }

    fn is_terminal(&self) -> bool {
        self.base.is_terminal()
    }

    fn allowed_transitions(&self) -> &'static [FlowStateKind] {
        &[FlowStateKind::MethodSelection]
    }

    fn cancel(&mut self) {
        self.base.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCategory;
    use crate::flow::handlers::test_support::{configuration_with, method};
    use crate::infrastructure::in_memory::InMemoryApiClient;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_enter_requests_methods_and_advances() {
        let client = InMemoryApiClient::new(1).with_methods(vec![method(2, 5), method(1, 1)]);
        let configuration = configuration_with(client);
        let (events, mut received) = mpsc::unbounded_channel();

        let mut handler = PaymentMethodLoadingStateHandler::new();
        handler.enter(&configuration, &events).unwrap();

        let event = received.recv().await.unwrap();
        let transition = handler.handle_event(event);
        match transition {
            Transition::Advance(FlowState::MethodSelection { methods }) => {
                let ids: Vec<u64> = methods.iter().map(|m| m.id).collect();
                assert_eq!(ids, vec![1, 2]);
            }
            other => panic!("unexpected transition {other:?}"),
        }
        assert!(!handler.is_terminal());
    }

    #[tokio::test]
    async fn test_http_error_fails_the_state() {
        let client = InMemoryApiClient::new(1).failing_with(FlowError::http("503 Service Unavailable"));
        let configuration = configuration_with(client);
        let (events, mut received) = mpsc::unbounded_channel();

        let mut handler = PaymentMethodLoadingStateHandler::new();
        handler.enter(&configuration, &events).unwrap();
        assert!(!handler.is_terminal());

        let event = received.recv().await.unwrap();
        match handler.handle_event(event) {
            Transition::Fail(error) => assert_eq!(error.category(), ErrorCategory::HttpError),
            other => panic!("unexpected transition {other:?}"),
        }
        assert!(handler.is_terminal());
    }

    #[test]
    fn test_empty_method_list_fails() {
        let mut handler = PaymentMethodLoadingStateHandler::new();
        let transition = handler.handle_event(FlowEvent::PaymentMethodsLoaded(Ok(vec![])));
        assert!(matches!(
            transition,
            Transition::Fail(ref error) if error.category() == ErrorCategory::InvalidState
        ));
    }

    #[test]
    fn test_unrelated_events_are_ignored() {
        let mut handler = PaymentMethodLoadingStateHandler::new();
        assert_eq!(handler.handle_event(FlowEvent::PaymentFormSubmitted), Transition::Stay);
        assert_eq!(handler.handle_event(FlowEvent::PaymentMethodSelected(9)), Transition::Stay);
        assert!(!handler.is_terminal());
    }

    #[tokio::test]
    async fn test_enter_twice_is_rejected() {
        let configuration = configuration_with(InMemoryApiClient::new(1));
        let (events, _received) = mpsc::unbounded_channel();

        let mut handler = PaymentMethodLoadingStateHandler::new();
        handler.enter(&configuration, &events).unwrap();
        let err = handler.enter(&configuration, &events).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::InvalidState);
    }
}

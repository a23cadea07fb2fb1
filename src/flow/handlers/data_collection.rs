use crate::domain::payment_method::PaymentMethodConfiguration;
use crate::error::Result;
use crate::flow::configuration::FlowConfiguration;
use crate::flow::handler::{FlowStateHandler, SimpleFlowStateHandler};
use crate::flow::state::{EventSender, FlowEvent, FlowState, FlowStateKind, Transition};

/// The buyer fills in the payment form of the chosen method.
pub struct PaymentDataCollectionStateHandler {
    base: SimpleFlowStateHandler,
    method: PaymentMethodConfiguration,
}

impl PaymentDataCollectionStateHandler {
    pub fn new(method: PaymentMethodConfiguration) -> Self {
        Self {
            base: SimpleFlowStateHandler::new(FlowStateKind::DataCollection),
            method,
        }
    }
}

impl FlowStateHandler for PaymentDataCollectionStateHandler {
    fn state(&self) -> FlowStateKind {
        self.base.kind()
    }

    fn enter(&mut self, _configuration: &FlowConfiguration, _events: &EventSender) -> Result<()> {
        self.base.mark_entered()
    }

    fn handle_event(&mut self, event: FlowEvent) -> Transition {
        let transition = match event {
            FlowEvent::PaymentFormSubmitted => Transition::Advance(FlowState::Confirmation {
                method: self.method.clone(),
            }),
            FlowEvent::ChangePaymentMethod => Transition::Advance(FlowState::MethodLoading),
            _ => Transition::Stay,
        };
        self.base.settle(transition)
    }

    fn is_terminal(&self) -> bool {
        self.base.is_terminal()
    }

    fn allowed_transitions(&self) -> &'static [FlowStateKind] {
        &[FlowStateKind::Confirmation, FlowStateKind::MethodLoading]
    }
}

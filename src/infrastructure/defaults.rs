use crate::domain::ports::{PaymentFlowContainer, PaymentFlowContainerFactory, ViewFactory};
use crate::domain::view::PaymentView;
use crate::error::FlowError;
use crate::flow::state::FlowState;
use tracing::info;

/// Maps every flow state onto the view describing it.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultViewFactory;

impl ViewFactory for DefaultViewFactory {
    fn build_state_view(&self, state: &FlowState) -> PaymentView {
        match state {
            FlowState::MethodLoading => PaymentView::Loading {
                message: "Loading payment methods".to_string(),
            },
            FlowState::MethodSelection { methods } => PaymentView::PaymentMethodList {
                methods: methods.clone(),
            },
            FlowState::DataCollection { method } => PaymentView::PaymentForm {
                method: method.clone(),
            },
            FlowState::Confirmation { method } => PaymentView::Confirmation {
                method: method.clone(),
            },
            FlowState::Completed => PaymentView::Success,
            FlowState::Failed => PaymentView::Failure {
                error: FlowError::illegal_state("the payment flow failed"),
            },
        }
    }

    fn build_failure_view(&self, error: &FlowError) -> PaymentView {
        PaymentView::Failure {
            error: error.clone(),
        }
    }
}

/// Creates containers that only log what they are asked to display.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingContainerFactory;

impl PaymentFlowContainerFactory for TracingContainerFactory {
    fn create(&self) -> Box<dyn PaymentFlowContainer> {
        Box::new(TracingContainer::default())
    }
}

#[derive(Debug, Default)]
pub struct TracingContainer {
    current: Option<PaymentView>,
}

impl TracingContainer {
    pub fn current(&self) -> Option<&PaymentView> {
        self.current.as_ref()
    }
}

impl PaymentFlowContainer for TracingContainer {
    fn display(&mut self, view: PaymentView) {
        info!(?view, "displaying view");
        self.current = Some(view);
    }
}

//! Concrete state handlers, one per step of the payment flow.

pub mod confirmation;
pub mod data_collection;
pub mod method_loading;
pub mod method_selection;

pub use confirmation::ConfirmationStateHandler;
pub use data_collection::PaymentDataCollectionStateHandler;
pub use method_loading::PaymentMethodLoadingStateHandler;
pub use method_selection::PaymentMethodSelectionStateHandler;

use super::handler::FlowStateHandler;
use super::state::FlowState;

/// Creates the handler responsible for `state`.
///
/// Terminal states have no handler.
pub fn handler_for(state: &FlowState) -> Option<Box<dyn FlowStateHandler>> {
    match state {
        FlowState::MethodLoading => Some(Box::new(PaymentMethodLoadingStateHandler::new())),
        FlowState::MethodSelection { methods } => Some(Box::new(
            PaymentMethodSelectionStateHandler::new(methods.clone()),
        )),
        FlowState::DataCollection { method } => Some(Box::new(
            PaymentDataCollectionStateHandler::new(method.clone()),
        )),
        FlowState::Confirmation { method } => {
            Some(Box::new(ConfirmationStateHandler::new(method.clone())))
        }
        FlowState::Completed | FlowState::Failed => None,
    }
}

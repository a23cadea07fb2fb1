use crate::domain::payment_method::PaymentMethodConfiguration;
use crate::domain::transaction::TransactionSummary;
use crate::error::{FlowError, Result};
use std::fmt;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

/// Identifies which kind of handler is active, without the data it carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlowStateKind {
    MethodLoading,
    MethodSelection,
    DataCollection,
    Confirmation,
    Completed,
    Failed,
}

impl FlowStateKind {
    pub fn is_terminal(self) -> bool {
        matches!(self, FlowStateKind::Completed | FlowStateKind::Failed)
    }
}

impl fmt::Display for FlowStateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FlowStateKind::MethodLoading => "method_loading",
            FlowStateKind::MethodSelection => "method_selection",
            FlowStateKind::DataCollection => "data_collection",
            FlowStateKind::Confirmation => "confirmation",
            FlowStateKind::Completed => "completed",
            FlowStateKind::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// A state of the flow together with the data its handler needs.
#[derive(Debug, Clone, PartialEq)]
pub enum FlowState {
    /// Start state: the possible payment methods are requested.
    MethodLoading,
    MethodSelection {
        methods: Vec<PaymentMethodConfiguration>,
    },
    DataCollection {
        method: PaymentMethodConfiguration,
    },
    Confirmation {
        method: PaymentMethodConfiguration,
    },
    Completed,
    Failed,
}

impl FlowState {
    pub fn kind(&self) -> FlowStateKind {
        match self {
            FlowState::MethodLoading => FlowStateKind::MethodLoading,
            FlowState::MethodSelection { .. } => FlowStateKind::MethodSelection,
            FlowState::DataCollection { .. } => FlowStateKind::DataCollection,
            FlowState::Confirmation { .. } => FlowStateKind::Confirmation,
            FlowState::Completed => FlowStateKind::Completed,
            FlowState::Failed => FlowStateKind::Failed,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.kind().is_terminal()
    }
}

/// Input delivered to the active handler, either from its own asynchronous
/// work or from the host application.
#[derive(Debug, Clone, PartialEq)]
pub enum FlowEvent {
    PaymentMethodsLoaded(Result<Vec<PaymentMethodConfiguration>>),
    PaymentMethodSelected(u64),
    PaymentFormSubmitted,
    ChangePaymentMethod,
    TransactionLoaded(Result<TransactionSummary>),
    /// The host dismissed the flow.
    Cancel,
    /// Background work started by the handler of `state` died without reporting back.
    WorkFailed {
        state: FlowStateKind,
        error: FlowError,
    },
}

/// How the flow proceeds after a handler processed an event.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    Advance(FlowState),
    Stay,
    Fail(FlowError),
    Complete,
}

impl Transition {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Transition::Fail(_) | Transition::Complete)
    }
}

/// Final result of a driven flow.
#[derive(Debug, Clone, PartialEq)]
pub enum FlowOutcome {
    Completed,
    Failed(FlowError),
    Cancelled,
}

pub type EventSender = UnboundedSender<FlowEvent>;
pub type EventReceiver = UnboundedReceiver<FlowEvent>;

use super::payment_method::PaymentMethodConfiguration;
use crate::error::FlowError;

/// A presentable unit produced by a [`ViewFactory`](super::ports::ViewFactory).
///
/// Views only describe what should be shown; rendering them is up to the
/// container the host application plugs in.
#[derive(Debug, Clone, PartialEq)]
pub enum PaymentView {
    Loading { message: String },
    PaymentMethodList { methods: Vec<PaymentMethodConfiguration> },
    PaymentForm { method: PaymentMethodConfiguration },
    Confirmation { method: PaymentMethodConfiguration },
    Success,
    Failure { error: FlowError },
}

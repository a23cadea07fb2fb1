//! Domain types of the payment flow and the ports through which the flow
//! reaches its external collaborators.

pub mod credentials;
pub mod payment_method;
pub mod ports;
pub mod transaction;
pub mod view;

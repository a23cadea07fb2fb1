//! Flow configuration and the state machine that drives one payment.

pub mod configuration;
pub mod handler;
pub mod handlers;
pub mod state;

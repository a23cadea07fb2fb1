//! Application layer driving payment flows.
//!
//! This module defines the `FlowCoordinator` which owns the active state
//! handler of a flow and feeds it the events delivered through a `tokio`
//! channel, one at a time.

pub mod coordinator;

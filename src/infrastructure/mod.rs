//! Adapters implementing the domain ports.

pub mod defaults;
pub mod in_memory;
pub mod web_service;

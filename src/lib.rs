pub mod application;
pub mod domain;
pub mod error;
pub mod flow;
pub mod infrastructure;
pub mod interfaces;

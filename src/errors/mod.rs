//! Error types for network loading and execution.

mod net_error;

pub use net_error::NetError;

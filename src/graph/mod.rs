//! Graph construction and execution.
//!
//! The builder turns the ordered layer list into stages bound to concrete
//! tensor handles; all name resolution happens here, once, so the execution
//! path never touches a string.

mod builder;
mod registry;

pub use builder::{Graph, Stage};
pub use registry::{TensorId, TensorRegistry};

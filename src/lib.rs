//! # forwardnet
//!
//! A forward-only neural network inference engine.
//!
//! A network is described as an ordered list of layer records (JSON) plus a
//! flat binary weight blob. Loading resolves every layer's named inputs and
//! outputs into an ordered sequence of executable stages over shared tensor
//! storage, propagates shapes, and streams weights into the layers that own
//! them. After that, inference is just filling the input tensors and calling
//! `forward()`.
//!
//! ## Features
//!
//! - **Declarative graphs**: declaration order is execution order; the
//!   builder detects graph inputs and outputs from the wiring itself.
//! - **In-place operators**: an output that names its same-position input
//!   reuses that input's storage instead of allocating.
//! - **Variable-size inference**: resize an input tensor, call `reshape()`,
//!   and the new shape propagates through every downstream stage.
//!
//! ## Example
//!
//! ```
//! use std::io::Cursor;
//! use forwardnet::Network;
//!
//! let description = r#"{
//!     "name": "ratio",
//!     "layers": [
//!         {"type": "Input", "name": "in", "dst": ["a", "b"],
//!          "input": {"shape": [{"dim": [3]}, {"dim": [3]}]}},
//!         {"type": "BinaryOperation", "name": "div",
//!          "src": ["a", "b"], "dst": ["quotient"]}
//!     ]
//! }"#;
//!
//! // No layer owns weights here, so the weight stream is empty.
//! let mut network = Network::load(description, Cursor::new(Vec::new())).unwrap();
//!
//! network.src()[0].borrow_mut().fill_from(&[6.0, 10.0, 9.0]);
//! network.src()[1].borrow_mut().fill_from(&[3.0, 5.0, 3.0]);
//! network.forward();
//!
//! assert_eq!(network.dst()[0].borrow().data(), &[2.0, 2.0, 3.0]);
//! ```

pub mod errors;
pub mod graph;
pub mod layers;
pub mod network;
pub mod params;
pub mod tensor;

// Re-exports for convenience
pub use errors::NetError;
pub use network::Network;
pub use params::{LayerKind, LayerParam, NetworkParam};
pub use tensor::{SharedTensor, Tensor};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::errors::NetError;
    pub use crate::layers::Layer;
    pub use crate::network::Network;
    pub use crate::params::{LayerKind, LayerParam, NetworkParam};
    pub use crate::tensor::{SharedTensor, Tensor};
}

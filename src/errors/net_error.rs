//! Network-related error types.

use thiserror::Error;

/// Errors that can occur while loading or running a network.
///
/// Every load-time failure is fatal to the load call: the caller gets this
/// error and no partially-built network. `Configuration` and `ShapeMismatch`
/// indicate an invalid model description rather than a transient condition;
/// retrying without changing the input has no value.
#[derive(Debug, Error)]
pub enum NetError {
    #[error("Network has no layers defined")]
    NoLayers,

    #[error("Layer `{layer}` reads tensor `{tensor}` that no earlier layer produced")]
    UnresolvedInput { layer: String, tensor: String },

    #[error("Layer `{layer}` writes tensor `{tensor}` that is already produced by an earlier layer")]
    DuplicateOutput { layer: String, tensor: String },

    #[error("Invalid configuration for layer `{layer}`: {message}")]
    Configuration { layer: String, message: String },

    #[error("Shape mismatch in layer `{layer}`: {message}")]
    ShapeMismatch { layer: String, message: String },

    #[error("Weight stream ended while loading layer `{layer}`")]
    TruncatedWeights { layer: String },

    #[error("Malformed network description: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl NetError {
    /// Shorthand for a `Configuration` error.
    pub(crate) fn config(layer: &str, message: impl Into<String>) -> Self {
        Self::Configuration {
            layer: layer.to_string(),
            message: message.into(),
        }
    }

    /// Shorthand for a `ShapeMismatch` error.
    pub(crate) fn shape(layer: &str, message: impl Into<String>) -> Self {
        Self::ShapeMismatch {
            layer: layer.to_string(),
            message: message.into(),
        }
    }
}

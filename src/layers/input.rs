//! Input layer - introduces graph-input tensors.

use crate::errors::NetError;
use crate::layers::Layer;
use crate::params::LayerParam;
use crate::tensor::SharedTensor;

/// Declares one or more graph-input tensors.
///
/// The layer consumes nothing and computes nothing; its outputs are the
/// tensors the caller fills before each forward pass. Declared shapes from
/// the description are applied once at setup; after that the shapes belong
/// to the caller, so a resized input survives every later reshape pass.
pub struct InputLayer {
    param: LayerParam,
}

impl InputLayer {
    pub fn new(param: LayerParam) -> Self {
        Self { param }
    }
}

impl Layer for InputLayer {
    fn param(&self) -> &LayerParam {
        &self.param
    }

    fn setup(
        &mut self,
        src: &[SharedTensor],
        _buf: &[SharedTensor],
        dst: &[SharedTensor],
    ) -> Result<(), NetError> {
        let name = &self.param.name;
        if !src.is_empty() {
            return Err(NetError::config(name, "input layers take no inputs"));
        }
        if dst.is_empty() {
            return Err(NetError::config(name, "input layers need at least one output"));
        }

        let shapes = &self.param.input.shape;
        if !shapes.is_empty() {
            if shapes.len() != dst.len() {
                return Err(NetError::config(
                    name,
                    format!(
                        "{} declared shape(s) for {} output(s)",
                        shapes.len(),
                        dst.len()
                    ),
                ));
            }
            for (tensor, shape) in dst.iter().zip(shapes) {
                tensor.borrow_mut().reshape(&shape.dim);
            }
        }
        Ok(())
    }

    fn reshape(
        &mut self,
        _src: &[SharedTensor],
        _buf: &[SharedTensor],
        _dst: &[SharedTensor],
    ) -> Result<(), NetError> {
        Ok(())
    }

    fn forward(&self, _src: &[SharedTensor], _buf: &[SharedTensor], _dst: &[SharedTensor]) {}
}

//! Stub layer - identity pass-through.

use crate::errors::NetError;
use crate::layers::{check_io, copy_to, reshape_like, Layer};
use crate::params::LayerParam;
use crate::tensor::SharedTensor;

/// Forwards its input unchanged. Also serves `Dropout`, which is the identity
/// at inference time. When the output aliases the input the forward pass does
/// nothing at all.
pub struct StubLayer {
    param: LayerParam,
}

impl StubLayer {
    pub fn new(param: LayerParam) -> Self {
        Self { param }
    }
}

impl Layer for StubLayer {
    fn param(&self) -> &LayerParam {
        &self.param
    }

    fn setup(
        &mut self,
        src: &[SharedTensor],
        _buf: &[SharedTensor],
        dst: &[SharedTensor],
    ) -> Result<(), NetError> {
        check_io(&self.param.name, src, dst, 1, 1)
    }

    fn reshape(
        &mut self,
        src: &[SharedTensor],
        _buf: &[SharedTensor],
        dst: &[SharedTensor],
    ) -> Result<(), NetError> {
        reshape_like(&dst[0], &src[0]);
        Ok(())
    }

    fn forward(&self, src: &[SharedTensor], _buf: &[SharedTensor], dst: &[SharedTensor]) {
        copy_to(&dst[0], &src[0]);
    }
}

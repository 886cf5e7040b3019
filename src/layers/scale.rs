//! Per-channel scale layer.

use std::io::Read;

use crate::errors::NetError;
use crate::layers::{check_io, copy_to, read_weight, reshape_like, Layer};
use crate::params::LayerParam;
use crate::tensor::{SharedTensor, Tensor};

/// Multiplies every element by its channel's coefficient, optionally adding a
/// per-channel bias. The channel axis is configurable; shapes pass through
/// unchanged, so in-place execution is supported.
pub struct ScaleLayer {
    param: LayerParam,
    scale: Tensor,
    bias: Option<Tensor>,
}

impl ScaleLayer {
    pub fn new(param: LayerParam) -> Self {
        Self {
            param,
            scale: Tensor::new(),
            bias: None,
        }
    }
}

impl Layer for ScaleLayer {
    fn param(&self) -> &LayerParam {
        &self.param
    }

    fn setup(
        &mut self,
        src: &[SharedTensor],
        _buf: &[SharedTensor],
        dst: &[SharedTensor],
    ) -> Result<(), NetError> {
        check_io(&self.param.name, src, dst, 1, 1)?;
        let name = &self.param.name;
        let config = &self.param.scale;

        let expected = 1 + usize::from(config.bias_term);
        if self.param.weight.len() != expected {
            return Err(NetError::config(
                name,
                format!(
                    "expected {} weight descriptor(s), got {}",
                    expected,
                    self.param.weight.len()
                ),
            ));
        }

        let scale_dim = &self.param.weight[0].dim;
        if scale_dim.len() != 1 || scale_dim[0] == 0 {
            return Err(NetError::config(
                name,
                format!("scale shape {:?} is not a non-empty vector", scale_dim),
            ));
        }
        self.scale = Tensor::with_shape(scale_dim);

        if config.bias_term {
            let bias_dim = &self.param.weight[1].dim;
            if bias_dim != scale_dim {
                return Err(NetError::config(
                    name,
                    format!("bias shape {:?} does not match scale {:?}", bias_dim, scale_dim),
                ));
            }
            self.bias = Some(Tensor::with_shape(bias_dim));
        }
        Ok(())
    }

    fn reshape(
        &mut self,
        src: &[SharedTensor],
        _buf: &[SharedTensor],
        dst: &[SharedTensor],
    ) -> Result<(), NetError> {
        let channels = src[0].borrow().dim(self.param.scale.axis);
        if channels != self.scale.size() {
            return Err(NetError::shape(
                &self.param.name,
                format!(
                    "{} channel(s) on axis {} against {} coefficient(s)",
                    channels,
                    self.param.scale.axis,
                    self.scale.size()
                ),
            ));
        }
        reshape_like(&dst[0], &src[0]);
        Ok(())
    }

    fn load_weights(&mut self, stream: &mut dyn Read) -> Result<(), NetError> {
        let name = self.param.name.clone();
        self.scale = read_weight(stream, &name, &self.param.weight[0].dim)?;
        if self.bias.is_some() {
            self.bias = Some(read_weight(stream, &name, &self.param.weight[1].dim)?);
        }
        Ok(())
    }

    fn forward(&self, src: &[SharedTensor], _buf: &[SharedTensor], dst: &[SharedTensor]) {
        copy_to(&dst[0], &src[0]);

        let mut d = dst[0].borrow_mut();
        if d.size() == 0 {
            return;
        }
        let axis = self.param.scale.axis;
        let shape = d.shape().to_vec();
        let channels = self.scale.size();
        let inner: usize = shape.get(axis + 1..).map_or(1, |tail| tail.iter().product());
        let outer = d.size() / (channels * inner);

        let scale = self.scale.data();
        let bias = self.bias.as_ref().map(Tensor::data);
        let out = d.data_mut();
        for o in 0..outer {
            for c in 0..channels {
                let offset = (o * channels + c) * inner;
                let b = bias.map_or(0.0, |b| b[c]);
                for v in &mut out[offset..offset + inner] {
                    *v = *v * scale[c] + b;
                }
            }
        }
    }
}

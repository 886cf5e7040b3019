//! Fully connected (inner product) layer.

use std::io::Read;
use std::rc::Rc;

use crate::errors::NetError;
use crate::layers::{check_io, read_weight, Layer};
use crate::params::LayerParam;
use crate::tensor::{SharedTensor, Tensor};

/// Dense matrix product: `dst = src * weight^T + bias`.
///
/// Input dimensions from `axis` onward are flattened into the feature axis;
/// leading dimensions are carried through, so a batched input stays batched.
/// The weight tensor is `[outputs, inputs]`, the optional bias `[outputs]`.
pub struct InnerProductLayer {
    param: LayerParam,
    weights: Tensor,
    bias: Option<Tensor>,
}

impl InnerProductLayer {
    pub fn new(param: LayerParam) -> Self {
        Self {
            param,
            weights: Tensor::new(),
            bias: None,
        }
    }
}

impl Layer for InnerProductLayer {
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
        let config = &self.param.inner_product;

        if Rc::ptr_eq(&src[0], &dst[0]) {
            return Err(NetError::config(name, "inner product cannot run in place"));
        }
        if config.outputs == 0 {
            return Err(NetError::config(name, "outputs must be positive"));
        }

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

        let weight_dim = &self.param.weight[0].dim;
        if weight_dim.len() != 2 || weight_dim[0] != config.outputs || weight_dim[1] == 0 {
            return Err(NetError::config(
                name,
                format!(
                    "weight shape {:?} does not match [{}, inputs]",
                    weight_dim, config.outputs
                ),
            ));
        }
        self.weights = Tensor::with_shape(weight_dim);

        if config.bias_term {
            let bias_dim = &self.param.weight[1].dim;
            if bias_dim.as_slice() != [config.outputs] {
                return Err(NetError::config(
                    name,
                    format!("bias shape {:?} does not match [{}]", bias_dim, config.outputs),
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
        let config = &self.param.inner_product;
        let input_shape = src[0].borrow().shape().to_vec();
        if input_shape.len() < config.axis {
            return Err(NetError::shape(
                &self.param.name,
                format!("input rank {} below axis {}", input_shape.len(), config.axis),
            ));
        }

        let features: usize = input_shape[config.axis..].iter().product();
        let expected = self.weights.dim(1);
        if features != expected {
            return Err(NetError::shape(
                &self.param.name,
                format!("input features {} do not match weight inputs {}", features, expected),
            ));
        }

        let mut output_shape = input_shape[..config.axis].to_vec();
        output_shape.push(config.outputs);
        dst[0].borrow_mut().reshape(&output_shape);
        Ok(())
    }

    fn load_weights(&mut self, stream: &mut dyn Read) -> Result<(), NetError> {
        let name = self.param.name.clone();
        self.weights = read_weight(stream, &name, &self.param.weight[0].dim)?;
        if self.bias.is_some() {
            self.bias = Some(read_weight(stream, &name, &self.param.weight[1].dim)?);
        }
        Ok(())
    }

    fn forward(&self, src: &[SharedTensor], _buf: &[SharedTensor], dst: &[SharedTensor]) {
        let s = src[0].borrow();
        let mut d = dst[0].borrow_mut();

        let inputs = self.weights.dim(1);
        let outputs = self.weights.dim(0);
        let outer = s.size() / inputs;
        let weights = self.weights.data();
        let bias = self.bias.as_ref().map(Tensor::data);

        let out = d.data_mut();
        for o in 0..outer {
            let row = &s.data()[o * inputs..(o + 1) * inputs];
            for j in 0..outputs {
                let w = &weights[j * inputs..(j + 1) * inputs];
                let mut acc = bias.map_or(0.0, |b| b[j]);
                for (x, wx) in row.iter().zip(w) {
                    acc += x * wx;
                }
                out[o * outputs + j] = acc;
            }
        }
    }
}

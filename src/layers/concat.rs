//! Concatenation layer.

use std::rc::Rc;

use crate::errors::NetError;
use crate::layers::Layer;
use crate::params::LayerParam;
use crate::tensor::SharedTensor;

/// Joins inputs along the configured axis. All other dimensions must match.
pub struct ConcatLayer {
    param: LayerParam,
}

impl ConcatLayer {
    pub fn new(param: LayerParam) -> Self {
        Self { param }
    }
}

impl Layer for ConcatLayer {
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
        if src.is_empty() || dst.len() != 1 {
            return Err(NetError::config(
                name,
                format!(
                    "expected at least 1 input and exactly 1 output, got {} and {}",
                    src.len(),
                    dst.len()
                ),
            ));
        }
        if src.iter().any(|s| Rc::ptr_eq(s, &dst[0])) {
            return Err(NetError::config(name, "concat cannot run in place"));
        }
        Ok(())
    }

    fn reshape(
        &mut self,
        src: &[SharedTensor],
        _buf: &[SharedTensor],
        dst: &[SharedTensor],
    ) -> Result<(), NetError> {
        let name = &self.param.name;
        let axis = self.param.concat.axis;
        let first = src[0].borrow().shape().to_vec();
        if axis >= first.len() {
            return Err(NetError::shape(
                name,
                format!("axis {} out of range for rank {}", axis, first.len()),
            ));
        }

        let mut joined = first[axis];
        for other in &src[1..] {
            let shape = other.borrow().shape().to_vec();
            let compatible = shape.len() == first.len()
                && shape
                    .iter()
                    .zip(&first)
                    .enumerate()
                    .all(|(i, (a, b))| i == axis || a == b);
            if !compatible {
                return Err(NetError::shape(
                    name,
                    format!("cannot join {:?} with {:?} on axis {}", first, shape, axis),
                ));
            }
            joined += shape[axis];
        }

        let mut output_shape = first;
        output_shape[axis] = joined;
        dst[0].borrow_mut().reshape(&output_shape);
        Ok(())
    }

    fn forward(&self, src: &[SharedTensor], _buf: &[SharedTensor], dst: &[SharedTensor]) {
        let axis = self.param.concat.axis;
        let mut d = dst[0].borrow_mut();
        let outer: usize = d.shape()[..axis].iter().product();
        let stride = if outer == 0 { 0 } else { d.size() / outer };

        let mut offset = 0;
        for s in src {
            let s = s.borrow();
            let block = if outer == 0 { 0 } else { s.size() / outer };
            for o in 0..outer {
                let from = &s.data()[o * block..(o + 1) * block];
                d.data_mut()[o * stride + offset..o * stride + offset + block]
                    .copy_from_slice(from);
            }
            offset += block;
        }
    }
}

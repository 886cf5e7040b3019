//! N-ary elementwise reduction layer.

use crate::errors::NetError;
use crate::layers::{copy_to, reshape_like, zip_combine, Layer};
use crate::params::{EltwiseOperation, LayerParam};
use crate::tensor::SharedTensor;

/// Folds two or more equally-shaped inputs into one output with a product,
/// sum, or max. For `Sum`, optional per-input coefficients scale each operand.
pub struct EltwiseLayer {
    param: LayerParam,
    operation: EltwiseOperation,
    coefficients: Vec<f32>,
}

impl EltwiseLayer {
    pub fn new(param: LayerParam) -> Self {
        Self {
            param,
            operation: EltwiseOperation::Sum,
            coefficients: Vec::new(),
        }
    }

    fn coefficient(&self, index: usize) -> f32 {
        self.coefficients.get(index).copied().unwrap_or(1.0)
    }
}

impl Layer for EltwiseLayer {
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
        if src.len() < 2 || dst.len() != 1 {
            return Err(NetError::config(
                name,
                format!(
                    "expected at least 2 inputs and exactly 1 output, got {} and {}",
                    src.len(),
                    dst.len()
                ),
            ));
        }

        let eltwise = &self.param.eltwise;
        if !eltwise.coefficients.is_empty() {
            if eltwise.operation != EltwiseOperation::Sum {
                return Err(NetError::config(name, "coefficients require the Sum operation"));
            }
            if eltwise.coefficients.len() != src.len() {
                return Err(NetError::config(
                    name,
                    format!(
                        "{} coefficient(s) for {} input(s)",
                        eltwise.coefficients.len(),
                        src.len()
                    ),
                ));
            }
        }

        self.operation = eltwise.operation;
        self.coefficients = eltwise.coefficients.clone();
        Ok(())
    }

    fn reshape(
        &mut self,
        src: &[SharedTensor],
        _buf: &[SharedTensor],
        dst: &[SharedTensor],
    ) -> Result<(), NetError> {
        let first = src[0].borrow().shape().to_vec();
        for other in &src[1..] {
            let shape = other.borrow().shape().to_vec();
            if shape != first {
                return Err(NetError::shape(
                    &self.param.name,
                    format!("operands have shapes {:?} and {:?}", first, shape),
                ));
            }
        }
        reshape_like(&dst[0], &src[0]);
        Ok(())
    }

    fn forward(&self, src: &[SharedTensor], _buf: &[SharedTensor], dst: &[SharedTensor]) {
        let out = &dst[0];
        copy_to(out, &src[0]);

        match self.operation {
            EltwiseOperation::Sum => {
                let c0 = self.coefficient(0);
                if c0 != 1.0 {
                    let mut d = out.borrow_mut();
                    for v in d.data_mut() {
                        *v *= c0;
                    }
                }
                for (index, operand) in src.iter().enumerate().skip(1) {
                    let c = self.coefficient(index);
                    zip_combine(out, operand, move |acc, x| acc + c * x);
                }
            }
            EltwiseOperation::Product => {
                for operand in &src[1..] {
                    zip_combine(out, operand, |acc, x| acc * x);
                }
            }
            EltwiseOperation::Max => {
                for operand in &src[1..] {
                    zip_combine(out, operand, f32::max);
                }
            }
        }
    }
}

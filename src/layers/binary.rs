//! Binary elementwise operation layer.

use crate::errors::NetError;
use crate::layers::{check_io, copy_to, reshape_like, zip_combine, Layer};
use crate::params::{BinaryOperation, LayerParam};
use crate::tensor::SharedTensor;

/// Two-operand elementwise operation over equally-shaped inputs.
///
/// The operation variant is fixed at setup time; `forward` dispatches on the
/// cached variant rather than re-reading the parameter record.
pub struct BinaryOperationLayer {
    param: LayerParam,
    operation: BinaryOperation,
}

impl BinaryOperationLayer {
    pub fn new(param: LayerParam) -> Self {
        Self {
            param,
            operation: BinaryOperation::Div,
        }
    }
}

fn kernel(operation: BinaryOperation) -> fn(f32, f32) -> f32 {
    match operation {
        BinaryOperation::Div => |a, b| a / b,
        BinaryOperation::Sub => |a, b| a - b,
        BinaryOperation::Mul => |a, b| a * b,
        BinaryOperation::Max => f32::max,
    }
}

impl Layer for BinaryOperationLayer {
    fn param(&self) -> &LayerParam {
        &self.param
    }

    fn setup(
        &mut self,
        src: &[SharedTensor],
        _buf: &[SharedTensor],
        dst: &[SharedTensor],
    ) -> Result<(), NetError> {
        check_io(&self.param.name, src, dst, 2, 1)?;
        self.operation = self.param.binary_operation.operation;
        Ok(())
    }

    fn reshape(
        &mut self,
        src: &[SharedTensor],
        _buf: &[SharedTensor],
        dst: &[SharedTensor],
    ) -> Result<(), NetError> {
        let a = src[0].borrow().shape().to_vec();
        let b = src[1].borrow().shape().to_vec();
        if a != b {
            return Err(NetError::shape(
                &self.param.name,
                format!("operands have shapes {:?} and {:?}", a, b),
            ));
        }
        reshape_like(&dst[0], &src[0]);
        Ok(())
    }

    fn forward(&self, src: &[SharedTensor], _buf: &[SharedTensor], dst: &[SharedTensor]) {
        copy_to(&dst[0], &src[0]);
        zip_combine(&dst[0], &src[1], kernel(self.operation));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::LayerKind;
    use crate::tensor::{shared, Tensor};

    fn binary_param(operation: BinaryOperation) -> LayerParam {
        let mut param = LayerParam::new(LayerKind::BinaryOperation, "bin");
        param.src = vec!["a".to_string(), "b".to_string()];
        param.dst = vec!["c".to_string()];
        param.binary_operation.operation = operation;
        param
    }

    #[test]
    fn test_div_forward() {
        let mut layer = BinaryOperationLayer::new(binary_param(BinaryOperation::Div));
        let src = vec![
            shared(Tensor::from_data(&[3], vec![6.0, 10.0, 9.0])),
            shared(Tensor::from_data(&[3], vec![3.0, 5.0, 3.0])),
        ];
        let dst = vec![shared(Tensor::new())];

        layer.setup(&src, &[], &dst).expect("setup should succeed");
        layer.reshape(&src, &[], &dst).expect("reshape should succeed");
        layer.forward(&src, &[], &dst);

        assert_eq!(dst[0].borrow().data(), &[2.0, 2.0, 3.0]);
    }

    #[test]
    fn test_sub_forward_in_place() {
        let mut layer = BinaryOperationLayer::new(binary_param(BinaryOperation::Sub));
        let a = shared(Tensor::from_data(&[2], vec![5.0, 1.0]));
        let b = shared(Tensor::from_data(&[2], vec![2.0, 4.0]));
        let src = vec![a.clone(), b];
        let dst = vec![a.clone()];

        layer.setup(&src, &[], &dst).expect("setup should succeed");
        layer.reshape(&src, &[], &dst).expect("reshape should succeed");
        layer.forward(&src, &[], &dst);

        assert_eq!(a.borrow().data(), &[3.0, -3.0]);
    }

    #[test]
    fn test_max_forward() {
        let mut layer = BinaryOperationLayer::new(binary_param(BinaryOperation::Max));
        let src = vec![
            shared(Tensor::from_data(&[2], vec![1.0, 7.0])),
            shared(Tensor::from_data(&[2], vec![4.0, 2.0])),
        ];
        let dst = vec![shared(Tensor::new())];

        layer.setup(&src, &[], &dst).expect("setup should succeed");
        layer.reshape(&src, &[], &dst).expect("reshape should succeed");
        layer.forward(&src, &[], &dst);

        assert_eq!(dst[0].borrow().data(), &[4.0, 7.0]);
    }

    #[test]
    fn test_same_operand_twice_in_place() {
        let mut param = binary_param(BinaryOperation::Div);
        param.src = vec!["x".to_string(), "x".to_string()];
        param.dst = vec!["x".to_string()];
        let mut layer = BinaryOperationLayer::new(param);
        let x = shared(Tensor::from_data(&[2], vec![8.0, 0.5]));
        let src = vec![x.clone(), x.clone()];
        let dst = vec![x.clone()];

        layer.setup(&src, &[], &dst).expect("setup should succeed");
        layer.reshape(&src, &[], &dst).expect("reshape should succeed");
        layer.forward(&src, &[], &dst);

        assert_eq!(x.borrow().data(), &[1.0, 1.0]);
    }

    #[test]
    fn test_reshape_rejects_mismatched_operands() {
        let mut layer = BinaryOperationLayer::new(binary_param(BinaryOperation::Div));
        let src = vec![
            shared(Tensor::with_shape(&[2, 3])),
            shared(Tensor::with_shape(&[3, 2])),
        ];
        let dst = vec![shared(Tensor::new())];

        layer.setup(&src, &[], &dst).expect("setup should succeed");
        let result = layer.reshape(&src, &[], &dst);
        assert!(matches!(result, Err(NetError::ShapeMismatch { .. })));
    }

    #[test]
    fn test_setup_rejects_wrong_arity() {
        let mut layer = BinaryOperationLayer::new(binary_param(BinaryOperation::Div));
        let src = vec![shared(Tensor::new())];
        let dst = vec![shared(Tensor::new())];
        let result = layer.setup(&src, &[], &dst);
        assert!(matches!(result, Err(NetError::Configuration { .. })));
    }
}

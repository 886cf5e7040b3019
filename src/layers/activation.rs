//! Unary activation layers: sigmoid, relu, tanh.
//!
//! All three share the same shape behavior (output mirrors input) and all
//! support in-place execution when the builder aliased their output onto
//! their input.

use crate::errors::NetError;
use crate::layers::{check_io, map_unary, reshape_like, Layer};
use crate::params::LayerParam;
use crate::tensor::SharedTensor;

/// Sigmoid activation: `f(x) = 1 / (1 + exp(-slope * x))`.
pub struct SigmoidLayer {
    param: LayerParam,
    slope: f32,
}

impl SigmoidLayer {
    pub fn new(param: LayerParam) -> Self {
        Self { param, slope: 1.0 }
    }
}

impl Layer for SigmoidLayer {
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
        self.slope = self.param.sigmoid.slope;
        Ok(())
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
        let slope = self.slope;
        map_unary(&dst[0], &src[0], |x| 1.0 / (1.0 + (-slope * x).exp()));
    }
}

/// Rectifier activation with a configurable slope for negative inputs.
pub struct ReluLayer {
    param: LayerParam,
    negative_slope: f32,
}

impl ReluLayer {
    pub fn new(param: LayerParam) -> Self {
        Self {
            param,
            negative_slope: 0.0,
        }
    }
}

impl Layer for ReluLayer {
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
        let slope = self.param.relu.negative_slope;
        if slope < 0.0 {
            return Err(NetError::config(
                &self.param.name,
                "negative_slope must be non-negative",
            ));
        }
        self.negative_slope = slope;
        Ok(())
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
        let slope = self.negative_slope;
        map_unary(&dst[0], &src[0], |x| if x > 0.0 { x } else { slope * x });
    }
}

/// Hyperbolic tangent activation.
pub struct TanhLayer {
    param: LayerParam,
}

impl TanhLayer {
    pub fn new(param: LayerParam) -> Self {
        Self { param }
    }
}

impl Layer for TanhLayer {
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
        map_unary(&dst[0], &src[0], f32::tanh);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::LayerKind;
    use crate::tensor::{shared, Tensor};

    fn unary_param(kind: LayerKind) -> LayerParam {
        let mut param = LayerParam::new(kind, "act");
        param.src = vec!["x".to_string()];
        param.dst = vec!["y".to_string()];
        param
    }

    #[test]
    fn test_sigmoid_forward() {
        let mut layer = SigmoidLayer::new(unary_param(LayerKind::Sigmoid));
        let src = vec![shared(Tensor::from_data(&[3], vec![0.0, 10.0, -10.0]))];
        let dst = vec![shared(Tensor::new())];

        layer.setup(&src, &[], &dst).expect("setup should succeed");
        layer.reshape(&src, &[], &dst).expect("reshape should succeed");
        layer.forward(&src, &[], &dst);

        let out = dst[0].borrow();
        assert!((out.data()[0] - 0.5).abs() < 1e-6);
        assert!(out.data()[1] > 0.99);
        assert!(out.data()[2] < 0.01);
    }

    #[test]
    fn test_sigmoid_slope() {
        let mut param = unary_param(LayerKind::Sigmoid);
        param.sigmoid.slope = 2.0;
        let mut layer = SigmoidLayer::new(param);
        let src = vec![shared(Tensor::from_data(&[1], vec![1.0]))];
        let dst = vec![shared(Tensor::new())];

        layer.setup(&src, &[], &dst).expect("setup should succeed");
        layer.reshape(&src, &[], &dst).expect("reshape should succeed");
        layer.forward(&src, &[], &dst);

        let expected = 1.0 / (1.0 + (-2.0f32).exp());
        assert!((dst[0].borrow().data()[0] - expected).abs() < 1e-6);
    }

    #[test]
    fn test_relu_forward_in_place() {
        let mut layer = ReluLayer::new(unary_param(LayerKind::Relu));
        let x = shared(Tensor::from_data(&[4], vec![-1.0, 2.0, -3.0, 4.0]));
        let src = vec![x.clone()];
        let dst = vec![x.clone()];

        layer.setup(&src, &[], &dst).expect("setup should succeed");
        layer.reshape(&src, &[], &dst).expect("reshape should succeed");
        layer.forward(&src, &[], &dst);

        assert_eq!(x.borrow().data(), &[0.0, 2.0, 0.0, 4.0]);
    }

    #[test]
    fn test_relu_negative_slope() {
        let mut param = unary_param(LayerKind::Relu);
        param.relu.negative_slope = 0.1;
        let mut layer = ReluLayer::new(param);
        let src = vec![shared(Tensor::from_data(&[2], vec![-10.0, 10.0]))];
        let dst = vec![shared(Tensor::new())];

        layer.setup(&src, &[], &dst).expect("setup should succeed");
        layer.reshape(&src, &[], &dst).expect("reshape should succeed");
        layer.forward(&src, &[], &dst);

        let out = dst[0].borrow();
        assert!((out.data()[0] + 1.0).abs() < 1e-6);
        assert!((out.data()[1] - 10.0).abs() < 1e-6);
    }

    #[test]
    fn test_relu_rejects_negative_slope_below_zero() {
        let mut param = unary_param(LayerKind::Relu);
        param.relu.negative_slope = -0.5;
        let mut layer = ReluLayer::new(param);
        let src = vec![shared(Tensor::new())];
        let dst = vec![shared(Tensor::new())];
        let result = layer.setup(&src, &[], &dst);
        assert!(matches!(result, Err(NetError::Configuration { .. })));
    }

    #[test]
    fn test_tanh_forward() {
        let mut layer = TanhLayer::new(unary_param(LayerKind::Tanh));
        let src = vec![shared(Tensor::from_data(&[2], vec![0.0, 1.0]))];
        let dst = vec![shared(Tensor::new())];

        layer.setup(&src, &[], &dst).expect("setup should succeed");
        layer.reshape(&src, &[], &dst).expect("reshape should succeed");
        layer.forward(&src, &[], &dst);

        let out = dst[0].borrow();
        assert!((out.data()[0]).abs() < 1e-6);
        assert!((out.data()[1] - 1.0f32.tanh()).abs() < 1e-6);
    }

    #[test]
    fn test_reshape_follows_input() {
        let mut layer = TanhLayer::new(unary_param(LayerKind::Tanh));
        let src = vec![shared(Tensor::with_shape(&[1, 3]))];
        let dst = vec![shared(Tensor::new())];

        layer.setup(&src, &[], &dst).expect("setup should succeed");
        layer.reshape(&src, &[], &dst).expect("reshape should succeed");
        assert_eq!(dst[0].borrow().shape(), &[1, 3]);

        src[0].borrow_mut().reshape(&[4, 3]);
        layer.reshape(&src, &[], &dst).expect("reshape should succeed");
        assert_eq!(dst[0].borrow().shape(), &[4, 3]);
    }
}

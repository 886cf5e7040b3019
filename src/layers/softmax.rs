//! Softmax layer.

use crate::errors::NetError;
use crate::layers::{check_io, copy_to, reshape_like, Layer};
use crate::params::LayerParam;
use crate::tensor::SharedTensor;

/// Normalizes values to a probability distribution along the configured axis.
///
/// Works in place: the input is first copied to the output (a no-op for an
/// aliased pair), then each strided slice along the axis is gathered into the
/// shared scratch tensor, normalized with the usual max-subtraction for
/// stability, and scattered back.
pub struct SoftmaxLayer {
    param: LayerParam,
}

impl SoftmaxLayer {
    pub fn new(param: LayerParam) -> Self {
        Self { param }
    }
}

impl Layer for SoftmaxLayer {
    fn param(&self) -> &LayerParam {
        &self.param
    }

    fn setup(
        &mut self,
        src: &[SharedTensor],
        buf: &[SharedTensor],
        dst: &[SharedTensor],
    ) -> Result<(), NetError> {
        check_io(&self.param.name, src, dst, 1, 1)?;
        if buf.is_empty() {
            return Err(NetError::config(&self.param.name, "softmax needs a scratch tensor"));
        }
        Ok(())
    }

    fn reshape(
        &mut self,
        src: &[SharedTensor],
        buf: &[SharedTensor],
        dst: &[SharedTensor],
    ) -> Result<(), NetError> {
        let axis = self.param.softmax.axis;
        let rank = src[0].borrow().shape().len();
        if axis >= rank {
            return Err(NetError::shape(
                &self.param.name,
                format!("axis {} out of range for rank {}", axis, rank),
            ));
        }
        reshape_like(&dst[0], &src[0]);

        let channels = src[0].borrow().dim(axis);
        buf[0].borrow_mut().extend(channels);
        Ok(())
    }

    fn forward(&self, src: &[SharedTensor], buf: &[SharedTensor], dst: &[SharedTensor]) {
        copy_to(&dst[0], &src[0]);

        let mut d = dst[0].borrow_mut();
        let axis = self.param.softmax.axis;
        let shape = d.shape().to_vec();
        let channels = shape[axis];
        let inner: usize = shape[axis + 1..].iter().product();
        let outer: usize = shape[..axis].iter().product();
        if channels == 0 || inner == 0 {
            return;
        }

        let mut scratch = buf[0].borrow_mut();
        scratch.extend(channels);
        let strip = &mut scratch.data_mut()[..channels];
        let data = d.data_mut();

        for o in 0..outer {
            for i in 0..inner {
                let base = o * channels * inner + i;
                for c in 0..channels {
                    strip[c] = data[base + c * inner];
                }

                let mut max = strip[0];
                for &v in strip.iter() {
                    max = max.max(v);
                }
                let mut sum = 0.0;
                for v in strip.iter_mut() {
                    *v = (*v - max).exp();
                    sum += *v;
                }
                for (c, v) in strip.iter().enumerate() {
                    data[base + c * inner] = v / sum;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::LayerKind;
    use crate::tensor::{shared, Tensor};

    fn softmax_param(axis: usize) -> LayerParam {
        let mut param = LayerParam::new(LayerKind::Softmax, "prob");
        param.src = vec!["x".to_string()];
        param.dst = vec!["y".to_string()];
        param.softmax.axis = axis;
        param
    }

    #[test]
    fn test_rows_sum_to_one() {
        let mut layer = SoftmaxLayer::new(softmax_param(1));
        let src = vec![shared(Tensor::from_data(
            &[2, 3],
            vec![1.0, 2.0, 3.0, -1.0, 0.0, 1.0],
        ))];
        let buf = vec![shared(Tensor::new())];
        let dst = vec![shared(Tensor::new())];

        layer.setup(&src, &buf, &dst).expect("setup should succeed");
        layer.reshape(&src, &buf, &dst).expect("reshape should succeed");
        layer.forward(&src, &buf, &dst);

        let out = dst[0].borrow();
        for row in out.data().chunks(3) {
            let sum: f32 = row.iter().sum();
            assert!((sum - 1.0).abs() < 1e-5);
            assert!(row.windows(2).all(|w| w[0] < w[1]));
        }
    }

    #[test]
    fn test_uniform_input() {
        let mut layer = SoftmaxLayer::new(softmax_param(1));
        let src = vec![shared(Tensor::from_data(&[1, 4], vec![7.0; 4]))];
        let buf = vec![shared(Tensor::new())];
        let dst = vec![shared(Tensor::new())];

        layer.setup(&src, &buf, &dst).expect("setup should succeed");
        layer.reshape(&src, &buf, &dst).expect("reshape should succeed");
        layer.forward(&src, &buf, &dst);

        for &v in dst[0].borrow().data() {
            assert!((v - 0.25).abs() < 1e-6);
        }
    }

    #[test]
    fn test_inner_axis() {
        let mut layer = SoftmaxLayer::new(softmax_param(0));
        let src = vec![shared(Tensor::from_data(&[2, 2], vec![0.0, 5.0, 0.0, 5.0]))];
        let buf = vec![shared(Tensor::new())];
        let dst = vec![shared(Tensor::new())];

        layer.setup(&src, &buf, &dst).expect("setup should succeed");
        layer.reshape(&src, &buf, &dst).expect("reshape should succeed");
        layer.forward(&src, &buf, &dst);

        let out = dst[0].borrow();
        // columns are uniform, so each normalizes to a half
        for &v in out.data() {
            assert!((v - 0.5).abs() < 1e-6);
        }
    }

    #[test]
    fn test_reshape_rejects_axis_out_of_range() {
        let mut layer = SoftmaxLayer::new(softmax_param(2));
        let src = vec![shared(Tensor::with_shape(&[2, 3]))];
        let buf = vec![shared(Tensor::new())];
        let dst = vec![shared(Tensor::new())];

        layer.setup(&src, &buf, &dst).expect("setup should succeed");
        let result = layer.reshape(&src, &buf, &dst);
        assert!(matches!(result, Err(NetError::ShapeMismatch { .. })));
    }
}

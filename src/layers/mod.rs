//! Operator implementations and the layer contract they share.
//!
//! Every operator kind implements [`Layer`]: one-time `setup`, idempotent
//! `reshape` shape propagation, optional `load_weights` from the shared
//! sequential stream, and the `forward` computation itself. The graph builder
//! owns all tensor storage; layers only work through the `SharedTensor`
//! handles bound into their stage.

use std::io::{self, Read};
use std::rc::Rc;

use byteorder::{LittleEndian, ReadBytesExt};

use crate::errors::NetError;
use crate::params::{LayerKind, LayerParam};
use crate::tensor::{SharedTensor, Tensor};

mod activation;
mod binary;
mod concat;
mod eltwise;
mod inner_product;
mod input;
mod scale;
mod softmax;
mod stub;

pub use activation::{ReluLayer, SigmoidLayer, TanhLayer};
pub use binary::BinaryOperationLayer;
pub use concat::ConcatLayer;
pub use eltwise::EltwiseLayer;
pub use inner_product::InnerProductLayer;
pub use input::InputLayer;
pub use scale::ScaleLayer;
pub use softmax::SoftmaxLayer;
pub use stub::StubLayer;

/// The contract every operator kind implements.
///
/// Lifecycle per stage: `setup` once at build, `reshape` at build and again
/// whenever a graph input changes shape, `load_weights` once during load in
/// stage order, `forward` once per inference call.
pub trait Layer {
    /// The resolved parameter record this layer was created from.
    fn param(&self) -> &LayerParam;

    /// One-time initialization: validates the configuration and operand
    /// arity, caches whatever `forward` needs. Invalid configuration is a
    /// fatal load error.
    fn setup(
        &mut self,
        src: &[SharedTensor],
        buf: &[SharedTensor],
        dst: &[SharedTensor],
    ) -> Result<(), NetError>;

    /// Propagates input shapes to output shapes. Must be idempotent and
    /// callable repeatedly with different input shapes; mutates only shape
    /// metadata, never data.
    fn reshape(
        &mut self,
        src: &[SharedTensor],
        buf: &[SharedTensor],
        dst: &[SharedTensor],
    ) -> Result<(), NetError>;

    /// Consumes exactly this layer's byte range from the shared weight
    /// stream. Stateless layers keep the default no-op.
    fn load_weights(&mut self, stream: &mut dyn Read) -> Result<(), NetError> {
        let _ = stream;
        Ok(())
    }

    /// Computes output data from current input data. `buf` is transient
    /// workspace only; its contents carry no guarantee between calls.
    fn forward(&self, src: &[SharedTensor], buf: &[SharedTensor], dst: &[SharedTensor]);
}

/// Creates the layer implementation for a parameter record.
///
/// The operator set is closed; `Dropout` is served by the stub layer since
/// inference-time dropout is the identity.
pub fn create(param: LayerParam) -> Result<Box<dyn Layer>, NetError> {
    let layer: Box<dyn Layer> = match param.kind {
        LayerKind::BinaryOperation => Box::new(BinaryOperationLayer::new(param)),
        LayerKind::Concat => Box::new(ConcatLayer::new(param)),
        LayerKind::Dropout | LayerKind::Stub => Box::new(StubLayer::new(param)),
        LayerKind::Eltwise => Box::new(EltwiseLayer::new(param)),
        LayerKind::InnerProduct => Box::new(InnerProductLayer::new(param)),
        LayerKind::Input => Box::new(InputLayer::new(param)),
        LayerKind::Relu => Box::new(ReluLayer::new(param)),
        LayerKind::Scale => Box::new(ScaleLayer::new(param)),
        LayerKind::Sigmoid => Box::new(SigmoidLayer::new(param)),
        LayerKind::Softmax => Box::new(SoftmaxLayer::new(param)),
        LayerKind::Tanh => Box::new(TanhLayer::new(param)),
    };
    Ok(layer)
}

/// Validates fixed operand arity.
pub(crate) fn check_io(
    name: &str,
    src: &[SharedTensor],
    dst: &[SharedTensor],
    want_src: usize,
    want_dst: usize,
) -> Result<(), NetError> {
    if src.len() != want_src || dst.len() != want_dst {
        return Err(NetError::config(
            name,
            format!(
                "expected {} input(s) and {} output(s), got {} and {}",
                want_src,
                want_dst,
                src.len(),
                dst.len()
            ),
        ));
    }
    Ok(())
}

/// Reads one weight tensor of the given shape from the stream, little-endian
/// `f32`. A short stream surfaces as `TruncatedWeights` for the named layer.
pub(crate) fn read_weight(
    stream: &mut dyn Read,
    layer: &str,
    dim: &[usize],
) -> Result<Tensor, NetError> {
    let mut data = vec![0.0f32; dim.iter().product()];
    stream
        .read_f32_into::<LittleEndian>(&mut data)
        .map_err(|err| {
            if err.kind() == io::ErrorKind::UnexpectedEof {
                NetError::TruncatedWeights {
                    layer: layer.to_string(),
                }
            } else {
                NetError::Io(err)
            }
        })?;
    Ok(Tensor::from_data(dim, data))
}

/// Propagates `src`'s shape onto `dst`. Safe when the handles alias.
pub(crate) fn reshape_like(dst: &SharedTensor, src: &SharedTensor) {
    let shape = src.borrow().shape().to_vec();
    dst.borrow_mut().reshape(&shape);
}

/// Copies `src`'s data into `dst`. A no-op when the handles alias.
pub(crate) fn copy_to(dst: &SharedTensor, src: &SharedTensor) {
    if Rc::ptr_eq(dst, src) {
        return;
    }
    let s = src.borrow();
    let mut d = dst.borrow_mut();
    d.data_mut().copy_from_slice(s.data());
}

/// Applies `dst[i] = f(src[i])` elementwise. Safe when the handles alias.
pub(crate) fn map_unary(dst: &SharedTensor, src: &SharedTensor, f: impl Fn(f32) -> f32) {
    if Rc::ptr_eq(dst, src) {
        let mut d = dst.borrow_mut();
        for v in d.data_mut() {
            *v = f(*v);
        }
    } else {
        let s = src.borrow();
        let mut d = dst.borrow_mut();
        for (v, &x) in d.data_mut().iter_mut().zip(s.data()) {
            *v = f(x);
        }
    }
}

/// Folds `src` into `dst` elementwise: `dst[i] = f(dst[i], src[i])`. Safe
/// when the handles alias.
pub(crate) fn zip_combine(dst: &SharedTensor, src: &SharedTensor, f: impl Fn(f32, f32) -> f32) {
    if Rc::ptr_eq(dst, src) {
        let mut d = dst.borrow_mut();
        for v in d.data_mut() {
            *v = f(*v, *v);
        }
    } else {
        let s = src.borrow();
        let mut d = dst.borrow_mut();
        for (v, &x) in d.data_mut().iter_mut().zip(s.data()) {
            *v = f(*v, x);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tensor::shared;

    #[test]
    fn test_map_unary_aliased() {
        let t = shared(Tensor::from_data(&[3], vec![1.0, -2.0, 3.0]));
        map_unary(&t, &t, |x| x * 2.0);
        assert_eq!(t.borrow().data(), &[2.0, -4.0, 6.0]);
    }

    #[test]
    fn test_zip_combine_aliased() {
        let t = shared(Tensor::from_data(&[2], vec![3.0, 5.0]));
        zip_combine(&t, &t, |a, b| a / b);
        assert_eq!(t.borrow().data(), &[1.0, 1.0]);
    }

    #[test]
    fn test_copy_to_separate_handles() {
        let a = shared(Tensor::from_data(&[2], vec![1.0, 2.0]));
        let b = shared(Tensor::with_shape(&[2]));
        copy_to(&b, &a);
        assert_eq!(b.borrow().data(), &[1.0, 2.0]);
    }

    #[test]
    fn test_read_weight_truncated_stream() {
        let bytes = vec![0u8; 6];
        let mut cursor = std::io::Cursor::new(bytes);
        let result = read_weight(&mut cursor, "fc", &[2]);
        assert!(matches!(result, Err(NetError::TruncatedWeights { .. })));
    }

    #[test]
    fn test_read_weight_little_endian() {
        let mut bytes = Vec::new();
        for v in [1.5f32, -2.0] {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        let mut cursor = std::io::Cursor::new(bytes);
        let tensor = read_weight(&mut cursor, "fc", &[2]).expect("read should succeed");
        assert_eq!(tensor.data(), &[1.5, -2.0]);
    }

    #[test]
    fn test_check_io_mismatch() {
        let t = shared(Tensor::new());
        let result = check_io("sig", &[t.clone(), t.clone()], &[t.clone()], 1, 1);
        assert!(matches!(result, Err(NetError::Configuration { .. })));
    }
}

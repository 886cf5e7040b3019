//! Tensor - the named, shaped, contiguous buffer flowing between stages.
//!
//! All tensor storage is created and owned by the graph builder; layers only
//! ever hold `SharedTensor` handles to tensors they were given. A handle is an
//! `Rc<RefCell<_>>` because the engine is strictly single-threaded and stages
//! may legitimately alias (an in-place output is the same tensor as its input).

use std::cell::RefCell;
use std::rc::Rc;

/// Handle to a tensor slot owned by the graph.
///
/// Stages hold these instead of names: all string resolution happens once at
/// build time, never on the execution path.
pub type SharedTensor = Rc<RefCell<Tensor>>;

/// A contiguous `f32` buffer with a mutable shape.
///
/// The shape may be empty before the first reshape; `size()` of an empty
/// shape is zero.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tensor {
    shape: Vec<usize>,
    data: Vec<f32>,
}

impl Tensor {
    /// Creates an empty tensor with no shape and no storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a tensor of the given shape, zero-filled.
    pub fn with_shape(shape: &[usize]) -> Self {
        let mut tensor = Self::new();
        tensor.reshape(shape);
        tensor
    }

    /// Creates a tensor from a shape and matching data.
    ///
    /// Panics if `data.len()` does not equal the shape's element count; this
    /// constructor is only reachable from code that has already sized the
    /// buffer (weight loading, tests).
    pub fn from_data(shape: &[usize], data: Vec<f32>) -> Self {
        assert_eq!(data.len(), shape.iter().product::<usize>());
        Self {
            shape: shape.to_vec(),
            data,
        }
    }

    /// Returns the current shape.
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Returns the total element count.
    pub fn size(&self) -> usize {
        if self.shape.is_empty() {
            0
        } else {
            self.shape.iter().product()
        }
    }

    /// Returns the dimension size at `axis`, or 1 past the last axis.
    pub fn dim(&self, axis: usize) -> usize {
        self.shape.get(axis).copied().unwrap_or(1)
    }

    /// Sets the shape, resizing storage to match. New elements are zero.
    ///
    /// Called on every reshape pass; idempotent for an unchanged shape.
    pub fn reshape(&mut self, shape: &[usize]) {
        self.shape = shape.to_vec();
        let size = self.size();
        self.data.resize(size, 0.0);
    }

    /// Grows storage to hold at least `size` elements without ever shrinking.
    ///
    /// Used for the shared scratch tensor: stages with different workspace
    /// needs run against the same storage, so sizing must be grow-only.
    pub fn extend(&mut self, size: usize) {
        if self.data.len() < size {
            self.data.resize(size, 0.0);
        }
        self.shape = vec![self.data.len()];
    }

    /// Returns the element data.
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Returns the element data mutably.
    pub fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Overwrites the contents, leaving the shape untouched.
    ///
    /// Panics if `values.len()` differs from the current size; callers set
    /// the shape first (graph inputs are reshaped before they are filled).
    pub fn fill_from(&mut self, values: &[f32]) {
        assert_eq!(values.len(), self.size());
        self.data[..values.len()].copy_from_slice(values);
    }
}

/// Wraps a tensor into a fresh shared handle.
pub fn shared(tensor: Tensor) -> SharedTensor {
    Rc::new(RefCell::new(tensor))
}

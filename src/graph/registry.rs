//! Tensor registry - the append-only name-to-slot table.

use std::collections::HashMap;

use crate::tensor::{shared, SharedTensor, Tensor};

/// Index of a tensor slot within the registry.
pub type TensorId = usize;

/// Append-only table mapping tensor names to storage slots.
///
/// Slots are created lazily the first time a name is produced and are never
/// removed or renamed; the registry lives exactly as long as the graph.
/// `resolve` allocates, `lookup` never does - the builder uses `lookup` for
/// layer inputs so that an unknown name is an error instead of a silently
/// allocated empty tensor.
#[derive(Default)]
pub struct TensorRegistry {
    index: HashMap<String, TensorId>,
    tensors: Vec<SharedTensor>,
}

impl TensorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the slot bound to `name`, allocating a fresh empty tensor on
    /// first sight.
    pub fn resolve(&mut self, name: &str) -> TensorId {
        if let Some(&id) = self.index.get(name) {
            return id;
        }
        let id = self.tensors.len();
        self.tensors.push(shared(Tensor::new()));
        self.index.insert(name.to_string(), id);
        id
    }

    /// Returns the slot bound to `name`, if any. Never allocates.
    pub fn lookup(&self, name: &str) -> Option<TensorId> {
        self.index.get(name).copied()
    }

    /// Returns a handle to the slot's tensor.
    pub fn share(&self, id: TensorId) -> SharedTensor {
        self.tensors[id].clone()
    }

    /// Number of slots allocated so far.
    pub fn len(&self) -> usize {
        self.tensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tensors.is_empty()
    }
}

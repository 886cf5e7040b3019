//! Graph builder and sequential executor.
//!
//! Declaration order is the topological order: the description format
//! guarantees producers precede consumers, so the builder makes a single pass
//! and never sorts. A reference to a name produced only later in the list is
//! an unresolved input, the same as a name never produced at all.

use std::collections::BTreeSet;
use std::io::Read;

use log::{debug, trace};

use crate::errors::NetError;
use crate::layers::{self, Layer};
use crate::params::{LayerKind, LayerParam};
use crate::tensor::{shared, SharedTensor, Tensor};

use super::registry::TensorRegistry;

/// One layer bound to its resolved tensor handles.
///
/// Immutable once built; the graph supports no incremental edit.
pub struct Stage {
    layer: Box<dyn Layer>,
    src: Vec<SharedTensor>,
    buf: Vec<SharedTensor>,
    dst: Vec<SharedTensor>,
}

impl Stage {
    fn setup(&mut self) -> Result<(), NetError> {
        self.layer.setup(&self.src, &self.buf, &self.dst)
    }

    fn reshape(&mut self) -> Result<(), NetError> {
        self.layer.reshape(&self.src, &self.buf, &self.dst)
    }

    fn load_weights(&mut self, stream: &mut dyn Read) -> Result<(), NetError> {
        self.layer.load_weights(stream)
    }

    fn forward(&self) {
        self.layer.forward(&self.src, &self.buf, &self.dst);
    }

    /// The layer bound into this stage.
    pub fn layer(&self) -> &dyn Layer {
        self.layer.as_ref()
    }
}

/// The executable graph: ordered stages plus the tensors they run over.
pub struct Graph {
    stages: Vec<Stage>,
    registry: TensorRegistry,
    src: Vec<SharedTensor>,
    dst: Vec<SharedTensor>,
    dst_names: Vec<String>,
}

impl Graph {
    /// Builds the graph from the ordered layer list.
    ///
    /// Each layer's inputs are resolved against the registry, its outputs are
    /// bound (in-place, or fresh, or rejected as duplicates), the shared
    /// scratch tensor is attached, and the layer's setup and reshape run
    /// immediately so a malformed description fails here rather than at the
    /// first inference. Any error discards the partial graph.
    pub fn build(params: &[LayerParam]) -> Result<Self, NetError> {
        if params.is_empty() {
            return Err(NetError::NoLayers);
        }

        let mut registry = TensorRegistry::new();
        let buf = vec![shared(Tensor::new())];
        let mut unconsumed = BTreeSet::new();
        let mut graph_src = Vec::new();
        let mut stages = Vec::with_capacity(params.len());

        for param in params {
            let layer = layers::create(param.clone())?;

            let mut src = Vec::with_capacity(param.src.len());
            for name in &param.src {
                let id = registry
                    .lookup(name)
                    .ok_or_else(|| NetError::UnresolvedInput {
                        layer: param.name.clone(),
                        tensor: name.clone(),
                    })?;
                src.push(registry.share(id));
                unconsumed.remove(name);
            }

            let mut dst = Vec::with_capacity(param.dst.len());
            for (position, name) in param.dst.iter().enumerate() {
                let handle = if param.src.get(position) == Some(name) {
                    src[position].clone()
                } else if registry.lookup(name).is_some() {
                    return Err(NetError::DuplicateOutput {
                        layer: param.name.clone(),
                        tensor: name.clone(),
                    });
                } else {
                    let id = registry.resolve(name);
                    registry.share(id)
                };
                unconsumed.insert(name.clone());
                if param.kind == LayerKind::Input {
                    graph_src.push(handle.clone());
                }
                dst.push(handle);
            }

            let mut stage = Stage {
                layer,
                src,
                buf: buf.clone(),
                dst,
            };
            stage.setup()?;
            stage.reshape()?;
            stages.push(stage);
        }

        // BTreeSet iteration gives the name-sorted, deterministic output order.
        let dst_names: Vec<String> = unconsumed.into_iter().collect();
        let graph_dst = dst_names
            .iter()
            .map(|name| {
                let id = registry
                    .lookup(name)
                    .expect("unconsumed names are always registered");
                registry.share(id)
            })
            .collect();

        debug!(
            "built graph: {} stage(s), {} tensor slot(s), {} input(s), {} output(s)",
            stages.len(),
            registry.len(),
            graph_src.len(),
            dst_names.len()
        );

        Ok(Self {
            stages,
            registry,
            src: graph_src,
            dst: graph_dst,
            dst_names,
        })
    }

    /// Streams weights into every stage, in build order. The first failing
    /// layer aborts the whole load; the stream cursor is never rewound.
    pub fn load_weights(&mut self, stream: &mut dyn Read) -> Result<(), NetError> {
        for stage in &mut self.stages {
            trace!("loading weights for layer `{}`", stage.layer.param().name);
            stage.load_weights(stream)?;
        }
        debug!("loaded weights for {} stage(s)", self.stages.len());
        Ok(())
    }

    /// Re-propagates shapes through every stage, in build order. Call after
    /// any graph-input tensor changes shape.
    pub fn reshape_all(&mut self) -> Result<(), NetError> {
        for stage in &mut self.stages {
            stage.reshape()?;
        }
        Ok(())
    }

    /// Runs every stage's forward computation, in build order. Assumes
    /// `reshape_all` has already established consistent shapes.
    pub fn forward_all(&self) {
        for stage in &self.stages {
            stage.forward();
        }
    }

    /// Graph-input tensors, in declaration order.
    pub fn src(&self) -> &[SharedTensor] {
        &self.src
    }

    /// Graph-output tensors (produced but never consumed), name-sorted.
    pub fn dst(&self) -> &[SharedTensor] {
        &self.dst
    }

    /// Names of the graph-output tensors, in the same order as `dst`.
    pub fn dst_names(&self) -> &[String] {
        &self.dst_names
    }

    /// The bound stages, in execution order.
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Number of tensor slots the registry allocated.
    pub fn tensor_count(&self) -> usize {
        self.registry.len()
    }
}

//! Network - the public load/reshape/forward surface.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use log::{debug, warn};

use crate::errors::NetError;
use crate::graph::Graph;
use crate::params::NetworkParam;
use crate::tensor::SharedTensor;

/// A fully built, shaped, and weighted inference network.
///
/// Loading is all-or-nothing: a malformed description, an unresolvable graph,
/// or a short weight stream each fail the whole load and no partial network
/// is exposed. After a successful load the caller fills the input tensors,
/// optionally resizes them (followed by [`reshape`](Network::reshape)), and
/// calls [`forward`](Network::forward) as many times as needed.
pub struct Network {
    param: NetworkParam,
    graph: Graph,
}

impl Network {
    /// Loads a network from a JSON description and a binary weight stream.
    ///
    /// # Example
    ///
    /// ```
    /// use std::io::Cursor;
    /// use forwardnet::Network;
    ///
    /// let description = r#"{
    ///     "name": "squash",
    ///     "layers": [
    ///         {"type": "Input", "name": "in", "dst": ["x"],
    ///          "input": {"shape": [{"dim": [1, 2]}]}},
    ///         {"type": "Sigmoid", "name": "sig", "src": ["x"], "dst": ["y"]}
    ///     ]
    /// }"#;
    ///
    /// let mut network = Network::load(description, Cursor::new(Vec::new()))?;
    /// network.src()[0].borrow_mut().fill_from(&[0.0, 4.0]);
    /// network.forward();
    /// assert!((network.dst()[0].borrow().data()[0] - 0.5).abs() < 1e-6);
    /// # Ok::<(), forwardnet::NetError>(())
    /// ```
    pub fn load(description: &str, mut weights: impl Read) -> Result<Self, NetError> {
        let param: NetworkParam = serde_json::from_str(description)?;
        Self::from_param(param, &mut weights)
    }

    /// Loads a network from a description file and a weight file.
    pub fn load_from_files(
        model: impl AsRef<Path>,
        weights: impl AsRef<Path>,
    ) -> Result<Self, NetError> {
        let description = std::fs::read_to_string(model)?;
        let stream = BufReader::new(File::open(weights)?);
        Self::load(&description, stream)
    }

    /// Loads a network from an already-parsed description.
    pub fn from_param(param: NetworkParam, weights: &mut dyn Read) -> Result<Self, NetError> {
        let mut graph = Graph::build(&param.layers)?;
        graph.load_weights(weights)?;

        if !param.dst.is_empty() {
            let mut declared = param.dst.clone();
            declared.sort();
            if declared != graph.dst_names() {
                warn!(
                    "network `{}` declares outputs {:?} but the graph produces {:?}",
                    param.name,
                    param.dst,
                    graph.dst_names()
                );
            }
        }
        debug!("network `{}` loaded", param.name);

        Ok(Self { param, graph })
    }

    /// The parsed description this network was built from.
    pub fn param(&self) -> &NetworkParam {
        &self.param
    }

    /// Graph-input tensors, in declaration order. Mutate their contents (and
    /// shapes) through the handle; call [`reshape`](Network::reshape) after
    /// any shape change.
    pub fn src(&self) -> &[SharedTensor] {
        self.graph.src()
    }

    /// Graph-output tensors, name-sorted.
    pub fn dst(&self) -> &[SharedTensor] {
        self.graph.dst()
    }

    /// Names of the graph-output tensors, in the same order as `dst`.
    pub fn dst_names(&self) -> &[String] {
        self.graph.dst_names()
    }

    /// Re-propagates shapes through every stage after an input resize.
    ///
    /// A failure here means the new input shapes are invalid for some layer;
    /// the network stays usable and the caller may resize and retry.
    pub fn reshape(&mut self) -> Result<(), NetError> {
        self.graph.reshape_all()
    }

    /// Runs one forward pass over all stages in build order.
    pub fn forward(&mut self) {
        self.graph.forward_all();
    }

    /// Number of tensor slots the graph allocated.
    pub fn tensor_count(&self) -> usize {
        self.graph.tensor_count()
    }
}

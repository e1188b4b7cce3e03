//! Layered execution plan.
//!
//! Layers are built by repeated scans over the nodes in declaration order:
//! every node whose dependencies are all in earlier layers joins the current
//! layer. A scan that adds nothing while nodes remain means the remaining
//! nodes can never run, and the build fails naming them.

use std::collections::HashSet;

use serde::Serialize;

use crate::error::BuildError;
use crate::graph::Graph;
use crate::node::NodeKey;

/// Nodes that only depend on nodes of earlier layers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Layer {
  nodes: Vec<NodeKey>,
}

impl Layer {
  pub fn nodes(&self) -> &[NodeKey] {
    &self.nodes
  }

  pub fn len(&self) -> usize {
    self.nodes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.nodes.is_empty()
  }
}

/// Ordered layers covering every node of a workflow exactly once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Plan {
  layers: Vec<Layer>,
}

impl Plan {
  /// Arrange `nodes` into layers. `name` renders node ids for errors.
  pub fn build(
    nodes: &[NodeKey],
    graph: &Graph,
    name: impl Fn(NodeKey) -> String,
  ) -> Result<Self, BuildError> {
    let mut done: HashSet<NodeKey> = HashSet::new();
    let mut layers = Vec::new();

    while done.len() < nodes.len() {
      let layer: Vec<NodeKey> = nodes
        .iter()
        .copied()
        .filter(|node| !done.contains(node) && graph.is_ready(*node, &done))
        .collect();

      if layer.is_empty() {
        let stuck = nodes
          .iter()
          .filter(|node| !done.contains(node))
          .map(|node| name(*node))
          .collect();
        return Err(BuildError::Unschedulable { nodes: stuck });
      }

      done.extend(layer.iter().copied());
      layers.push(Layer { nodes: layer });
    }

    Ok(Self { layers })
  }

  pub fn layers(&self) -> &[Layer] {
    &self.layers
  }

  pub fn len(&self) -> usize {
    self.layers.len()
  }

  pub fn is_empty(&self) -> bool {
    self.layers.is_empty()
  }

  /// Index of the layer holding `node`.
  pub fn layer_of(&self, node: NodeKey) -> Option<usize> {
    self.layers.iter().position(|l| l.nodes.contains(&node))
  }

  /// Every node in execution order.
  pub fn nodes(&self) -> impl Iterator<Item = NodeKey> + '_ {
    self.layers.iter().flat_map(|l| l.nodes.iter().copied())
  }
}

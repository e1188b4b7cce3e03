use std::collections::{HashMap, HashSet};

use crate::node::NodeKey;

/// Dependency graph of a built workflow.
#[derive(Debug, Clone, Default)]
pub struct Graph {
  /// Reverse adjacency: node -> nodes it depends on.
  reverse_adjacency: HashMap<NodeKey, Vec<NodeKey>>,
}

impl Graph {
  /// Build a graph from nodes and `(dependency, dependent)` edges.
  pub fn new(nodes: &[NodeKey], edges: &[(NodeKey, NodeKey)]) -> Self {
    let mut reverse_adjacency: HashMap<NodeKey, Vec<NodeKey>> = HashMap::new();

    for node in nodes {
      reverse_adjacency.entry(*node).or_default();
    }

    for (from, to) in edges {
      reverse_adjacency.entry(*to).or_default().push(*from);
    }

    Self { reverse_adjacency }
  }

  /// Nodes that `node` depends on directly.
  pub fn upstream(&self, node: NodeKey) -> &[NodeKey] {
    self
      .reverse_adjacency
      .get(&node)
      .map(|v| v.as_slice())
      .unwrap_or(&[])
  }

  /// Whether every dependency of `node` is in `done`.
  pub fn is_ready(&self, node: NodeKey, done: &HashSet<NodeKey>) -> bool {
    self.upstream(node).iter().all(|dep| done.contains(dep))
  }
}

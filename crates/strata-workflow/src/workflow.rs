use strata_config::WorkflowDef;

use crate::compose;
use crate::error::BuildError;
use crate::graph::Graph;
use crate::node::{NodeKey, NodeRole};
use crate::resolve::{Resolver, node_name};
use crate::store::{IdCounter, assign_ids};
use crate::table::Table;
use crate::topology::Plan;

/// A built workflow: classified tables and columns, their dependency graph
/// and the layered plan.
#[derive(Debug, Clone)]
pub struct Workflow {
  id: String,
  definition: WorkflowDef,
  tables: Vec<Table>,
  graph: Graph,
  plan: Plan,
}

impl Workflow {
  /// Build a workflow from its definition.
  ///
  /// This process:
  /// 1. Assigns missing ids and checks their uniqueness
  /// 2. Expands column families and classifies every operation
  /// 3. Adds intermediate compose columns
  /// 4. Resolves the dependencies of every node
  /// 5. Arranges the nodes into layers
  pub fn build(mut definition: WorkflowDef) -> Result<Self, BuildError> {
    let mut ids = IdCounter::new();
    assign_ids(&mut definition, &mut ids)?;

    let mut tables = definition
      .tables
      .iter()
      .cloned()
      .enumerate()
      .map(|(position, table)| Table::build(table, position))
      .collect::<Result<Vec<_>, _>>()?;

    compose::synthesize(&mut tables)?;
    for table in &tables {
      definition.tables[table.position] = table.definition.clone();
    }

    let nodes: Vec<NodeKey> = tables.iter().flat_map(Table::nodes).collect();
    let resolver = Resolver::new(&tables);
    let mut edges = Vec::new();
    for node in &nodes {
      for dependency in resolver.dependencies(*node)? {
        edges.push((dependency, *node));
      }
    }

    let graph = Graph::new(&nodes, &edges);
    let plan = Plan::build(&nodes, &graph, |node| node_name(&tables, node))?;

    Ok(Self {
      id: definition.id.clone().unwrap_or_default(),
      definition,
      tables,
      graph,
      plan,
    })
  }

  /// Parse and build a workflow from JSON.
  pub fn from_json(json: &str) -> Result<Self, BuildError> {
    Self::build(WorkflowDef::from_json(json)?)
  }

  pub fn id(&self) -> &str {
    &self.id
  }

  /// The definition with generated ids and synthesized columns written back.
  pub fn definition(&self) -> &WorkflowDef {
    &self.definition
  }

  pub fn tables(&self) -> &[Table] {
    &self.tables
  }

  pub fn table(&self, id: &str) -> Option<&Table> {
    self.tables.iter().find(|t| t.id == id)
  }

  pub fn graph(&self) -> &Graph {
    &self.graph
  }

  pub fn plan(&self) -> &Plan {
    &self.plan
  }

  /// Readable id of a node: `Table`, `Table.Column` or `filter(Table)`.
  pub fn node_name(&self, node: NodeKey) -> String {
    node_name(&self.tables, node)
  }

  /// Kind of a node for logs and reports, e.g. `extend` or `link`.
  pub fn node_kind(&self, node: NodeKey) -> &'static str {
    let table = &self.tables[node.table];
    match node.role {
      NodeRole::Table => table.kind.as_str(),
      NodeRole::Column(c) => table.columns[c].kind().as_str(),
      NodeRole::Filter => "filter",
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_generated_ids_are_written_back() {
    let def = WorkflowDef::from_value(json!({"tables": [{"columns": [{"function": "std:float"}]}]}))
      .unwrap();
    let workflow = Workflow::build(def).unwrap();

    assert_eq!(workflow.id(), "workflow#0");
    let table = &workflow.definition().tables[0];
    assert_eq!(table.id.as_deref(), Some("table#1"));
    assert_eq!(table.columns[0].id.as_deref(), Some("column#2"));
    assert_eq!(workflow.tables()[0].columns[0].id, "column#2");
  }

  #[test]
  fn test_node_names_and_kinds() {
    let workflow = Workflow::from_json(
      r#"{"tables": [{"id": "T", "row_filter": {"function": "std:not_null"},
          "columns": [{"id": "L", "operation": "link", "linked_table": "T"}]}]}"#,
    )
    .unwrap();

    assert_eq!(workflow.node_name(NodeKey::table(0)), "T");
    assert_eq!(workflow.node_name(NodeKey::column(0, 0)), "T.L");
    assert_eq!(workflow.node_name(NodeKey::filter(0)), "filter(T)");
    assert_eq!(workflow.node_kind(NodeKey::table(0)), "noop");
    assert_eq!(workflow.node_kind(NodeKey::column(0, 0)), "link");
    assert_eq!(workflow.node_kind(NodeKey::filter(0)), "filter");
  }

  #[test]
  fn test_malformed_definition() {
    assert!(matches!(
      Workflow::from_json(r#"{"tables": {}}"#),
      Err(BuildError::Config(_))
    ));
  }
}

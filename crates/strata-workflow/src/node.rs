use serde::Serialize;

/// What a node does for its table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case", tag = "role", content = "column")]
pub enum NodeRole {
  /// Populate the table.
  Table,
  /// Evaluate the column at this position of the table.
  Column(usize),
  /// Apply the table's row and column filters.
  Filter,
}

/// Identity of an operation node: a table position and a role.
///
/// Nodes compare by identity, never by the definitions behind them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeKey {
  pub table: usize,
  pub role: NodeRole,
}

impl NodeKey {
  pub fn table(table: usize) -> Self {
    Self {
      table,
      role: NodeRole::Table,
    }
  }

  pub fn column(table: usize, column: usize) -> Self {
    Self {
      table,
      role: NodeRole::Column(column),
    }
  }

  pub fn filter(table: usize) -> Self {
    Self {
      table,
      role: NodeRole::Filter,
    }
  }
}

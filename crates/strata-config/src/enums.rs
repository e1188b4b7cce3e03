use serde::{Deserialize, Serialize};

/// Explicit operation of a table definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableOperation {
  /// No records are added; data is supplied from outside or already present.
  Noop,
  /// Inherits the completed data of another table.
  Extend,
  /// A function builds a new table from zero or more input tables.
  All,
  /// Distinct projection of a source table over a set of columns.
  Project,
  /// Cartesian product of the input tables.
  Product,
  /// Key-based left outer join of the input tables.
  Join,
  /// Group a fact table and reduce each group.
  Aggregate,
}

impl TableOperation {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Noop => "noop",
      Self::Extend => "extend",
      Self::All => "all",
      Self::Project => "project",
      Self::Product => "product",
      Self::Join => "join",
      Self::Aggregate => "aggregate",
    }
  }
}

/// Explicit operation of a column definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnOperation {
  /// Function applied to every row.
  Calculate,
  /// Function applied to every window of rows.
  Roll,
  /// Function applied once to the whole input.
  All,
  /// Row references into another table, matched by keys.
  Link,
  /// Reduction of fact table groups formed by a link column.
  Aggregate,
  /// Values reached by following a path of link columns.
  Compose,
}

impl ColumnOperation {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Calculate => "calculate",
      Self::Roll => "roll",
      Self::All => "all",
      Self::Link => "link",
      Self::Aggregate => "aggregate",
      Self::Compose => "compose",
    }
  }

  /// Whether this operation applies a user function to the owning table's data.
  pub fn is_function(&self) -> bool {
    matches!(self, Self::Calculate | Self::Roll | Self::All)
  }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
  #[default]
  Sequential,
  Parallel,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
  /// Abort the remaining plan on the first failed node.
  #[default]
  FailFast,
  /// Log the failed node, finish its layer and skip its dependents.
  Continue,
}

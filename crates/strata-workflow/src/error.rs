use strata_config::ConfigError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BuildError {
  #[error(transparent)]
  Config(#[from] ConfigError),

  #[error("duplicate table id: {table}")]
  DuplicateTableId { table: String },

  #[error("duplicate column id '{column}' in table '{table}'")]
  DuplicateColumnId { table: String, column: String },

  /// A definition that parses but cannot be built, e.g. a compose column
  /// with a one-segment path.
  #[error("invalid definition of '{node}': {reason}")]
  InvalidDefinition { node: String, reason: String },

  /// A referenced table or column does not exist.
  #[error("'{node}' references unknown {reference}")]
  UnresolvedReference { node: String, reference: String },

  /// Nodes whose dependencies can never be satisfied (cycle or missing node).
  #[error("cannot schedule nodes: {}", nodes.join(", "))]
  Unschedulable { nodes: Vec<String> },
}

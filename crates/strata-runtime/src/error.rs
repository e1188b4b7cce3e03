//! Runtime errors.

use strata_frame::FrameError;
use strata_transform::TransformError;
use strata_workflow::BuildError;

/// Errors that can occur during runtime operations.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
  #[error(transparent)]
  Build(#[from] BuildError),

  /// Table not found in workflow.
  #[error("table '{table}' not found in workflow")]
  UnknownTable { table: String },

  /// A node action failed.
  #[error("{kind} node '{node}' failed")]
  Node {
    node: String,
    kind: &'static str,
    #[source]
    source: ActionError,
  },

  /// A blocking worker running a table partition did not finish.
  #[error("worker for table '{table}' did not finish: {message}")]
  Worker { table: String, message: String },
}

/// Why a single node action failed.
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
  /// A function reference the registry cannot resolve.
  #[error("function '{name}' is not registered")]
  MissingFunction { name: String },

  /// The definition lacks something this action needs.
  #[error("{reason}")]
  Definition { reason: String },

  #[error(transparent)]
  Transform(#[from] TransformError),

  #[error(transparent)]
  Frame(#[from] FrameError),
}

impl ActionError {
  pub(crate) fn definition(reason: impl Into<String>) -> Self {
    Self::Definition {
      reason: reason.into(),
    }
  }
}

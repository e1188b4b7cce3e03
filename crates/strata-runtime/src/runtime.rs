//! Workflow runtime.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use strata_config::{ExecutionMode, FailurePolicy};
use strata_frame::Frame;
use strata_transform::{FunctionRegistry, TransformEngine};
use strata_workflow::Workflow;

use crate::actions::Context;
use crate::error::RuntimeError;
use crate::execution::WorkflowExecution;
use crate::store::TableStore;

/// Configuration for the workflow runtime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
  /// Run each layer on the calling task, or one blocking worker per table.
  pub execution_mode: ExecutionMode,
  /// Abort on the first failure, or skip the dependents of failed nodes.
  pub failure_policy: FailurePolicy,
}

/// The workflow runtime.
///
/// Owns a built workflow together with the data of its tables, and executes
/// the layered plan against them.
pub struct WorkflowRuntime {
  pub(crate) context: Context,
  pub(crate) config: RuntimeConfig,
}

impl WorkflowRuntime {
  /// Create a new workflow runtime.
  ///
  /// # Arguments
  /// * `workflow` - The built workflow to execute
  /// * `registry` - Resolves the function references of the workflow
  /// * `engine` - Applies resolved functions to table data
  /// * `config` - Runtime configuration
  pub fn new(
    workflow: Workflow,
    registry: Arc<dyn FunctionRegistry>,
    engine: Arc<dyn TransformEngine>,
    config: RuntimeConfig,
  ) -> Self {
    let store = TableStore::new(workflow.tables());
    Self {
      context: Context {
        workflow: Arc::new(workflow),
        registry,
        engine,
        store: Arc::new(store),
      },
      config,
    }
  }

  /// Supply the data of a table before execution.
  ///
  /// Supplied data is what `noop` tables keep, and it takes the place of
  /// population for tables that have no function to run.
  ///
  /// # Errors
  /// Returns an error if the table ID is not found in the workflow.
  pub fn set_table_data(&self, table: &str, data: Frame) -> Result<(), RuntimeError> {
    let position = self
      .context
      .store
      .position(table)
      .ok_or_else(|| RuntimeError::UnknownTable {
        table: table.to_string(),
      })?;
    self.context.store.seed(position, data);
    Ok(())
  }

  /// The current data of a table, if it has any.
  pub fn table_data(&self, table: &str) -> Option<Frame> {
    let position = self.context.store.position(table)?;
    self.context.store.get(position)
  }

  /// Execute the whole plan.
  ///
  /// Returns a `WorkflowExecution` handle. Call `.wait()` to run the execution
  /// and get the result.
  pub fn execute_workflow(&self) -> WorkflowExecution<'_> {
    let execution_id = uuid::Uuid::new_v4().to_string();
    WorkflowExecution::new(self, execution_id)
  }

  /// Get a reference to the workflow.
  pub fn workflow(&self) -> &Workflow {
    &self.context.workflow
  }

  pub fn config(&self) -> &RuntimeConfig {
    &self.config
  }
}

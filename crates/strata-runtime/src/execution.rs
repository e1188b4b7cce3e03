//! Workflow execution.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use strata_config::{ExecutionMode, FailurePolicy};
use strata_workflow::NodeKey;
use tracing::{Span, error, info, instrument, warn};

use crate::actions::{Context, run_node};
use crate::error::RuntimeError;
use crate::runtime::WorkflowRuntime;

/// Result of a workflow execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowResult {
  /// Unique execution ID.
  pub execution_id: String,
  pub workflow_id: String,
  /// One outcome per node, in plan order.
  pub outcomes: Vec<NodeOutcome>,
}

impl WorkflowResult {
  /// Whether every node completed.
  pub fn is_success(&self) -> bool {
    self
      .outcomes
      .iter()
      .all(|o| matches!(o.status, NodeStatus::Completed))
  }

  pub fn outcome(&self, node: &str) -> Option<&NodeOutcome> {
    self.outcomes.iter().find(|o| o.node == node)
  }

  pub fn failed(&self) -> impl Iterator<Item = &NodeOutcome> {
    self
      .outcomes
      .iter()
      .filter(|o| matches!(o.status, NodeStatus::Failed { .. }))
  }

  pub fn skipped(&self) -> impl Iterator<Item = &NodeOutcome> {
    self
      .outcomes
      .iter()
      .filter(|o| matches!(o.status, NodeStatus::Skipped))
  }
}

/// What happened to one node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeOutcome {
  /// Readable node id, e.g. `Facts.Link`.
  pub node: String,
  pub kind: String,
  pub layer: usize,
  #[serde(flatten)]
  pub status: NodeStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum NodeStatus {
  Completed,
  Failed { error: String },
  /// Not run because a node it depends on failed or was skipped.
  Skipped,
}

/// A handle to a workflow execution.
///
/// Call `.wait()` to run the execution and get the result.
pub struct WorkflowExecution<'a> {
  runtime: &'a WorkflowRuntime,
  execution_id: String,
}

impl<'a> WorkflowExecution<'a> {
  pub(crate) fn new(runtime: &'a WorkflowRuntime, execution_id: String) -> Self {
    Self {
      runtime,
      execution_id,
    }
  }

  /// Wait for the workflow to complete.
  ///
  /// With the fail-fast policy the first failed node aborts the run and is
  /// returned as the error. With the continue policy failures are reported
  /// in the result instead.
  #[instrument(
    name = "workflow_execute",
    skip(self),
    fields(
      workflow_id = %self.runtime.workflow().id(),
      execution_id = %self.execution_id,
    )
  )]
  pub async fn wait(self) -> Result<WorkflowResult, RuntimeError> {
    let workflow = self.runtime.workflow();
    info!(
      execution_id = %self.execution_id,
      workflow_id = %workflow.id(),
      layers = workflow.plan().len(),
      mode = ?self.runtime.config.execution_mode,
      policy = ?self.runtime.config.failure_policy,
      "workflow_started"
    );

    self.runtime.context.store.reset();
    let result = self.run_layers().await;

    match &result {
      Ok(result) => {
        info!(
          execution_id = %self.execution_id,
          completed = result.outcomes.len() - result.failed().count() - result.skipped().count(),
          failed = result.failed().count(),
          skipped = result.skipped().count(),
          "workflow_completed"
        );
      }
      Err(e) => {
        error!(
          execution_id = %self.execution_id,
          error = %e,
          "workflow_failed"
        );
      }
    }

    result
  }

  /// Run the layers in order. A layer boundary is a barrier.
  async fn run_layers(&self) -> Result<WorkflowResult, RuntimeError> {
    let workflow = self.runtime.workflow();
    let policy = self.runtime.config.failure_policy;
    let mut outcomes = Vec::new();
    let mut blocked: HashSet<NodeKey> = HashSet::new();

    for (index, layer) in workflow.plan().layers().iter().enumerate() {
      info!(
        execution_id = %self.execution_id,
        layer = index,
        nodes = layer.len(),
        "layer_started"
      );

      let mut runnable = Vec::with_capacity(layer.len());
      for node in layer.nodes() {
        let upstream = workflow.graph().upstream(*node);
        if upstream.iter().any(|dep| blocked.contains(dep)) {
          warn!(node = %workflow.node_name(*node), "node_skipped");
          blocked.insert(*node);
          outcomes.push(self.outcome(*node, index, NodeStatus::Skipped));
        } else {
          runnable.push(*node);
        }
      }

      let results = match self.runtime.config.execution_mode {
        ExecutionMode::Sequential => run_partition(&self.runtime.context, &runnable, policy),
        ExecutionMode::Parallel => self.run_parallel(&runnable, policy).await?,
      };

      for (node, result) in results {
        match result {
          Ok(()) => outcomes.push(self.outcome(node, index, NodeStatus::Completed)),
          Err(e) if policy == FailurePolicy::FailFast => return Err(e),
          Err(e) => {
            blocked.insert(node);
            let status = NodeStatus::Failed {
              error: error_chain(&e),
            };
            outcomes.push(self.outcome(node, index, status));
          }
        }
      }
    }

    Ok(WorkflowResult {
      execution_id: self.execution_id.clone(),
      workflow_id: workflow.id().to_string(),
      outcomes,
    })
  }

  /// Run one blocking worker per table and wait for all of them.
  async fn run_parallel(
    &self,
    nodes: &[NodeKey],
    policy: FailurePolicy,
  ) -> Result<Vec<(NodeKey, Result<(), RuntimeError>)>, RuntimeError> {
    let mut partitions: Vec<(usize, Vec<NodeKey>)> = Vec::new();
    for node in nodes {
      match partitions.iter_mut().find(|(table, _)| *table == node.table) {
        Some((_, members)) => members.push(*node),
        None => partitions.push((node.table, vec![*node])),
      }
    }

    let handles: Vec<_> = partitions
      .into_iter()
      .map(|(table, members)| {
        let context = self.runtime.context.clone();
        let span = Span::current();
        let handle = tokio::task::spawn_blocking(move || {
          let _entered = span.enter();
          run_partition(&context, &members, policy)
        });
        (table, handle)
      })
      .collect();

    let (tables, handles): (Vec<_>, Vec<_>) = handles.into_iter().unzip();
    let joined = futures::future::join_all(handles).await;

    let workflow = self.runtime.workflow();
    let mut results = Vec::with_capacity(nodes.len());
    for (table, joined) in tables.into_iter().zip(joined) {
      let partition = joined.map_err(|e| RuntimeError::Worker {
        table: workflow.tables()[table].id.clone(),
        message: e.to_string(),
      })?;
      results.extend(partition);
    }
    Ok(results)
  }

  fn outcome(&self, node: NodeKey, layer: usize, status: NodeStatus) -> NodeOutcome {
    let workflow = self.runtime.workflow();
    NodeOutcome {
      node: workflow.node_name(node),
      kind: workflow.node_kind(node).to_string(),
      layer,
      status,
    }
  }
}

/// Run nodes in order. Under fail-fast the first failure ends the partition.
fn run_partition(
  context: &Context,
  nodes: &[NodeKey],
  policy: FailurePolicy,
) -> Vec<(NodeKey, Result<(), RuntimeError>)> {
  let mut results = Vec::with_capacity(nodes.len());
  for node in nodes {
    let result = run_node(context, *node);
    let failed = result.is_err();
    results.push((*node, result));
    if failed && policy == FailurePolicy::FailFast {
      break;
    }
  }
  results
}

/// An error with all of its sources, outermost first.
fn error_chain(error: &RuntimeError) -> String {
  let mut message = error.to_string();
  let mut source = std::error::Error::source(error);
  while let Some(cause) = source {
    message.push_str(": ");
    message.push_str(&cause.to_string());
    source = cause.source();
  }
  message
}

//! Node actions: populate a table, evaluate a column, filter a table.
//!
//! Every action clones the data it reads, computes without holding a lock
//! and installs the result in its own table.

mod evaluate;
mod filter;
mod populate;

use std::sync::Arc;

use serde_json::Value;
use strata_config::RowFilter;
use strata_frame::Frame;
use strata_transform::{Callable, FunctionRegistry, TransformEngine};
use strata_workflow::{NodeKey, NodeRole, Table, Workflow};
use tracing::{error, info, instrument};

use crate::error::{ActionError, RuntimeError};
use crate::store::TableStore;

/// Everything an action needs. Cheap to clone into blocking workers.
#[derive(Clone)]
pub(crate) struct Context {
  pub(crate) workflow: Arc<Workflow>,
  pub(crate) registry: Arc<dyn FunctionRegistry>,
  pub(crate) engine: Arc<dyn TransformEngine>,
  pub(crate) store: Arc<TableStore>,
}

impl Context {
  pub(crate) fn resolve(&self, name: &str) -> Result<Callable, ActionError> {
    self
      .registry
      .resolve(name)
      .ok_or_else(|| ActionError::MissingFunction {
        name: name.to_string(),
      })
  }

  pub(crate) fn table(&self, id: &str) -> Result<&Table, ActionError> {
    self
      .workflow
      .table(id)
      .ok_or_else(|| ActionError::definition(format!("unknown table '{}'", id)))
  }
}

/// Run the action of one node and report its outcome.
#[instrument(
  name = "node_execute",
  skip(ctx, node),
  fields(node = %ctx.workflow.node_name(node), kind = ctx.workflow.node_kind(node))
)]
pub(crate) fn run_node(ctx: &Context, node: NodeKey) -> Result<(), RuntimeError> {
  let name = ctx.workflow.node_name(node);
  let kind = ctx.workflow.node_kind(node);
  let table = &ctx.workflow.tables()[node.table];

  let result = match node.role {
    NodeRole::Table => populate::populate(ctx, table),
    NodeRole::Column(c) => evaluate::evaluate(ctx, table, &table.columns[c]),
    NodeRole::Filter => filter::filter(ctx, table),
  };

  match result {
    Ok(()) => {
      info!(node = %name, kind, "node_completed");
      Ok(())
    }
    Err(source) => {
      error!(node = %name, kind, error = %source, "node_failed");
      Err(RuntimeError::Node {
        node: name,
        kind,
        source,
      })
    }
  }
}

/// Keep the rows of `data` for which the filter predicate is truthy.
pub(crate) fn apply_row_filter(
  ctx: &Context,
  data: &mut Frame,
  row_filter: &RowFilter,
) -> Result<(), ActionError> {
  let callable = ctx.resolve(&row_filter.function)?;
  let input = select_inputs(data, row_filter.inputs.as_slice())?;
  let result = ctx.engine.apply(
    &callable,
    &input,
    row_filter.model.as_ref(),
    strata_config::Scope::One,
  )?;
  let mask: Vec<bool> = match result.column_at(0) {
    Some((_, cells)) => cells.iter().map(truthy).collect(),
    None => vec![false; data.row_count()],
  };
  data.retain_rows(&mask)?;
  Ok(())
}

/// The named columns of `data`, or all of them when no names are given.
pub(crate) fn select_inputs(data: &Frame, inputs: &[String]) -> Result<Frame, ActionError> {
  if inputs.is_empty() {
    Ok(data.clone())
  } else {
    Ok(data.select(inputs)?)
  }
}

fn truthy(value: &Value) -> bool {
  match value {
    Value::Null => false,
    Value::Bool(b) => *b,
    Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
    Value::String(s) => !s.is_empty(),
    Value::Array(items) => !items.is_empty(),
    Value::Object(map) => !map.is_empty(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_truthy() {
    assert!(truthy(&json!(true)));
    assert!(truthy(&json!(2)));
    assert!(truthy(&json!("x")));
    assert!(!truthy(&json!(0.0)));
    assert!(!truthy(&Value::Null));
    assert!(!truthy(&json!([])));
  }
}

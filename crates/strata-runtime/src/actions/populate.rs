use strata_frame::{Frame, FrameError};
use strata_workflow::{Table, TableKind, project_source};
use tracing::debug;

use super::Context;
use crate::error::ActionError;

const JOIN_HELPER: &str = "std:join";
const AGGREGATE_HELPER: &str = "std:aggregate";

/// Fill a table with rows according to its kind.
pub(super) fn populate(ctx: &Context, table: &Table) -> Result<(), ActionError> {
  let position = table.position;
  let seeded = ctx.store.is_seeded(position);

  let data = match table.kind {
    TableKind::Noop => ctx.store.get_or_empty(position),
    TableKind::Extend if seeded => ctx.store.get_or_empty(position),
    TableKind::Extend => extend(ctx, table)?,
    TableKind::All => match table.definition.function.as_deref() {
      Some(function) => apply_function(ctx, table, function)?,
      None if seeded => ctx.store.get_or_empty(position),
      None => {
        return Err(ActionError::definition(
          "table has neither a function nor supplied data",
        ));
      }
    },
    TableKind::Join => {
      let function = table.definition.function.as_deref().unwrap_or(JOIN_HELPER);
      apply_function(ctx, table, function)?
    }
    TableKind::Aggregate => {
      let function = table
        .definition
        .function
        .as_deref()
        .unwrap_or(AGGREGATE_HELPER);
      apply_function(ctx, table, function)?
    }
    TableKind::Project => project(ctx, table)?,
    TableKind::Product => product(ctx, table)?,
  };

  debug!(
    table = %table.id,
    rows = data.row_count(),
    columns = data.column_count(),
    "table_populated"
  );
  ctx.store.set(position, data);
  Ok(())
}

fn extend(ctx: &Context, table: &Table) -> Result<Frame, ActionError> {
  let base = match table.definition.inputs.first() {
    Some(id) => ctx.table(id)?.position,
    None => table
      .position
      .checked_sub(1)
      .ok_or_else(|| ActionError::definition("the first table cannot extend"))?,
  };
  Ok(ctx.store.get_or_empty(base))
}

fn input_frames(ctx: &Context, table: &Table) -> Result<Vec<Frame>, ActionError> {
  table
    .definition
    .inputs
    .iter()
    .map(|id| Ok(ctx.store.get_or_empty(ctx.table(id)?.position)))
    .collect()
}

fn apply_function(ctx: &Context, table: &Table, function: &str) -> Result<Frame, ActionError> {
  let callable = ctx.resolve(function)?;
  let inputs = input_frames(ctx, table)?;
  Ok(
    ctx
      .engine
      .apply_tables(&callable, &inputs, table.definition.model.as_ref())?,
  )
}

/// Distinct rows of the projected source columns, renamed by `outputs`.
fn project(ctx: &Context, table: &Table) -> Result<Frame, ActionError> {
  let (source, projected) = project_source(table)
    .ok_or_else(|| ActionError::definition("a project table needs a source table"))?;
  let data = ctx.store.get_or_empty(ctx.table(source)?.position);

  let mut result = if projected.is_empty() {
    data.distinct()
  } else {
    data.select(projected)?.distinct()
  };

  let names: Vec<String> = result.column_names().to_vec();
  for (name, output) in names.iter().zip(table.definition.outputs.iter()) {
    if name != output {
      result.rename(name, output.clone())?;
    }
  }
  Ok(result)
}

/// Cartesian product of the input tables, rows of the first table outermost.
fn product(ctx: &Context, table: &Table) -> Result<Frame, ActionError> {
  let mut inputs = input_frames(ctx, table)?.into_iter();
  let Some(mut result) = inputs.next() else {
    return Ok(Frame::new());
  };

  for right in inputs {
    let mut left_rows = Vec::with_capacity(result.row_count() * right.row_count());
    let mut right_rows = Vec::with_capacity(left_rows.capacity());
    for l in 0..result.row_count() {
      for r in 0..right.row_count() {
        left_rows.push(l);
        right_rows.push(r);
      }
    }

    let mut combined = result.take_rows(&left_rows)?;
    let added = right.take_rows(&right_rows)?;
    for (name, cells) in added.columns() {
      if combined.contains(name) {
        return Err(
          FrameError::DuplicateColumn {
            column: name.to_string(),
          }
          .into(),
        );
      }
      combined.set_column(name, cells.to_vec())?;
    }
    result = combined;
  }
  Ok(result)
}

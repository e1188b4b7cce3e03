use std::collections::HashMap;

use serde_json::Value;
use strata_config::{ColumnDef, TrainDef};
use strata_frame::{Frame, RowKey};
use strata_workflow::{Column, ColumnKind, ColumnMember, Table, find_compose};
use tracing::debug;

use super::{Context, apply_row_filter, select_inputs};
use crate::error::ActionError;

/// Evaluate every member of a column family in order, then install the
/// table data with all produced columns.
pub(super) fn evaluate(ctx: &Context, table: &Table, column: &Column) -> Result<(), ActionError> {
  let mut data = ctx.store.get_or_empty(table.position);
  for member in &column.members {
    match member.kind {
      ColumnKind::Calculate | ColumnKind::Roll { .. } | ColumnKind::All => {
        apply(ctx, &mut data, column, member)?
      }
      ColumnKind::Link => link(ctx, &mut data, column, member)?,
      ColumnKind::Aggregate => aggregate(ctx, &mut data, column, member)?,
      ColumnKind::Compose => compose(ctx, &mut data, table, column, member)?,
    }
  }
  ctx.store.set(table.position, data);
  Ok(())
}

/// Apply the member function to its inputs and attach the results.
///
/// Result columns take the declared outputs in order, then the column id
/// for a single undeclared output, and finally the name of the input at the
/// same position, which is overwritten.
fn apply(
  ctx: &Context,
  data: &mut Frame,
  column: &Column,
  member: &ColumnMember,
) -> Result<(), ActionError> {
  let def = &member.definition;
  let function = def
    .function
    .as_deref()
    .ok_or_else(|| ActionError::definition("column has no function"))?;
  let callable = ctx.resolve(function)?;
  let scope = member
    .kind
    .scope()
    .ok_or_else(|| ActionError::definition("column kind does not apply a function"))?;

  let input = select_inputs(data, def.inputs.as_slice())?;
  let model = prepare_model(ctx, data, def)?;
  let result = ctx.engine.apply(&callable, &input, model.as_ref(), scope)?;

  let mut names: Vec<String> = def.outputs.to_vec();
  if names.is_empty() {
    names.push(column.id.clone());
  }
  for (i, (produced, cells)) in result.columns().enumerate() {
    let name = names
      .get(i)
      .or_else(|| input.column_names().get(i))
      .map(String::as_str)
      .unwrap_or(produced);
    data.set_column(name, cells.to_vec())?;
  }
  debug!(
    column = %column.id,
    function,
    outputs = result.column_count(),
    "column_applied"
  );
  Ok(())
}

/// The model passed to the column function: the declared one, or a trained
/// one when only a training section is present.
fn prepare_model(ctx: &Context, data: &Frame, def: &ColumnDef) -> Result<Option<Value>, ActionError> {
  match (&def.model, &def.train) {
    (Some(model), _) => Ok(Some(model.clone())),
    (None, Some(train)) => train_model(ctx, data, def, train).map(Some),
    (None, None) => Ok(None),
  }
}

/// Train on the (optionally filtered) table data.
///
/// Labels are the training outputs, else the column outputs, restricted to
/// columns already present in the data. Without any, training is
/// unsupervised.
fn train_model(
  ctx: &Context,
  data: &Frame,
  def: &ColumnDef,
  train: &TrainDef,
) -> Result<Value, ActionError> {
  let callable = ctx.resolve(&train.function)?;

  let mut rows = data.clone();
  if let Some(row_filter) = &train.row_filter {
    apply_row_filter(ctx, &mut rows, row_filter)?;
  }

  let inputs = train.inputs.as_ref().unwrap_or(&def.inputs);
  let train_data = select_inputs(&rows, inputs.as_slice())?;

  let labels = if train.outputs.is_empty() {
    &def.outputs
  } else {
    &train.outputs
  };
  let present: Vec<&String> = labels.iter().filter(|l| rows.contains(l)).collect();
  let labels = if present.is_empty() {
    None
  } else {
    Some(rows.select(&present)?)
  };

  let model = ctx
    .engine
    .train(&callable, &train_data, labels.as_ref(), train.model.as_ref())?;
  debug!(
    function = %train.function,
    rows = train_data.row_count(),
    supervised = labels.is_some(),
    "model_trained"
  );
  Ok(model)
}

/// For every row, the position of the first linked row with equal keys.
fn link(
  ctx: &Context,
  data: &mut Frame,
  column: &Column,
  member: &ColumnMember,
) -> Result<(), ActionError> {
  let def = &member.definition;
  let linked_id = def
    .linked_table
    .as_deref()
    .ok_or_else(|| ActionError::definition("a link column needs a linked_table"))?;
  let linked = ctx.store.get_or_empty(ctx.table(linked_id)?.position);

  let keys = def.keys.as_slice();
  let linked_keys = if def.linked_keys.is_empty() {
    keys
  } else {
    def.linked_keys.as_slice()
  };
  if keys.is_empty() || keys.len() != linked_keys.len() {
    return Err(ActionError::definition(format!(
      "link keys {:?} do not match linked keys {:?}",
      keys, linked_keys
    )));
  }

  let linked_positions = linked.positions(linked_keys)?;
  let mut index: HashMap<RowKey, usize> = HashMap::new();
  for row in 0..linked.row_count() {
    if !has_null_key(&linked, row, &linked_positions) {
      index
        .entry(linked.row_key(row, &linked_positions))
        .or_insert(row);
    }
  }

  let source: &Frame = data;
  let positions = source.positions(keys)?;
  let cells: Vec<Value> = (0..source.row_count())
    .map(|row| {
      if has_null_key(source, row, &positions) {
        return Value::Null;
      }
      index
        .get(&source.row_key(row, &positions))
        .map_or(Value::Null, |target| Value::from(*target))
    })
    .collect();

  let matched = cells.iter().filter(|c| !c.is_null()).count();
  debug!(column = %column.id, rows = cells.len(), matched, "column_linked");
  data.set_column(member.default_output(column), cells)?;
  Ok(())
}

/// Reduce the fact rows pointing at each row of this table.
fn aggregate(
  ctx: &Context,
  data: &mut Frame,
  column: &Column,
  member: &ColumnMember,
) -> Result<(), ActionError> {
  let def = &member.definition;
  let fact_id = def
    .fact_table
    .as_deref()
    .ok_or_else(|| ActionError::definition("an aggregate column needs a fact_table"))?;
  let group_column = def
    .group_column
    .as_deref()
    .ok_or_else(|| ActionError::definition("an aggregate column needs a group_column"))?;
  let facts = ctx.store.get_or_empty(ctx.table(fact_id)?.position);

  let rows = data.row_count();
  let mut groups: Vec<Vec<usize>> = vec![Vec::new(); rows];
  for (fact_row, target) in facts.require(group_column)?.iter().enumerate() {
    if let Some(target) = target.as_u64().map(|t| t as usize).filter(|t| *t < rows) {
      groups[target].push(fact_row);
    }
  }

  let measures = if def.inputs.is_empty() {
    None
  } else {
    let function = def
      .function
      .as_deref()
      .ok_or_else(|| ActionError::definition("an aggregate column with inputs needs a function"))?;
    Some((ctx.resolve(function)?, facts.select(def.inputs.as_slice())?))
  };

  let fill = def.fillna_value.clone().unwrap_or(Value::Null);
  let mut cells = Vec::with_capacity(rows);
  for members in &groups {
    let value = match &measures {
      _ if members.is_empty() => Value::Null,
      None => Value::from(members.len()),
      Some((callable, measures)) => {
        let group = measures.take_rows(members)?;
        ctx.engine.reduce(callable, &group, def.model.as_ref())?
      }
    };
    cells.push(if value.is_null() { fill.clone() } else { value });
  }

  let empty = groups.iter().filter(|g| g.is_empty()).count();
  debug!(
    column = %column.id,
    facts = facts.row_count(),
    groups = rows,
    empty,
    "column_aggregated"
  );
  data.set_column(member.default_output(column), cells)?;
  Ok(())
}

/// Follow a link column and read the rest of the path in the linked table.
fn compose(
  ctx: &Context,
  data: &mut Frame,
  table: &Table,
  column: &Column,
  member: &ColumnMember,
) -> Result<(), ActionError> {
  let path = member.definition.inputs.as_slice();
  let (link_name, rest) = path
    .split_first()
    .filter(|(_, rest)| !rest.is_empty())
    .ok_or_else(|| ActionError::definition("a compose column needs a link and a target"))?;

  let linked_id = table
    .producer(link_name)
    .and_then(|c| c.members.iter().find_map(|m| m.definition.linked_table.as_deref()))
    .ok_or_else(|| ActionError::definition(format!("'{}' is not a link column", link_name)))?;
  let linked_table = ctx.table(linked_id)?;
  let linked = ctx.store.get_or_empty(linked_table.position);

  // Longer paths read the compose column of the linked table that follows
  // the rest of the path, whatever its id.
  let target_name = match rest {
    [name] => name.as_str(),
    _ => find_compose(linked_table, rest)
      .and_then(|c| {
        c.members
          .iter()
          .find(|m| m.definition.inputs.as_slice() == rest)
          .map(|m| m.default_output(c))
      })
      .ok_or_else(|| {
        ActionError::definition(format!(
          "table '{}' has no compose column for '{}'",
          linked_id,
          rest.join("::")
        ))
      })?,
  };
  let target = linked.require(target_name)?;

  let cells: Vec<Value> = data
    .require(link_name)?
    .iter()
    .map(|link| {
      link
        .as_u64()
        .and_then(|row| target.get(row as usize))
        .cloned()
        .unwrap_or(Value::Null)
    })
    .collect();

  debug!(column = %column.id, target = %target_name, "column_composed");
  data.set_column(member.default_output(column), cells)?;
  Ok(())
}

fn has_null_key(frame: &Frame, row: usize, positions: &[usize]) -> bool {
  RowKey::has_null(
    positions
      .iter()
      .filter_map(|p| frame.column_at(*p).map(|(_, cells)| &cells[row])),
  )
}

use std::collections::HashSet;

use strata_config::{ColumnFilter, ColumnRef, Selection};
use strata_frame::Frame;
use strata_workflow::Table;
use tracing::debug;

use super::{Context, apply_row_filter};
use crate::error::ActionError;

/// Apply the row filter, drop excluded columns, then apply the column filter.
pub(super) fn filter(ctx: &Context, table: &Table) -> Result<(), ActionError> {
  let mut data = ctx.store.get_or_empty(table.position);
  let rows = data.row_count();

  if let Some(row_filter) = &table.definition.row_filter {
    apply_row_filter(ctx, &mut data, row_filter)?;
  }

  let excluded: Vec<&str> = table
    .columns
    .iter()
    .flat_map(|column| {
      column
        .members
        .iter()
        .filter(|m| m.definition.exclude)
        .flat_map(move |m| {
          if m.definition.outputs.is_empty() {
            vec![m.default_output(column)]
          } else {
            m.definition.outputs.iter().map(String::as_str).collect()
          }
        })
    })
    .collect();
  data.drop_columns(&excluded);

  if let Some(column_filter) = &table.definition.column_filter {
    apply_column_filter(&mut data, column_filter);
  }

  debug!(
    table = %table.id,
    rows_before = rows,
    rows_after = data.row_count(),
    columns = data.column_count(),
    "table_filtered"
  );
  ctx.store.set(table.position, data);
  Ok(())
}

/// Keep or drop the selected columns. Unknown names and positions are
/// ignored, and an include filter selecting nothing keeps every column.
fn apply_column_filter(data: &mut Frame, filter: &ColumnFilter) {
  match filter {
    ColumnFilter::Include(selection) => {
      let keep = selected(data, selection);
      if !keep.is_empty() {
        data.retain_positions(&keep);
      }
    }
    ColumnFilter::Exclude { exclude } => {
      let drop = selected(data, exclude);
      let keep = (0..data.column_count()).filter(|p| !drop.contains(p)).collect();
      data.retain_positions(&keep);
    }
  }
}

fn selected(data: &Frame, selection: &Selection) -> HashSet<usize> {
  selection
    .refs()
    .iter()
    .filter_map(|r| match r {
      ColumnRef::Index(i) => (*i < data.column_count()).then_some(*i),
      ColumnRef::Name(name) => data.position(name),
    })
    .collect()
}

//! Identity assignment for workflow definitions.

use std::collections::HashSet;

use strata_config::WorkflowDef;

use crate::error::BuildError;

/// Monotonic id source scoped to one workflow.
#[derive(Debug, Clone, Default)]
pub struct IdCounter {
  next: usize,
}

impl IdCounter {
  pub fn new() -> Self {
    Self::default()
  }

  /// The next id with the given prefix, e.g. `column#3`.
  pub fn next(&mut self, prefix: &str) -> String {
    let id = format!("{}#{}", prefix, self.next);
    self.next += 1;
    id
  }
}

/// Give every table and column without an id a generated one, writing it
/// back into the definition, then check that ids are unique.
pub(crate) fn assign_ids(def: &mut WorkflowDef, counter: &mut IdCounter) -> Result<(), BuildError> {
  if def.id.is_none() {
    def.id = Some(counter.next("workflow"));
  }

  let mut table_ids = HashSet::new();
  for table in def.tables.iter_mut() {
    let table_id = table
      .id
      .get_or_insert_with(|| counter.next("table"))
      .clone();
    if !table_ids.insert(table_id.clone()) {
      return Err(BuildError::DuplicateTableId { table: table_id });
    }

    let mut column_ids = HashSet::new();
    for column in table.columns.iter_mut() {
      let column_id = column
        .id
        .get_or_insert_with(|| counter.next("column"))
        .clone();
      if !column_ids.insert(column_id.clone()) {
        return Err(BuildError::DuplicateColumnId {
          table: table_id,
          column: column_id,
        });
      }
    }
  }
  Ok(())
}

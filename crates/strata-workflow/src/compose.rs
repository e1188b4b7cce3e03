//! Compose pre-pass.
//!
//! A compose column with path `[L1, L2, ..., C]` reads, through link `L1`, a
//! compose column `[L2, ..., C]` of the linked table. Missing intermediate
//! columns are added to the linked table under the id `L2::...::C` before
//! dependencies are resolved.

use strata_config::{ColumnDef, ColumnOperation, Names};

use crate::error::BuildError;
use crate::kind::ColumnKind;
use crate::node::NodeKey;
use crate::resolve::{Resolver, compose_path, find_compose};
use crate::table::Table;

pub(crate) fn synthesize(tables: &mut [Table]) -> Result<(), BuildError> {
  loop {
    let pending = missing_columns(tables)?;
    if pending.is_empty() {
      return Ok(());
    }
    for (position, path) in pending {
      let table = &mut tables[position];
      let id = path.join("::");
      if table.column(&id).is_some() {
        return Err(BuildError::DuplicateColumnId {
          table: table.id.clone(),
          column: id,
        });
      }
      table.push_column(ColumnDef {
        id: Some(id),
        operation: Some(ColumnOperation::Compose),
        inputs: Names::new(path),
        ..ColumnDef::default()
      })?;
    }
  }
}

/// Intermediate compose columns needed by the current columns, as
/// `(table position, path)` pairs without duplicates.
fn missing_columns(tables: &[Table]) -> Result<Vec<(usize, Vec<String>)>, BuildError> {
  let resolver = Resolver::new(tables);
  let mut pending: Vec<(usize, Vec<String>)> = Vec::new();

  for table in tables {
    for column in &table.columns {
      let node = NodeKey::column(table.position, column.position);
      for member in column.members.iter().filter(|m| m.kind == ColumnKind::Compose) {
        let path = compose_path(node, tables, column, member)?;
        if path.len() <= 2 {
          continue;
        }
        let linked = resolver.linked_table(node, table, &path[0])?;
        let rest = path[1..].to_vec();
        let known = find_compose(linked, &rest).is_some()
          || pending.iter().any(|(t, p)| *t == linked.position && *p == rest);
        if !known {
          pending.push((linked.position, rest));
        }
      }
    }
  }
  Ok(pending)
}

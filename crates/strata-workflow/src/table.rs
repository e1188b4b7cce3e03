use strata_config::{ColumnDef, TableDef};

use crate::error::BuildError;
use crate::family::expand_family;
use crate::kind::{ColumnKind, TableKind, classify_column, classify_table};
use crate::node::NodeKey;

/// A built table: its kind, definition and columns.
#[derive(Debug, Clone)]
pub struct Table {
  pub id: String,
  pub position: usize,
  pub kind: TableKind,
  /// The table definition with ids assigned. Its `columns` mirror
  /// [`Table::columns`], including synthesized ones.
  pub definition: TableDef,
  pub columns: Vec<Column>,
}

/// A built column: one node evaluating an ordered family of members.
#[derive(Debug, Clone)]
pub struct Column {
  pub id: String,
  pub position: usize,
  pub definition: ColumnDef,
  pub members: Vec<ColumnMember>,
}

/// One concrete definition of a column family.
#[derive(Debug, Clone)]
pub struct ColumnMember {
  pub definition: ColumnDef,
  pub kind: ColumnKind,
}

impl Table {
  pub(crate) fn build(definition: TableDef, position: usize) -> Result<Self, BuildError> {
    let id = definition.id.clone().unwrap_or_default();
    let kind = classify_table(&definition, position);
    let columns = definition
      .columns
      .iter()
      .enumerate()
      .map(|(i, def)| Column::build(def.clone(), i))
      .collect::<Result<Vec<_>, _>>()?;

    Ok(Self {
      id,
      position,
      kind,
      definition,
      columns,
    })
  }

  pub(crate) fn push_column(&mut self, definition: ColumnDef) -> Result<usize, BuildError> {
    let position = self.columns.len();
    self.definition.columns.push(definition.clone());
    self.columns.push(Column::build(definition, position)?);
    Ok(position)
  }

  pub fn column(&self, id: &str) -> Option<&Column> {
    self.columns.iter().find(|c| c.id == id)
  }

  /// The column that writes `name`: a column with that id, otherwise one
  /// whose members declare it as an output.
  pub fn producer(&self, name: &str) -> Option<&Column> {
    self
      .column(name)
      .or_else(|| self.columns.iter().find(|c| c.writes(name)))
  }

  /// Whether a filter node runs after the columns of this table.
  pub fn has_filter(&self) -> bool {
    self.definition.row_filter.is_some()
      || self.definition.column_filter.is_some()
      || self
        .columns
        .iter()
        .any(|c| c.members.iter().any(|m| m.definition.exclude))
  }

  /// Node keys of this table in declaration order.
  pub fn nodes(&self) -> Vec<NodeKey> {
    let mut nodes = vec![NodeKey::table(self.position)];
    nodes.extend((0..self.columns.len()).map(|c| NodeKey::column(self.position, c)));
    if self.has_filter() {
      nodes.push(NodeKey::filter(self.position));
    }
    nodes
  }
}

impl Column {
  pub(crate) fn build(definition: ColumnDef, position: usize) -> Result<Self, BuildError> {
    let id = definition.id.clone().unwrap_or_default();
    let members = expand_family(&definition)?
      .into_iter()
      .map(|def| ColumnMember {
        kind: classify_column(&def),
        definition: def,
      })
      .collect();

    Ok(Self {
      id,
      position,
      definition,
      members,
    })
  }

  /// The kind of the first member.
  pub fn kind(&self) -> ColumnKind {
    self
      .members
      .first()
      .map(|m| m.kind)
      .unwrap_or(ColumnKind::Calculate)
  }

  fn writes(&self, name: &str) -> bool {
    self
      .members
      .iter()
      .any(|m| m.definition.outputs.iter().any(|o| o == name))
  }
}

impl ColumnMember {
  /// Name of the single output written when none is declared.
  pub fn default_output<'a>(&'a self, column: &'a Column) -> &'a str {
    self
      .definition
      .outputs
      .first()
      .map(String::as_str)
      .unwrap_or(column.id.as_str())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::{Value, json};

  fn build(value: Value, position: usize) -> Table {
    let mut def: TableDef = serde_json::from_value(value).unwrap();
    def.id.get_or_insert_with(|| "T".to_string());
    for (i, c) in def.columns.iter_mut().enumerate() {
      c.id.get_or_insert_with(|| format!("c{}", i));
    }
    Table::build(def, position).unwrap()
  }

  #[test]
  fn test_family_is_one_column() {
    let table = build(
      json!({"columns": [{"id": "A", "extensions": [{"scope": "2"}, {"scope": "all"}]}]}),
      0,
    );
    assert_eq!(table.columns.len(), 1);
    let kinds: Vec<ColumnKind> = table.columns[0].members.iter().map(|m| m.kind).collect();
    assert_eq!(kinds, vec![ColumnKind::Roll { window: 2 }, ColumnKind::All]);
  }

  #[test]
  fn test_producer_by_id_or_output() {
    let table = build(
      json!({"columns": [
        {"id": "sum", "function": "std:sum", "outputs": "Total"},
        {"id": "Link", "operation": "link"}
      ]}),
      0,
    );
    assert_eq!(table.producer("Total").map(|c| c.id.as_str()), Some("sum"));
    assert_eq!(table.producer("Link").map(|c| c.id.as_str()), Some("Link"));
    assert!(table.producer("A").is_none());
  }

  #[test]
  fn test_filter_node_presence() {
    let plain = build(json!({"columns": [{"id": "A"}]}), 0);
    assert!(!plain.has_filter());
    assert_eq!(plain.nodes().len(), 2);

    let excluded = build(json!({"columns": [{"id": "A", "exclude": true}]}), 0);
    assert!(excluded.has_filter());
    assert_eq!(excluded.nodes().last(), Some(&NodeKey::filter(0)));

    let filtered = build(json!({"row_filter": {"function": "std:not_null"}}), 1);
    assert_eq!(filtered.nodes(), vec![NodeKey::table(1), NodeKey::filter(1)]);
  }
}

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::column::ColumnDef;
use crate::enums::TableOperation;
use crate::filter::{ColumnFilter, RowFilter};
use crate::names::Names;

/// A table definition: how the table is populated and which columns it derives.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableDef {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub id: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub operation: Option<TableOperation>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub function: Option<String>,
  /// Input tables, in the order they are handed to the function.
  #[serde(default, skip_serializing_if = "Names::is_empty")]
  pub inputs: Names,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub model: Option<Value>,
  /// Source of a `project` table. Falls back to the first input.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub source_table: Option<String>,
  /// Output column names of a `project` table.
  #[serde(default, skip_serializing_if = "Names::is_empty")]
  pub outputs: Names,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub row_filter: Option<RowFilter>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub column_filter: Option<ColumnFilter>,
  #[serde(default)]
  pub columns: Vec<ColumnDef>,
}

impl TableDef {
  pub fn column(&self, id: &str) -> Option<&ColumnDef> {
    self.columns.iter().find(|c| c.id.as_deref() == Some(id))
  }
}

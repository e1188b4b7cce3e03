use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ConfigError;
use crate::table::TableDef;

/// Serializable workflow definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDef {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub id: Option<String>,
  #[serde(default)]
  pub tables: Vec<TableDef>,
}

impl WorkflowDef {
  pub fn from_json(json: &str) -> Result<Self, ConfigError> {
    Ok(serde_json::from_str(json)?)
  }

  pub fn from_value(value: Value) -> Result<Self, ConfigError> {
    Ok(serde_json::from_value(value)?)
  }

  pub fn table(&self, id: &str) -> Option<&TableDef> {
    self.tables.iter().find(|t| t.id.as_deref() == Some(id))
  }
}

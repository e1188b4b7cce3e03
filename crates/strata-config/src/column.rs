use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::enums::ColumnOperation;
use crate::error::ConfigError;
use crate::filter::RowFilter;
use crate::names::Names;
use crate::scope::Scope;

/// A column definition: a derivation rule attached to a table.
///
/// One definition may describe a whole family of concrete columns through
/// `extensions`, a list of override mappings applied over the base
/// definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnDef {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub id: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub operation: Option<ColumnOperation>,
  /// Function reference resolved through the function registry.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub function: Option<String>,
  #[serde(default, skip_serializing_if = "Names::is_empty")]
  pub inputs: Names,
  #[serde(default, skip_serializing_if = "Names::is_empty")]
  pub outputs: Names,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub model: Option<Value>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub train: Option<TrainDef>,
  #[serde(alias = "window", skip_serializing_if = "Option::is_none")]
  pub scope: Option<Scope>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub data_type: Option<String>,
  /// Drop the produced columns when the table filter runs.
  #[serde(default, skip_serializing_if = "std::ops::Not::not")]
  pub exclude: bool,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub extensions: Vec<Map<String, Value>>,

  // Link
  #[serde(default, skip_serializing_if = "Names::is_empty")]
  pub keys: Names,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub linked_table: Option<String>,
  #[serde(default, skip_serializing_if = "Names::is_empty")]
  pub linked_keys: Names,

  // Aggregate
  #[serde(skip_serializing_if = "Option::is_none")]
  pub fact_table: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub group_column: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub fillna_value: Option<Value>,
}

/// How to produce a model by training before the column function is applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainDef {
  pub function: String,
  /// Training inputs. Inherits the column inputs when absent.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub inputs: Option<Names>,
  /// Label columns. Falls back to the column outputs when empty.
  #[serde(default, skip_serializing_if = "Names::is_empty")]
  pub outputs: Names,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub row_filter: Option<RowFilter>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub model: Option<Value>,
}

impl ColumnDef {
  /// The raw mapping form of this definition.
  pub fn to_map(&self) -> Result<Map<String, Value>, ConfigError> {
    match serde_json::to_value(self)? {
      Value::Object(map) => Ok(map),
      // A struct always serializes to an object.
      other => Err(ConfigError::Parse(serde::de::Error::custom(format!(
        "column definition serialized to {}",
        other
      )))),
    }
  }

  /// Rebuild a definition from its raw mapping form.
  pub fn from_map(map: Map<String, Value>) -> Result<Self, ConfigError> {
    Ok(serde_json::from_value(Value::Object(map))?)
  }

  /// Whether this definition describes a family of columns.
  pub fn has_extensions(&self) -> bool {
    !self.extensions.is_empty()
  }
}

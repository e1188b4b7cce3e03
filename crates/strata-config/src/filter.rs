use serde::{Deserialize, Serialize};

use crate::names::{ColumnRef, Names};

/// Keeps only the rows for which the predicate function returns a truthy value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowFilter {
  /// Predicate function reference, applied row by row.
  pub function: String,
  /// Columns passed to the predicate. All columns when empty.
  #[serde(default, skip_serializing_if = "Names::is_empty")]
  pub inputs: Names,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub model: Option<serde_json::Value>,
}

/// Columns selected by a single reference or a list of references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Selection {
  One(ColumnRef),
  Many(Vec<ColumnRef>),
}

impl Selection {
  pub fn refs(&self) -> Vec<ColumnRef> {
    match self {
      Self::One(r) => vec![r.clone()],
      Self::Many(refs) => refs.clone(),
    }
  }
}

/// Which columns survive the table filter.
///
/// ```json
/// "column_filter": ["A", "B"]
/// "column_filter": { "exclude": ["Tmp", 3] }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnFilter {
  // Include must come first: a one-element list would also match the
  // struct variant in its sequence form.
  Include(Selection),
  Exclude { exclude: Selection },
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_include_list() {
    let filter: ColumnFilter = serde_json::from_value(json!(["A", 1])).unwrap();
    match filter {
      ColumnFilter::Include(selection) => assert_eq!(selection.refs().len(), 2),
      other => panic!("expected include filter, got {:?}", other),
    }
  }

  #[test]
  fn test_exclude_object() {
    let filter: ColumnFilter = serde_json::from_value(json!({"exclude": "Tmp"})).unwrap();
    match filter {
      ColumnFilter::Exclude { exclude } => {
        assert_eq!(exclude.refs(), vec![ColumnRef::Name("Tmp".to_string())]);
      }
      other => panic!("expected exclude filter, got {:?}", other),
    }
  }

  #[test]
  fn test_row_filter_defaults() {
    let filter: RowFilter = serde_json::from_value(json!({"function": "std:not_null"})).unwrap();
    assert!(filter.inputs.is_empty());
    assert!(filter.model.is_none());
  }
}

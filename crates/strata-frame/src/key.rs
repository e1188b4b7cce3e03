use serde_json::{Number, Value};

/// Hashable identity of a tuple of cells.
///
/// Numbers with an integral value compare equal whatever their JSON
/// representation, so `1` and `1.0` produce the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowKey(String);

impl RowKey {
  pub fn new<'a>(cells: impl IntoIterator<Item = &'a Value>) -> Self {
    let normalized: Vec<Value> = cells.into_iter().map(normalize).collect();
    Self(Value::Array(normalized).to_string())
  }

  /// Whether any cell of the key is null. Null keys never match.
  pub fn has_null<'a>(cells: impl IntoIterator<Item = &'a Value>) -> bool {
    cells.into_iter().any(Value::is_null)
  }
}

fn normalize(value: &Value) -> Value {
  match value {
    Value::Number(n) => match n.as_f64() {
      Some(f) if f.fract() == 0.0 && f.abs() < 9.0e15 => Value::Number(Number::from(f as i64)),
      _ => value.clone(),
    },
    Value::Array(items) => Value::Array(items.iter().map(normalize).collect()),
    _ => value.clone(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_integral_numbers_share_a_key() {
    assert_eq!(RowKey::new(&[json!(1)]), RowKey::new(&[json!(1.0)]));
    assert_ne!(RowKey::new(&[json!(1)]), RowKey::new(&[json!(1.5)]));
  }

  #[test]
  fn test_strings_and_numbers_differ() {
    assert_ne!(RowKey::new(&[json!("1")]), RowKey::new(&[json!(1)]));
  }

  #[test]
  fn test_has_null() {
    assert!(RowKey::has_null(&[json!("a"), Value::Null]));
    assert!(!RowKey::has_null(&[json!("a"), json!(0)]));
  }
}

use serde_json::{Number, Value};

use crate::error::TransformError;

/// The items of an array argument, or the argument itself.
pub(crate) fn items(argument: &Value) -> Vec<&Value> {
  match argument {
    Value::Array(items) => items.iter().collect(),
    other => vec![other],
  }
}

/// Numeric view of a cell. Null reads as `None`; other non-numbers fail.
pub(crate) fn number(value: &Value) -> Result<Option<f64>, TransformError> {
  match value {
    Value::Null => Ok(None),
    Value::Number(n) => Ok(n.as_f64()),
    Value::Bool(b) => Ok(Some(if *b { 1.0 } else { 0.0 })),
    other => Err(TransformError::failed(format!("expected a number, got {}", other))),
  }
}

/// Every non-null number of the argument, flattening row arrays.
pub(crate) fn numbers(argument: &Value) -> Result<Vec<f64>, TransformError> {
  let mut out = Vec::new();
  for item in items(argument) {
    match item {
      Value::Array(cells) => {
        for cell in cells {
          out.extend(number(cell)?);
        }
      }
      cell => out.extend(number(cell)?),
    }
  }
  Ok(out)
}

/// Whether every number in the argument is an integer.
pub(crate) fn all_integers(argument: &Value) -> bool {
  items(argument).into_iter().all(|item| match item {
    Value::Number(n) => n.is_i64() || n.is_u64(),
    Value::Array(cells) => cells.iter().all(|c| !matches!(c, Value::Number(n) if n.is_f64())),
    _ => true,
  })
}

/// A JSON number, integral when requested and representable.
pub(crate) fn to_value(n: f64, integral: bool) -> Value {
  if integral && n.fract() == 0.0 && n.abs() < 9.0e15 {
    Value::Number(Number::from(n as i64))
  } else {
    Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
  }
}

/// A numeric model parameter: the model itself when it is a number, or the
/// named field of a model object.
pub(crate) fn parameter(model: Option<&Value>, field: &str) -> Result<Option<f64>, TransformError> {
  match model {
    None | Some(Value::Null) => Ok(None),
    Some(Value::Number(n)) => Ok(n.as_f64()),
    Some(Value::Object(fields)) => match fields.get(field) {
      None | Some(Value::Null) => Ok(None),
      Some(Value::Number(n)) => Ok(n.as_f64()),
      Some(other) => Err(TransformError::invalid_model(format!(
        "'{}' must be a number, got {}",
        field, other
      ))),
    },
    Some(other) => Err(TransformError::invalid_model(format!(
      "expected a number or an object, got {}",
      other
    ))),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_numbers_skip_nulls_and_flatten_rows() {
    assert_eq!(numbers(&json!([1, null, [2, 3]])).unwrap(), vec![1.0, 2.0, 3.0]);
    assert_eq!(numbers(&json!(4)).unwrap(), vec![4.0]);
    assert!(numbers(&json!(["x"])).is_err());
  }

  #[test]
  fn test_to_value_keeps_integers() {
    assert_eq!(to_value(3.0, true), json!(3));
    assert_eq!(to_value(3.0, false), json!(3.0));
    assert_eq!(to_value(f64::NAN, false), Value::Null);
  }

  #[test]
  fn test_parameter_forms() {
    assert_eq!(parameter(Some(&json!(2)), "value").unwrap(), Some(2.0));
    assert_eq!(parameter(Some(&json!({"periods": -1})), "periods").unwrap(), Some(-1.0));
    assert_eq!(parameter(Some(&json!({})), "periods").unwrap(), None);
    assert!(parameter(Some(&json!("x")), "periods").is_err());
  }
}

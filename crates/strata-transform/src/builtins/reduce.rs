//! Reducers: a window, a group or a whole column to one value.

use std::cmp::Ordering;

use serde_json::Value;

use super::numeric::{all_integers, items, number, numbers, to_value};
use crate::error::TransformError;

pub(crate) fn sum(argument: &Value, _model: Option<&Value>) -> Result<Value, TransformError> {
  let total: f64 = numbers(argument)?.iter().sum();
  Ok(to_value(total, all_integers(argument)))
}

pub(crate) fn mean(argument: &Value, _model: Option<&Value>) -> Result<Value, TransformError> {
  let values = numbers(argument)?;
  if values.is_empty() {
    return Ok(Value::Null);
  }
  let total: f64 = values.iter().sum();
  Ok(to_value(total / values.len() as f64, false))
}

pub(crate) fn min(argument: &Value, _model: Option<&Value>) -> Result<Value, TransformError> {
  extreme(argument, Ordering::Less)
}

pub(crate) fn max(argument: &Value, _model: Option<&Value>) -> Result<Value, TransformError> {
  extreme(argument, Ordering::Greater)
}

fn extreme(argument: &Value, wanted: Ordering) -> Result<Value, TransformError> {
  let mut best: Option<(f64, &Value)> = None;
  for item in items(argument) {
    let Some(n) = number(item)? else {
      continue;
    };
    let better = match best {
      Some((current, _)) => n.partial_cmp(&current) == Some(wanted),
      None => true,
    };
    if better {
      best = Some((n, item));
    }
  }
  Ok(best.map(|(_, v)| v.clone()).unwrap_or(Value::Null))
}

/// Number of non-null items.
pub(crate) fn count(argument: &Value, _model: Option<&Value>) -> Result<Value, TransformError> {
  let n = items(argument).into_iter().filter(|v| !v.is_null()).count();
  Ok(Value::from(n))
}

pub(crate) fn first(argument: &Value, _model: Option<&Value>) -> Result<Value, TransformError> {
  Ok(
    items(argument)
      .into_iter()
      .find(|v| !v.is_null())
      .cloned()
      .unwrap_or(Value::Null),
  )
}

pub(crate) fn last(argument: &Value, _model: Option<&Value>) -> Result<Value, TransformError> {
  Ok(
    items(argument)
      .into_iter()
      .rev()
      .find(|v| !v.is_null())
      .cloned()
      .unwrap_or(Value::Null),
  )
}

/// Mean of the first value of every row weighted by the second.
pub(crate) fn mean_weighted(
  argument: &Value,
  _model: Option<&Value>,
) -> Result<Value, TransformError> {
  let mut products = 0.0;
  let mut weights = 0.0;
  for row in items(argument) {
    let Value::Array(cells) = row else {
      return Err(TransformError::failed(
        "mean_weighted expects rows of (value, weight)",
      ));
    };
    let (Some(value), Some(weight)) = (
      cells.first().map(number).transpose()?.flatten(),
      cells.get(1).map(number).transpose()?.flatten(),
    ) else {
      continue;
    };
    products += value * weight;
    weights += weight;
  }
  if weights == 0.0 {
    return Ok(Value::Null);
  }
  Ok(to_value(products / weights, false))
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_sum_keeps_integer_type() {
    assert_eq!(sum(&json!([1, 2]), None).unwrap(), json!(3));
    assert_eq!(sum(&json!([1.0, 2.0]), None).unwrap(), json!(3.0));
    assert_eq!(sum(&json!([]), None).unwrap(), json!(0));
  }

  #[test]
  fn test_mean_of_nothing_is_null() {
    assert_eq!(mean(&json!([]), None).unwrap(), Value::Null);
    assert_eq!(mean(&json!([1, 2]), None).unwrap(), json!(1.5));
  }

  #[test]
  fn test_min_max_skip_nulls() {
    assert_eq!(min(&json!([3, null, 1, 2]), None).unwrap(), json!(1));
    assert_eq!(max(&json!([3, null, 1, 2]), None).unwrap(), json!(3));
    assert_eq!(max(&json!([null]), None).unwrap(), Value::Null);
  }

  #[test]
  fn test_count_first_last() {
    let values = json!([null, "a", "b", null]);
    assert_eq!(count(&values, None).unwrap(), json!(2));
    assert_eq!(first(&values, None).unwrap(), json!("a"));
    assert_eq!(last(&values, None).unwrap(), json!("b"));
  }

  #[test]
  fn test_mean_weighted() {
    let rows = json!([[1.0, 1.0], [3.0, 3.0]]);
    assert_eq!(mean_weighted(&rows, None).unwrap(), json!(2.5));
    assert_eq!(mean_weighted(&json!([]), None).unwrap(), Value::Null);
    assert!(mean_weighted(&json!([1.0]), None).is_err());
  }
}

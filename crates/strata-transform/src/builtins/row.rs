//! Row functions and column transforms.

use serde_json::Value;

use super::numeric::{items, number, parameter, to_value};
use crate::error::TransformError;

/// Convert a cell to a floating point number. Strings are parsed.
pub(crate) fn float(argument: &Value, _model: Option<&Value>) -> Result<Value, TransformError> {
  let n = match argument {
    Value::String(s) => Some(
      s.trim()
        .parse::<f64>()
        .map_err(|_| TransformError::failed(format!("cannot convert '{}' to float", s)))?,
    ),
    other => number(other)?,
  };
  Ok(n.map(|n| to_value(n, false)).unwrap_or(Value::Null))
}

/// Sum of the row cells plus the optional `value` model parameter.
/// Any null cell makes the result null.
pub(crate) fn add(argument: &Value, model: Option<&Value>) -> Result<Value, TransformError> {
  let offset = parameter(model, "value")?;
  let mut total = offset.unwrap_or(0.0);
  let mut integral = offset.is_none_or(|o| o.fract() == 0.0);
  for cell in items(argument) {
    let Some(n) = number(cell)? else {
      return Ok(Value::Null);
    };
    integral &= cell.is_i64() || cell.is_u64();
    total += n;
  }
  Ok(to_value(total, integral))
}

/// Whether every cell of the row is present.
pub(crate) fn not_null(argument: &Value, _model: Option<&Value>) -> Result<Value, TransformError> {
  Ok(Value::Bool(items(argument).iter().all(|v| !v.is_null())))
}

/// `a > b` for a row `[a, b]`, or `a > threshold` for a single cell where the
/// threshold is the `value` model parameter (0 by default). Nulls compare false.
pub(crate) fn gt(argument: &Value, model: Option<&Value>) -> Result<Value, TransformError> {
  let (left, right) = match argument {
    Value::Array(cells) if cells.len() == 2 => (number(&cells[0])?, number(&cells[1])?),
    Value::Array(cells) => {
      return Err(TransformError::failed(format!(
        "gt expects one or two inputs, got {}",
        cells.len()
      )));
    }
    cell => (number(cell)?, Some(parameter(model, "value")?.unwrap_or(0.0))),
  };
  Ok(Value::Bool(matches!((left, right), (Some(l), Some(r)) if l > r)))
}

/// Shift a whole column by `periods` rows (1 by default). Negative periods
/// shift towards the start. Vacated cells are null.
pub(crate) fn shift(argument: &Value, model: Option<&Value>) -> Result<Value, TransformError> {
  let Value::Array(cells) = argument else {
    return Err(TransformError::failed("shift expects a whole column"));
  };
  let periods = parameter(model, "periods")?.unwrap_or(1.0);
  if periods.fract() != 0.0 {
    return Err(TransformError::invalid_model("periods must be an integer"));
  }
  let periods = periods as i64;
  let len = cells.len() as i64;
  let shifted = (0..len)
    .map(|i| {
      let source = i - periods;
      if (0..len).contains(&source) {
        cells[source as usize].clone()
      } else {
        Value::Null
      }
    })
    .collect();
  Ok(Value::Array(shifted))
}

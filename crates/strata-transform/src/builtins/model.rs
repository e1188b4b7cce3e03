//! Standard scaling: a training function and the matching row function.

use serde_json::{Value, json};
use strata_frame::Frame;

use super::numeric::{number, numbers, parameter, to_value};
use crate::error::TransformError;

/// Learn the mean and standard deviation of the first data column.
pub(crate) fn fit_scale(
  data: &Frame,
  _labels: Option<&Frame>,
  _hyperparameters: Option<&Value>,
) -> Result<Value, TransformError> {
  let (_, cells) = data
    .column_at(0)
    .ok_or_else(|| TransformError::failed("fit_scale needs one input column"))?;
  let values = numbers(&Value::Array(cells.to_vec()))?;
  if values.is_empty() {
    return Err(TransformError::failed("fit_scale needs at least one value"));
  }
  let n = values.len() as f64;
  let mean = values.iter().sum::<f64>() / n;
  let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
  Ok(json!({ "mean": mean, "std": variance.sqrt() }))
}

/// `(x - mean) / std` with the parameters of a `fit_scale` model.
pub(crate) fn scale(argument: &Value, model: Option<&Value>) -> Result<Value, TransformError> {
  let mean = parameter(model, "mean")?
    .ok_or_else(|| TransformError::invalid_model("scale needs a 'mean'"))?;
  let std = parameter(model, "std")?.unwrap_or(1.0);
  let Some(x) = number(argument)? else {
    return Ok(Value::Null);
  };
  let centered = x - mean;
  let scaled = if std == 0.0 { centered } else { centered / std };
  Ok(to_value(scaled, false))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_fit_then_scale() {
    let data = Frame::from_columns(vec![("A", vec![json!(1), json!(3)])]).unwrap();
    let model = fit_scale(&data, None, None).unwrap();
    assert_eq!(model, json!({"mean": 2.0, "std": 1.0}));

    assert_eq!(scale(&json!(3), Some(&model)).unwrap(), json!(1.0));
    assert_eq!(scale(&Value::Null, Some(&model)).unwrap(), Value::Null);
  }

  #[test]
  fn test_scale_requires_model() {
    assert!(matches!(
      scale(&json!(1), None),
      Err(TransformError::InvalidModel { .. })
    ));
  }
}

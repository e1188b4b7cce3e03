use serde_json::{Map, Value};
use strata_config::Scope;
use strata_frame::Frame;

use crate::callable::{Callable, ValueFn};
use crate::error::TransformError;

/// Applies resolved callables to table data.
///
/// Results of [`TransformEngine::apply`] are frames with one column per
/// produced output. Array-shaped results name their columns by position
/// (`"0"`, `"1"`, ...); object-shaped results keep the object keys. The
/// caller renames them to the declared output names.
pub trait TransformEngine: Send + Sync {
  /// Apply a function to the selected input columns with the given scope.
  fn apply(
    &self,
    callable: &Callable,
    data: &Frame,
    model: Option<&Value>,
    scope: Scope,
  ) -> Result<Frame, TransformError>;

  /// Build a table from the data of its input tables.
  fn apply_tables(
    &self,
    callable: &Callable,
    inputs: &[Frame],
    model: Option<&Value>,
  ) -> Result<Frame, TransformError>;

  /// Reduce a group of rows to a single value.
  fn reduce(
    &self,
    callable: &Callable,
    group: &Frame,
    model: Option<&Value>,
  ) -> Result<Value, TransformError>;

  /// Produce a model from training data.
  fn train(
    &self,
    callable: &Callable,
    data: &Frame,
    labels: Option<&Frame>,
    hyperparameters: Option<&Value>,
  ) -> Result<Value, TransformError>;
}

/// Default application semantics.
///
/// | scope     | argument passed to a value function                         |
/// |-----------|-------------------------------------------------------------|
/// | one       | the cell (one input) or the row as an array                 |
/// | window(n) | the last `n` cells or rows; null result while fewer exist   |
/// | all       | the column as an array, or an object of named columns       |
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardEngine;

impl StandardEngine {
  pub fn new() -> Self {
    Self
  }

  fn value_fn(callable: &Callable) -> Result<&ValueFn, TransformError> {
    match callable {
      Callable::Value(f) => Ok(f.as_ref()),
      other => Err(TransformError::WrongCallable {
        expected: "value",
        actual: other.kind(),
      }),
    }
  }

  fn apply_rows(
    &self,
    callable: &Callable,
    data: &Frame,
    model: Option<&Value>,
    window: usize,
  ) -> Result<Frame, TransformError> {
    let f = Self::value_fn(callable)?;
    let mut results = Vec::with_capacity(data.row_count());
    for row in 0..data.row_count() {
      if row + 1 < window {
        results.push(Value::Null);
        continue;
      }
      let argument = if window == 1 {
        row_argument(data, row)
      } else {
        let start = row + 1 - window;
        Value::Array((start..=row).map(|r| row_argument(data, r)).collect())
      };
      results.push(f(&argument, model)?);
    }
    spread(results)
  }

  fn apply_all(
    &self,
    callable: &Callable,
    data: &Frame,
    model: Option<&Value>,
  ) -> Result<Frame, TransformError> {
    let rows = data.row_count();
    match callable {
      Callable::Frame(f) => {
        let result = f(std::slice::from_ref(data), model)?;
        if result.row_count() != rows {
          return Err(TransformError::ShapeMismatch {
            expected: rows,
            actual: result.row_count(),
          });
        }
        Ok(result)
      }
      Callable::Value(f) => {
        let argument = if data.column_count() == 1 {
          Value::Array(data.column_at(0).map(|(_, c)| c.to_vec()).unwrap_or_default())
        } else {
          let mut columns = Map::new();
          for (name, cells) in data.columns() {
            columns.insert(name.to_string(), Value::Array(cells.to_vec()));
          }
          Value::Object(columns)
        };
        whole_result(f(&argument, model)?, rows)
      }
      other => Err(TransformError::WrongCallable {
        expected: "value or frame",
        actual: other.kind(),
      }),
    }
  }
}

impl TransformEngine for StandardEngine {
  fn apply(
    &self,
    callable: &Callable,
    data: &Frame,
    model: Option<&Value>,
    scope: Scope,
  ) -> Result<Frame, TransformError> {
    match scope {
      Scope::One => self.apply_rows(callable, data, model, 1),
      Scope::Window(size) => self.apply_rows(callable, data, model, size),
      Scope::All => self.apply_all(callable, data, model),
    }
  }

  fn apply_tables(
    &self,
    callable: &Callable,
    inputs: &[Frame],
    model: Option<&Value>,
  ) -> Result<Frame, TransformError> {
    match callable {
      Callable::Frame(f) => f(inputs, model),
      other => Err(TransformError::WrongCallable {
        expected: "frame",
        actual: other.kind(),
      }),
    }
  }

  fn reduce(
    &self,
    callable: &Callable,
    group: &Frame,
    model: Option<&Value>,
  ) -> Result<Value, TransformError> {
    let f = Self::value_fn(callable)?;
    f(&group_argument(group), model)
  }

  fn train(
    &self,
    callable: &Callable,
    data: &Frame,
    labels: Option<&Frame>,
    hyperparameters: Option<&Value>,
  ) -> Result<Value, TransformError> {
    match callable {
      Callable::Train(f) => f(data, labels, hyperparameters),
      other => Err(TransformError::WrongCallable {
        expected: "train",
        actual: other.kind(),
      }),
    }
  }
}

/// The cell of a single-column frame, otherwise the row as an array.
fn row_argument(data: &Frame, row: usize) -> Value {
  let cells = data.row(row).unwrap_or_default();
  if cells.len() == 1 {
    cells[0].clone()
  } else {
    Value::Array(cells.into_iter().cloned().collect())
  }
}

/// Every row of a group: cells for a single column, row arrays otherwise.
pub(crate) fn group_argument(group: &Frame) -> Value {
  Value::Array((0..group.row_count()).map(|r| row_argument(group, r)).collect())
}

/// Turn per-row results into output columns. Array results spread into one
/// column per element; null results fill every column.
fn spread(results: Vec<Value>) -> Result<Frame, TransformError> {
  let rows = results.len();
  let width = results
    .iter()
    .find_map(|v| match v {
      Value::Null => None,
      Value::Array(items) => Some(items.len()),
      _ => Some(1),
    })
    .unwrap_or(1);

  let mut columns: Vec<Vec<Value>> = vec![Vec::with_capacity(rows); width];
  for value in results {
    match value {
      Value::Null => columns.iter_mut().for_each(|c| c.push(Value::Null)),
      Value::Array(items) if items.len() == width => {
        for (column, item) in columns.iter_mut().zip(items) {
          column.push(item);
        }
      }
      Value::Array(items) => {
        return Err(TransformError::failed(format!(
          "row result has {} values, expected {}",
          items.len(),
          width
        )));
      }
      scalar if width == 1 => columns[0].push(scalar),
      _ => {
        return Err(TransformError::failed(format!(
          "row result has 1 value, expected {}",
          width
        )));
      }
    }
  }

  let mut frame = Frame::with_rows(rows);
  for (i, cells) in columns.into_iter().enumerate() {
    frame.set_column(i.to_string(), cells)?;
  }
  Ok(frame)
}

/// Turn a whole-input result into output columns. Scalars are broadcast.
fn whole_result(result: Value, rows: usize) -> Result<Frame, TransformError> {
  let mut frame = Frame::with_rows(rows);
  match result {
    Value::Array(cells) => {
      if cells.len() != rows {
        return Err(TransformError::ShapeMismatch {
          expected: rows,
          actual: cells.len(),
        });
      }
      frame.set_column("0", cells)?;
    }
    Value::Object(columns) => {
      for (name, cells) in columns {
        let Value::Array(cells) = cells else {
          return Err(TransformError::failed(format!(
            "result column '{}' is not an array",
            name
          )));
        };
        if cells.len() != rows {
          return Err(TransformError::ShapeMismatch {
            expected: rows,
            actual: cells.len(),
          });
        }
        frame.set_column(name, cells)?;
      }
    }
    scalar => frame.set_column("0", vec![scalar; rows])?,
  }
  Ok(frame)
}

//! Table functions: `std:join` and `std:aggregate`.

use std::collections::HashMap;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use strata_config::Names;
use strata_frame::{Frame, FrameError, RowKey};
use tracing::debug;

use super::reducer;
use crate::engine::group_argument;
use crate::error::TransformError;

#[derive(Debug, Default, Deserialize)]
struct JoinModel {
  /// Key columns per input table. A missing entry joins by row position.
  #[serde(default)]
  keys: Vec<Option<Names>>,
  /// Suffixes per input table for column names present on both sides.
  #[serde(default)]
  suffixes: Vec<Option<String>>,
}

#[derive(Debug, Deserialize)]
struct AggregateModel {
  keys: Names,
  #[serde(default)]
  aggregations: Vec<Aggregation>,
}

#[derive(Debug, Deserialize)]
struct Aggregation {
  id: Option<String>,
  #[serde(default)]
  outputs: Names,
  function: String,
  #[serde(default)]
  inputs: Names,
}

fn parse_model<T: DeserializeOwned + Default>(model: Option<&Value>) -> Result<T, TransformError> {
  match model {
    None | Some(Value::Null) => Ok(T::default()),
    Some(value) => {
      serde_json::from_value(value.clone()).map_err(|e| TransformError::invalid_model(e.to_string()))
    }
  }
}

fn key_names(entry: Option<&Option<Names>>) -> Option<&Names> {
  entry.and_then(Option::as_ref).filter(|names| !names.is_empty())
}

/// Left outer join of every other input onto the first one.
///
/// Each input is matched either by its key columns or by row position. Key
/// columns of the right side are dropped when both sides join by keys. A
/// left row with several matches appears once per match.
pub(crate) fn join(inputs: &[Frame], model: Option<&Value>) -> Result<Frame, TransformError> {
  let (main, others) = inputs
    .split_first()
    .ok_or_else(|| TransformError::failed("join needs at least one input table"))?;
  let model: JoinModel = parse_model(model)?;

  let left_keys = key_names(model.keys.first());
  let main_suffix = model.suffixes.first().cloned().flatten().unwrap_or_default();

  let mut result = main.clone();
  for (offset, right) in others.iter().enumerate() {
    let index = offset + 1;
    let right_keys = key_names(model.keys.get(index));
    let right_suffix = model
      .suffixes
      .get(index)
      .cloned()
      .flatten()
      .unwrap_or_else(|| format!("_{}", index));

    let pairs = match_rows(&result, left_keys, right, right_keys)?;
    debug!(
      left_rows = result.row_count(),
      right_rows = right.row_count(),
      joined_rows = pairs.len(),
      "join_matched"
    );

    let left_rows: Vec<usize> = pairs.iter().map(|(l, _)| *l).collect();
    let right_rows: Vec<Option<usize>> = pairs.iter().map(|(_, r)| *r).collect();
    let mut left = result.take_rows(&left_rows)?;
    let mut added = right.take_rows_or_null(&right_rows)?;
    if let (Some(_), Some(keys)) = (left_keys, right_keys) {
      added.drop_columns(keys.as_slice());
    }

    for name in added.column_names().to_vec() {
      if left.contains(&name) {
        if !main_suffix.is_empty() {
          left.rename(&name, format!("{}{}", name, main_suffix))?;
        }
        added.rename(&name, format!("{}{}", name, right_suffix))?;
      }
    }
    for (name, cells) in added.columns() {
      if left.contains(name) {
        return Err(FrameError::DuplicateColumn {
          column: name.to_string(),
        }
        .into());
      }
      left.set_column(name, cells.to_vec())?;
    }
    result = left;
  }
  Ok(result)
}

/// Pairs of (left row, matching right row) in left row order.
fn match_rows(
  left: &Frame,
  left_keys: Option<&Names>,
  right: &Frame,
  right_keys: Option<&Names>,
) -> Result<Vec<(usize, Option<usize>)>, TransformError> {
  let left_positions = left_keys
    .map(|keys| left.positions(keys.as_slice()))
    .transpose()?;
  let left_key_of = |row: usize| -> Option<RowKey> {
    match &left_positions {
      Some(positions) => {
        let cells: Vec<&Value> = positions.iter().map(|p| &cells_at(left, *p)[row]).collect();
        (!RowKey::has_null(cells.iter().copied())).then(|| RowKey::new(cells))
      }
      None => Some(RowKey::new(&[Value::from(row)])),
    }
  };

  let mut index: HashMap<RowKey, Vec<usize>> = HashMap::new();
  match right_keys {
    Some(keys) => {
      let positions = right.positions(keys.as_slice())?;
      for row in 0..right.row_count() {
        let cells: Vec<&Value> = positions.iter().map(|p| &cells_at(right, *p)[row]).collect();
        if !RowKey::has_null(cells.iter().copied()) {
          index.entry(RowKey::new(cells)).or_default().push(row);
        }
      }
    }
    None => {
      for row in 0..right.row_count() {
        index.entry(RowKey::new(&[Value::from(row)])).or_default().push(row);
      }
    }
  }

  let mut pairs = Vec::with_capacity(left.row_count());
  for row in 0..left.row_count() {
    match left_key_of(row).and_then(|key| index.get(&key)) {
      Some(matches) => pairs.extend(matches.iter().map(|m| (row, Some(*m)))),
      None => pairs.push((row, None)),
    }
  }
  Ok(pairs)
}

fn cells_at(frame: &Frame, position: usize) -> &[Value] {
  frame.column_at(position).map(|(_, cells)| cells).unwrap_or_default()
}

/// Group the first input by `keys` and reduce every group with std reducers.
///
/// Groups keep the order in which their key first appears. Rows with a null
/// key belong to no group. An aggregation without inputs counts the rows of
/// each group.
pub(crate) fn aggregate(inputs: &[Frame], model: Option<&Value>) -> Result<Frame, TransformError> {
  let data = inputs
    .first()
    .ok_or_else(|| TransformError::failed("aggregate needs an input table"))?;
  let model: AggregateModel = match model {
    Some(value) => serde_json::from_value(value.clone())
      .map_err(|e| TransformError::invalid_model(e.to_string()))?,
    None => return Err(TransformError::invalid_model("aggregate needs grouping keys")),
  };
  if model.keys.is_empty() {
    return Err(TransformError::invalid_model("aggregate needs grouping keys"));
  }

  let positions = data.positions(model.keys.as_slice())?;
  let mut groups: HashMap<RowKey, usize> = HashMap::new();
  let mut members: Vec<Vec<usize>> = Vec::new();
  for row in 0..data.row_count() {
    let cells: Vec<&Value> = positions.iter().map(|p| &cells_at(data, *p)[row]).collect();
    if RowKey::has_null(cells.iter().copied()) {
      continue;
    }
    let group = *groups.entry(RowKey::new(cells)).or_insert_with(|| {
      members.push(Vec::new());
      members.len() - 1
    });
    members[group].push(row);
  }
  debug!(rows = data.row_count(), groups = members.len(), "aggregate_grouped");

  let firsts: Vec<usize> = members.iter().map(|m| m[0]).collect();
  let mut out = data.select(model.keys.as_slice())?.take_rows(&firsts)?;

  for aggregation in &model.aggregations {
    let name = aggregation
      .outputs
      .first()
      .or(aggregation.id.as_ref())
      .ok_or_else(|| TransformError::invalid_model("aggregation needs an id or outputs"))?
      .clone();
    let f = reducer(&aggregation.function).ok_or_else(|| {
      TransformError::invalid_model(format!(
        "unknown aggregation function '{}'",
        aggregation.function
      ))
    })?;

    let mut cells = Vec::with_capacity(members.len());
    if aggregation.inputs.is_empty() {
      cells.extend(members.iter().map(|m| Value::from(m.len())));
    } else {
      let measures = data.select(aggregation.inputs.as_slice())?;
      for rows in &members {
        let group = measures.take_rows(rows)?;
        cells.push(f(&group_argument(&group), None)?);
      }
    }
    out.set_column(name, cells)?;
  }
  Ok(out)
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn frame(value: Value) -> Frame {
    Frame::from_value(value).unwrap()
  }

  #[test]
  fn test_join_by_position_with_suffixes() {
    let main = frame(json!([{"A": 0}, {"A": 1}, {"A": 2}]));
    let second = frame(json!([{"A": 3}, {"A": 4}, {"A": 5}, {"A": 6}, {"A": 7}]));

    let merged = join(&[main, second], Some(&json!({"suffixes": ["", "_JOINED"]}))).unwrap();
    assert_eq!(merged.column_names(), &["A".to_string(), "A_JOINED".to_string()]);
    assert_eq!(merged.row_count(), 3);
    assert_eq!(merged.column("A_JOINED").unwrap(), &[json!(3), json!(4), json!(5)]);
  }

  #[test]
  fn test_join_by_position_with_fewer_right_rows() {
    let main = frame(json!([{"A": 0}, {"A": 1}, {"A": 2}]));
    let second = frame(json!([{"B": 3}, {"B": 4}]));

    let merged = join(&[main, second], None).unwrap();
    assert_eq!(merged.row_count(), 3);
    assert_eq!(merged.column("B").unwrap(), &[json!(3), json!(4), Value::Null]);
  }

  #[test]
  fn test_join_by_keys_drops_right_key() {
    let main = frame(json!([{"A": "a"}, {"A": "a"}, {"A": "b"}, {"A": "b"}]));
    let second = frame(json!([
      {"B": "a", "C": 1},
      {"B": "b", "C": 2},
      {"B": "c", "C": 3}
    ]));

    let merged = join(&[main, second], Some(&json!({"keys": ["A", "B"]}))).unwrap();
    assert_eq!(merged.column_names(), &["A".to_string(), "C".to_string()]);
    assert_eq!(merged.row_count(), 4);
    assert_eq!(
      merged.column("C").unwrap(),
      &[json!(1), json!(1), json!(2), json!(2)]
    );
  }

  #[test]
  fn test_join_without_inputs() {
    assert!(matches!(join(&[], None), Err(TransformError::Failed { .. })));
  }

  #[test]
  fn test_aggregate_groups_in_order() {
    let facts = frame(json!([
      {"A": "b", "M": 1.0},
      {"A": "a", "M": 2.0},
      {"A": "b", "M": 3.0},
      {"A": null, "M": 9.0}
    ]));
    let model = json!({
      "keys": ["A"],
      "aggregations": [
        {"id": "total", "function": "std:sum", "inputs": ["M"]},
        {"outputs": ["size"], "function": "count"}
      ]
    });

    let out = aggregate(&[facts], Some(&model)).unwrap();
    assert_eq!(out.column("A").unwrap(), &[json!("b"), json!("a")]);
    assert_eq!(out.column("total").unwrap(), &[json!(4.0), json!(2.0)]);
    assert_eq!(out.column("size").unwrap(), &[json!(2), json!(1)]);
  }

  #[test]
  fn test_aggregate_unknown_function() {
    let facts = frame(json!([{"A": 1}]));
    let model = json!({"keys": "A", "aggregations": [{"id": "x", "function": "median"}]});
    assert!(matches!(
      aggregate(&[facts], Some(&model)),
      Err(TransformError::InvalidModel { .. })
    ));
  }
}

use std::collections::HashSet;

use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::FrameError;
use crate::key::RowKey;

/// Named columns of JSON cells, all of the same length.
///
/// A frame without columns still has a row count, so that an empty
/// projection or a freshly linked table keeps its shape.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
  names: Vec<String>,
  columns: Vec<Vec<Value>>,
  rows: usize,
}

impl Frame {
  /// An empty frame with no columns and no rows.
  pub fn new() -> Self {
    Self::default()
  }

  /// A frame with no columns and `rows` rows.
  pub fn with_rows(rows: usize) -> Self {
    Self {
      rows,
      ..Self::default()
    }
  }

  /// Build a frame from `(name, cells)` pairs.
  pub fn from_columns<I, S>(columns: I) -> Result<Self, FrameError>
  where
    I: IntoIterator<Item = (S, Vec<Value>)>,
    S: Into<String>,
  {
    let mut frame = Self::new();
    let mut seen = HashSet::new();
    for (name, cells) in columns {
      let name = name.into();
      if !seen.insert(name.clone()) {
        return Err(FrameError::DuplicateColumn { column: name });
      }
      frame.set_column(name, cells)?;
    }
    Ok(frame)
  }

  /// Build a frame from JSON records (objects). Columns appear in the order
  /// their keys are first seen; keys missing from a record read as null.
  pub fn from_records<I>(records: I) -> Result<Self, FrameError>
  where
    I: IntoIterator<Item = Value>,
  {
    let mut names: Vec<String> = Vec::new();
    let mut columns: Vec<Vec<Value>> = Vec::new();
    let mut rows = 0;

    for (index, record) in records.into_iter().enumerate() {
      let Value::Object(fields) = record else {
        return Err(FrameError::InvalidRecords {
          reason: format!("record {} is not an object", index),
        });
      };
      for (name, value) in fields {
        let position = match names.iter().position(|n| *n == name) {
          Some(position) => position,
          None => {
            names.push(name);
            columns.push(vec![Value::Null; rows]);
            names.len() - 1
          }
        };
        columns[position].push(value);
      }
      rows += 1;
      for column in columns.iter_mut() {
        column.resize(rows, Value::Null);
      }
    }

    Ok(Self {
      names,
      columns,
      rows,
    })
  }

  /// Parse a JSON array of records.
  pub fn from_value(value: Value) -> Result<Self, FrameError> {
    match value {
      Value::Array(records) => Self::from_records(records),
      other => Err(FrameError::InvalidRecords {
        reason: format!("expected an array of records, got {}", type_name(&other)),
      }),
    }
  }

  pub fn row_count(&self) -> usize {
    self.rows
  }

  pub fn column_count(&self) -> usize {
    self.names.len()
  }

  pub fn is_empty(&self) -> bool {
    self.rows == 0 && self.names.is_empty()
  }

  pub fn column_names(&self) -> &[String] {
    &self.names
  }

  pub fn contains(&self, name: &str) -> bool {
    self.position(name).is_some()
  }

  pub fn position(&self, name: &str) -> Option<usize> {
    self.names.iter().position(|n| n == name)
  }

  pub fn column(&self, name: &str) -> Option<&[Value]> {
    self.position(name).map(|i| self.columns[i].as_slice())
  }

  /// Like [`Frame::column`], but a missing column is an error.
  pub fn require(&self, name: &str) -> Result<&[Value], FrameError> {
    self.column(name).ok_or_else(|| FrameError::ColumnNotFound {
      column: name.to_string(),
    })
  }

  pub fn column_at(&self, index: usize) -> Option<(&str, &[Value])> {
    let name = self.names.get(index)?;
    Some((name.as_str(), self.columns[index].as_slice()))
  }

  pub fn columns(&self) -> impl Iterator<Item = (&str, &[Value])> {
    self.names
      .iter()
      .zip(self.columns.iter())
      .map(|(n, c)| (n.as_str(), c.as_slice()))
  }

  pub fn cell(&self, row: usize, name: &str) -> Option<&Value> {
    self.column(name)?.get(row)
  }

  /// The cells of one row, in column order.
  pub fn row(&self, row: usize) -> Option<Vec<&Value>> {
    if row >= self.rows {
      return None;
    }
    Some(self.columns.iter().map(|c| &c[row]).collect())
  }

  /// A new frame with the named columns, in the given order.
  pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<Self, FrameError> {
    let mut frame = Self::with_rows(self.rows);
    for name in names {
      let name = name.as_ref();
      let cells = self.require(name)?.to_vec();
      frame.set_column(name, cells)?;
    }
    Ok(frame)
  }

  /// Replace a column in place or append it.
  ///
  /// On a frame without columns the first column fixes the row count.
  pub fn set_column(&mut self, name: impl Into<String>, cells: Vec<Value>) -> Result<(), FrameError> {
    let name = name.into();
    if self.names.is_empty() {
      self.rows = cells.len();
    } else if cells.len() != self.rows {
      return Err(FrameError::LengthMismatch {
        column: name,
        expected: self.rows,
        actual: cells.len(),
      });
    }

    match self.position(&name) {
      Some(i) => self.columns[i] = cells,
      None => {
        self.names.push(name);
        self.columns.push(cells);
      }
    }
    Ok(())
  }

  /// Set every column of `other` on this frame.
  pub fn merge(&mut self, other: Frame) -> Result<(), FrameError> {
    for (name, cells) in other.names.into_iter().zip(other.columns) {
      self.set_column(name, cells)?;
    }
    Ok(())
  }

  /// Remove the named columns. Unknown names are ignored.
  pub fn drop_columns<S: AsRef<str>>(&mut self, names: &[S]) {
    for name in names {
      if let Some(i) = self.position(name.as_ref()) {
        self.names.remove(i);
        self.columns.remove(i);
      }
    }
  }

  /// Keep the columns at the given positions, in frame order.
  pub fn retain_positions(&mut self, keep: &HashSet<usize>) {
    let mut index = 0;
    self.names.retain(|_| {
      let kept = keep.contains(&index);
      index += 1;
      kept
    });
    let mut index = 0;
    self.columns.retain(|_| {
      let kept = keep.contains(&index);
      index += 1;
      kept
    });
  }

  pub fn rename(&mut self, from: &str, to: impl Into<String>) -> Result<(), FrameError> {
    let to = to.into();
    let i = self.position(from).ok_or_else(|| FrameError::ColumnNotFound {
      column: from.to_string(),
    })?;
    if self.names.iter().enumerate().any(|(j, n)| j != i && *n == to) {
      return Err(FrameError::DuplicateColumn { column: to });
    }
    self.names[i] = to;
    Ok(())
  }

  /// Keep the rows whose mask entry is true.
  pub fn retain_rows(&mut self, mask: &[bool]) -> Result<(), FrameError> {
    if mask.len() != self.rows {
      return Err(FrameError::LengthMismatch {
        column: "<row mask>".to_string(),
        expected: self.rows,
        actual: mask.len(),
      });
    }
    self.apply_mask(mask);
    Ok(())
  }

  fn apply_mask(&mut self, mask: &[bool]) {
    for column in self.columns.iter_mut() {
      let mut keep = mask.iter();
      column.retain(|_| keep.next().copied().unwrap_or(false));
    }
    self.rows = mask.iter().filter(|kept| **kept).count();
  }

  /// A new frame made of the given rows, in the given order.
  pub fn take_rows(&self, rows: &[usize]) -> Result<Self, FrameError> {
    if let Some(&row) = rows.iter().find(|r| **r >= self.rows) {
      return Err(FrameError::RowOutOfRange {
        row,
        rows: self.rows,
      });
    }
    let positions: Vec<Option<usize>> = rows.iter().copied().map(Some).collect();
    self.take_rows_or_null(&positions)
  }

  /// Like [`Frame::take_rows`], but `None` produces a row of nulls.
  pub fn take_rows_or_null(&self, rows: &[Option<usize>]) -> Result<Self, FrameError> {
    let mut columns = Vec::with_capacity(self.columns.len());
    for column in &self.columns {
      let mut cells = Vec::with_capacity(rows.len());
      for row in rows {
        match row {
          Some(r) => cells.push(column.get(*r).cloned().ok_or(FrameError::RowOutOfRange {
            row: *r,
            rows: self.rows,
          })?),
          None => cells.push(Value::Null),
        }
      }
      columns.push(cells);
    }
    Ok(Self {
      names: self.names.clone(),
      columns,
      rows: rows.len(),
    })
  }

  /// The key of one row over the given column positions.
  pub fn row_key(&self, row: usize, positions: &[usize]) -> RowKey {
    RowKey::new(positions.iter().map(|p| &self.columns[*p][row]))
  }

  /// Column positions of the given names.
  pub fn positions<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<usize>, FrameError> {
    names
      .iter()
      .map(|name| {
        self.position(name.as_ref()).ok_or_else(|| FrameError::ColumnNotFound {
          column: name.as_ref().to_string(),
        })
      })
      .collect()
  }

  /// Distinct rows over all columns, in order of first appearance.
  pub fn distinct(&self) -> Self {
    let all: Vec<usize> = (0..self.names.len()).collect();
    let mut seen = HashSet::new();
    let mask: Vec<bool> = (0..self.rows)
      .map(|row| seen.insert(self.row_key(row, &all)))
      .collect();
    let mut frame = self.clone();
    frame.apply_mask(&mask);
    frame
  }

  /// Rows as JSON objects, keys in column order.
  pub fn to_records(&self) -> Vec<Map<String, Value>> {
    (0..self.rows)
      .map(|row| {
        self.names
          .iter()
          .zip(self.columns.iter())
          .map(|(name, column)| (name.clone(), column[row].clone()))
          .collect()
      })
      .collect()
  }

  pub fn to_value(&self) -> Value {
    Value::Array(self.to_records().into_iter().map(Value::Object).collect())
  }
}

fn type_name(value: &Value) -> &'static str {
  match value {
    Value::Null => "null",
    Value::Bool(_) => "a boolean",
    Value::Number(_) => "a number",
    Value::String(_) => "a string",
    Value::Array(_) => "an array",
    Value::Object(_) => "an object",
  }
}

impl Serialize for Frame {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(self.to_records())
  }
}

impl<'de> Deserialize<'de> for Frame {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    let records = Vec::<Value>::deserialize(deserializer)?;
    Frame::from_records(records).map_err(de::Error::custom)
  }
}

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FrameError {
  #[error("column not found: {column}")]
  ColumnNotFound { column: String },

  #[error("column '{column}' has {actual} rows, expected {expected}")]
  LengthMismatch {
    column: String,
    expected: usize,
    actual: usize,
  },

  #[error("duplicate column: {column}")]
  DuplicateColumn { column: String },

  #[error("row {row} out of range for a frame of {rows} rows")]
  RowOutOfRange { row: usize, rows: usize },

  #[error("invalid records: {reason}")]
  InvalidRecords { reason: String },
}

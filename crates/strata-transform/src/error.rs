use strata_frame::FrameError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransformError {
  /// A user or library function reported a failure.
  #[error("function failed: {reason}")]
  Failed { reason: String },

  /// The callable cannot be used for the requested application.
  #[error("expected a {expected} function, got a {actual} function")]
  WrongCallable {
    expected: &'static str,
    actual: &'static str,
  },

  /// The function returned a result whose shape does not fit the table.
  #[error("function result has {actual} rows, expected {expected}")]
  ShapeMismatch { expected: usize, actual: usize },

  #[error("invalid model: {reason}")]
  InvalidModel { reason: String },

  #[error(transparent)]
  Frame(#[from] FrameError),
}

impl TransformError {
  pub fn failed(reason: impl Into<String>) -> Self {
    Self::Failed {
      reason: reason.into(),
    }
  }

  pub fn invalid_model(reason: impl Into<String>) -> Self {
    Self::InvalidModel {
      reason: reason.into(),
    }
  }
}

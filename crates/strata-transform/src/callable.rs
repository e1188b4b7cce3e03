use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use strata_frame::Frame;

use crate::error::TransformError;

/// Maps one argument (a cell, a row, a window or a whole column) to a value.
pub type ValueFn = dyn Fn(&Value, Option<&Value>) -> Result<Value, TransformError> + Send + Sync;

/// Builds a frame from input frames.
pub type FrameFn = dyn Fn(&[Frame], Option<&Value>) -> Result<Frame, TransformError> + Send + Sync;

/// Produces a model from training data, optional labels and hyperparameters.
pub type TrainFn =
  dyn Fn(&Frame, Option<&Frame>, Option<&Value>) -> Result<Value, TransformError> + Send + Sync;

/// A resolved function, ready to be applied by a transform engine.
#[derive(Clone)]
pub enum Callable {
  Value(Arc<ValueFn>),
  Frame(Arc<FrameFn>),
  Train(Arc<TrainFn>),
}

impl Callable {
  pub fn value<F>(f: F) -> Self
  where
    F: Fn(&Value, Option<&Value>) -> Result<Value, TransformError> + Send + Sync + 'static,
  {
    Self::Value(Arc::new(f))
  }

  pub fn frame<F>(f: F) -> Self
  where
    F: Fn(&[Frame], Option<&Value>) -> Result<Frame, TransformError> + Send + Sync + 'static,
  {
    Self::Frame(Arc::new(f))
  }

  pub fn train<F>(f: F) -> Self
  where
    F: Fn(&Frame, Option<&Frame>, Option<&Value>) -> Result<Value, TransformError>
      + Send
      + Sync
      + 'static,
  {
    Self::Train(Arc::new(f))
  }

  pub fn kind(&self) -> &'static str {
    match self {
      Self::Value(_) => "value",
      Self::Frame(_) => "frame",
      Self::Train(_) => "train",
    }
  }
}

impl fmt::Debug for Callable {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Callable::{}", self.kind())
  }
}

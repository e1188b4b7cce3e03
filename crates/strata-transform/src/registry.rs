use std::collections::HashMap;

use serde_json::Value;
use strata_frame::Frame;

use crate::builtins;
use crate::callable::Callable;
use crate::error::TransformError;

/// Resolves function references found in workflow definitions.
pub trait FunctionRegistry: Send + Sync {
  /// Look up a function by its reference, e.g. `std:sum`.
  fn resolve(&self, name: &str) -> Option<Callable>;
}

/// In-memory registry of named callables.
#[derive(Debug, Clone, Default)]
pub struct StandardRegistry {
  functions: HashMap<String, Callable>,
}

impl StandardRegistry {
  /// An empty registry.
  pub fn new() -> Self {
    Self::default()
  }

  /// A registry holding the `std:` function library.
  pub fn with_builtins() -> Self {
    let mut registry = Self::new();
    builtins::register(&mut registry);
    registry
  }

  pub fn register(&mut self, name: impl Into<String>, callable: Callable) -> &mut Self {
    self.functions.insert(name.into(), callable);
    self
  }

  pub fn register_value<F>(&mut self, name: impl Into<String>, f: F) -> &mut Self
  where
    F: Fn(&Value, Option<&Value>) -> Result<Value, TransformError> + Send + Sync + 'static,
  {
    self.register(name, Callable::value(f))
  }

  pub fn register_frame<F>(&mut self, name: impl Into<String>, f: F) -> &mut Self
  where
    F: Fn(&[Frame], Option<&Value>) -> Result<Frame, TransformError> + Send + Sync + 'static,
  {
    self.register(name, Callable::frame(f))
  }

  pub fn register_train<F>(&mut self, name: impl Into<String>, f: F) -> &mut Self
  where
    F: Fn(&Frame, Option<&Frame>, Option<&Value>) -> Result<Value, TransformError>
      + Send
      + Sync
      + 'static,
  {
    self.register(name, Callable::train(f))
  }

  pub fn names(&self) -> impl Iterator<Item = &str> {
    self.functions.keys().map(String::as_str)
  }
}

impl FunctionRegistry for StandardRegistry {
  fn resolve(&self, name: &str) -> Option<Callable> {
    self.functions.get(name).cloned()
  }
}

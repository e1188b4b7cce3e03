use thiserror::Error;

/// Errors raised while reading a workflow definition.
#[derive(Debug, Error)]
pub enum ConfigError {
  /// The definition is not valid JSON or does not match the expected shape.
  #[error("malformed workflow definition: {0}")]
  Parse(#[from] serde_json::Error),

  /// A scope (window) value that is neither `one`, `all` nor a positive size.
  #[error("invalid scope '{value}': expected \"one\", \"all\" or a positive window size")]
  InvalidScope { value: String },
}

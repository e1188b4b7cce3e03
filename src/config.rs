//! Runtime configuration loading.
//!
//! Reads `config.toml` from the data directory (`~/.strata/` by default)
//! unless a file is given explicitly:
//!
//! ```toml
//! execution_mode = "parallel"
//! failure_policy = "continue"
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use strata_runtime::RuntimeConfig;

/// Load the runtime configuration.
///
/// - An explicit `path` must exist and parse.
/// - Otherwise `{data_dir}/config.toml` is used when present. A file that
///   fails to parse is reported and the defaults are used instead.
pub async fn load_runtime_config(path: Option<&Path>, data_dir: &Path) -> Result<RuntimeConfig> {
  if let Some(path) = path {
    let content = tokio::fs::read_to_string(path)
      .await
      .with_context(|| format!("failed to read config file: {}", path.display()))?;
    return toml::from_str(&content)
      .with_context(|| format!("failed to parse config file: {}", path.display()));
  }

  let config_path = data_dir.join("config.toml");
  let content = match tokio::fs::read_to_string(&config_path).await {
    Ok(content) => content,
    Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
      tracing::debug!(path = %config_path.display(), "config_not_found");
      return Ok(RuntimeConfig::default());
    }
    Err(err) => {
      return Err(err).with_context(|| format!("failed to read {}", config_path.display()));
    }
  };

  match toml::from_str(&content) {
    Ok(config) => Ok(config),
    Err(err) => {
      tracing::warn!(path = %config_path.display(), error = %err, "config_invalid");
      Ok(RuntimeConfig::default())
    }
  }
}

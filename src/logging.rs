//! Tracing subscriber setup for the command line.

use anyhow::{Result, anyhow};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const DEFAULT_FILTER: &str = "warn";

/// Install a `fmt` layer writing to stderr.
///
/// `level` takes precedence over `RUST_LOG`; without either only warnings
/// and errors are shown.
pub fn init_tracing(level: Option<&str>) -> Result<()> {
  let env_filter = match level {
    Some(level) => EnvFilter::try_new(level)?,
    None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)),
  };

  let fmt_layer = tracing_subscriber::fmt::layer()
    .with_target(true)
    .with_writer(std::io::stderr);

  tracing_subscriber::registry()
    .with(env_filter)
    .with(fmt_layer)
    .try_init()
    .map_err(|e| anyhow!("failed to install tracing subscriber: {}", e))
}

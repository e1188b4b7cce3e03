mod config;
mod logging;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::{Map, Value};

use strata_config::{ExecutionMode, FailurePolicy};
use strata_frame::Frame;
use strata_runtime::{NodeStatus, WorkflowRuntime};
use strata_transform::{StandardEngine, StandardRegistry};
use strata_workflow::{NodeRole, Workflow};

/// Strata - build and run workflows of derived tables and columns
#[derive(Parser)]
#[command(name = "strata")]
#[command(version, about, long_about = None)]
struct Cli {
  /// Path to the data directory (default: ~/.strata)
  #[arg(long, global = true)]
  data_dir: Option<PathBuf>,

  /// Log filter, e.g. `info` or `strata_runtime=debug` (overrides RUST_LOG)
  #[arg(long, global = true)]
  log_level: Option<String>,

  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
  /// Print the layered execution plan of a workflow
  Plan {
    /// Path to the workflow file (JSON)
    workflow_file: PathBuf,
  },

  /// Run a workflow and print the data of every table
  Run {
    /// Path to the workflow file (JSON)
    workflow_file: PathBuf,

    /// Seed a table from a JSON file of records, as TABLE=FILE
    #[arg(long = "data", value_parser = parse_seed)]
    data: Vec<(String, PathBuf)>,

    /// Run the tables of each layer on parallel workers
    #[arg(long)]
    parallel: bool,

    /// Keep going after a failed node, skipping what depends on it
    #[arg(long)]
    keep_going: bool,

    /// Runtime configuration file (default: <data-dir>/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,
  },
}

fn parse_seed(s: &str) -> Result<(String, PathBuf), String> {
  match s.split_once('=') {
    Some((table, file)) if !table.is_empty() && !file.is_empty() => {
      Ok((table.to_string(), PathBuf::from(file)))
    }
    _ => Err(format!("expected TABLE=FILE, got '{}'", s)),
  }
}

fn main() -> Result<()> {
  let cli = Cli::parse();
  logging::init_tracing(cli.log_level.as_deref())?;

  let data_dir = match cli.data_dir {
    Some(dir) => dir,
    None => dirs::home_dir()
      .context("could not determine home directory")?
      .join(".strata"),
  };

  match cli.command {
    Some(Commands::Plan { workflow_file }) => plan(&workflow_file),
    Some(Commands::Run {
      workflow_file,
      data,
      parallel,
      keep_going,
      config: config_file,
    }) => {
      let rt = tokio::runtime::Runtime::new()?;
      rt.block_on(async {
        let mut runtime_config = config::load_runtime_config(config_file.as_deref(), &data_dir).await?;
        if parallel {
          runtime_config.execution_mode = ExecutionMode::Parallel;
        }
        if keep_going {
          runtime_config.failure_policy = FailurePolicy::Continue;
        }
        run(&workflow_file, &data, runtime_config).await
      })
    }
    None => {
      println!("strata - use --help to see available commands");
      Ok(())
    }
  }
}

fn load_workflow(workflow_file: &Path) -> Result<Workflow> {
  let content = std::fs::read_to_string(workflow_file)
    .with_context(|| format!("failed to read workflow file: {}", workflow_file.display()))?;
  Workflow::from_json(&content)
    .with_context(|| format!("failed to build workflow: {}", workflow_file.display()))
}

#[derive(Serialize)]
struct PlannedNode {
  table: String,
  node: String,
  role: &'static str,
}

fn plan(workflow_file: &Path) -> Result<()> {
  let workflow = load_workflow(workflow_file)?;

  let layers: Vec<Vec<PlannedNode>> = workflow
    .plan()
    .layers()
    .iter()
    .map(|layer| {
      layer
        .nodes()
        .iter()
        .map(|node| PlannedNode {
          table: workflow.tables()[node.table].id.clone(),
          node: workflow.node_name(*node),
          role: match node.role {
            NodeRole::Table => "table",
            NodeRole::Column(_) => "column",
            NodeRole::Filter => "filter",
          },
        })
        .collect()
    })
    .collect();

  println!("{}", serde_json::to_string_pretty(&layers)?);
  Ok(())
}

async fn run(
  workflow_file: &Path,
  seeds: &[(String, PathBuf)],
  config: strata_runtime::RuntimeConfig,
) -> Result<()> {
  let workflow = load_workflow(workflow_file)?;
  eprintln!(
    "Loaded workflow: {} ({} tables, {} layers)",
    workflow.id(),
    workflow.tables().len(),
    workflow.plan().len()
  );

  let runtime = WorkflowRuntime::new(
    workflow,
    Arc::new(StandardRegistry::with_builtins()),
    Arc::new(StandardEngine),
    config,
  );

  for (table, file) in seeds {
    let content = tokio::fs::read_to_string(file)
      .await
      .with_context(|| format!("failed to read data file: {}", file.display()))?;
    let data: Frame = serde_json::from_str(&content)
      .with_context(|| format!("failed to parse data file: {}", file.display()))?;
    runtime
      .set_table_data(table, data)
      .with_context(|| format!("failed to seed table '{}'", table))?;
  }

  let result = runtime
    .execute_workflow()
    .wait()
    .await
    .context("workflow execution failed")?;

  eprintln!("Execution completed: {}", result.execution_id);

  let output: Map<String, Value> = runtime
    .workflow()
    .tables()
    .iter()
    .map(|table| {
      let data = runtime.table_data(&table.id).unwrap_or_default();
      (table.id.clone(), data.to_value())
    })
    .collect();
  println!("{}", serde_json::to_string_pretty(&output)?);

  for outcome in &result.outcomes {
    match &outcome.status {
      NodeStatus::Failed { error } => eprintln!("failed: {} ({})", outcome.node, error),
      NodeStatus::Skipped => eprintln!("skipped: {}", outcome.node),
      NodeStatus::Completed => {}
    }
  }
  let failed = result.failed().count();
  if failed > 0 {
    bail!("{} node(s) failed", failed);
  }
  Ok(())
}

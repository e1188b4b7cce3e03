//! Workflow runtime for strata.
//!
//! This crate executes the layered plan of a built workflow against the data
//! of its tables.
//!
//! # Architecture
//!
//! ```text
//! WorkflowRuntime
//! ├── new(workflow, registry, engine, config)
//! ├── set_table_data(table, frame) / table_data(table)
//! └── execute_workflow() -> WorkflowExecution
//!
//! WorkflowExecution
//! └── wait() - layer by layer, each node runs its action:
//!     ├── table  -> populate
//!     ├── column -> evaluate every family member
//!     └── filter -> row filter, excluded columns, column filter
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use strata_runtime::{RuntimeConfig, WorkflowRuntime};
//! use strata_transform::{StandardEngine, StandardRegistry};
//!
//! let runtime = WorkflowRuntime::new(
//!     workflow,
//!     Arc::new(StandardRegistry::with_builtins()),
//!     Arc::new(StandardEngine),
//!     RuntimeConfig::default(),
//! );
//! runtime.set_table_data("Facts", facts)?;
//!
//! let result = runtime.execute_workflow().wait().await?;
//! let groups = runtime.table_data("Groups");
//! ```

mod actions;
mod error;
mod execution;
mod runtime;
mod store;

pub use error::{ActionError, RuntimeError};
pub use execution::{NodeOutcome, NodeStatus, WorkflowExecution, WorkflowResult};
pub use runtime::{RuntimeConfig, WorkflowRuntime};

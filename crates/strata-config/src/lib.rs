//! Strata Config
//!
//! This crate contains the serializable workflow definition types for strata.
//! These types represent workflow definitions before they are built into a
//! scheduled workflow by `strata-workflow`.
//!
//! Definitions are usually loaded from JSON:
//!
//! ```json
//! {
//!   "id": "sales",
//!   "tables": [
//!     {
//!       "id": "Facts",
//!       "columns": [
//!         { "id": "Total", "function": "std:add", "inputs": ["Price", "Tax"] }
//!       ]
//!     }
//!   ]
//! }
//! ```
//!
//! Every definition keeps unknown keys out of the typed model, but the raw
//! shape of a column definition is preserved well enough to apply
//! `extensions` overrides (see [`ColumnDef::to_map`]).

mod column;
mod enums;
mod error;
mod filter;
mod names;
mod scope;
mod table;
mod workflow;

pub use column::{ColumnDef, TrainDef};
pub use enums::{ColumnOperation, ExecutionMode, FailurePolicy, TableOperation};
pub use error::ConfigError;
pub use filter::{ColumnFilter, RowFilter, Selection};
pub use names::{ColumnRef, Names};
pub use scope::Scope;
pub use table::TableDef;
pub use workflow::WorkflowDef;

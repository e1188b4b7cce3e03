//! Strata Workflow
//!
//! This crate turns a workflow definition from `strata-config` into a built
//! workflow that is ready to be executed layer by layer.
//!
//! Building a workflow:
//! - assigns ids to tables and columns that have none
//! - expands column families into concrete members
//! - classifies every table and column operation once
//! - synthesizes intermediate compose columns
//! - resolves the dependencies of every node by its kind
//! - arranges the nodes into layers where every dependency of a node lies in
//!   an earlier layer

mod compose;
mod error;
mod family;
mod graph;
mod kind;
mod node;
mod resolve;
mod store;
mod table;
mod topology;
mod workflow;

pub use error::BuildError;
pub use family::expand_family;
pub use graph::Graph;
pub use kind::{ColumnKind, TableKind, classify_column, classify_table};
pub use node::{NodeKey, NodeRole};
pub use resolve::{find_compose, project_source};
pub use store::IdCounter;
pub use table::{Column, ColumnMember, Table};
pub use topology::{Layer, Plan};
pub use workflow::Workflow;

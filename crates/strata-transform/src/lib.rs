//! Strata Transform
//!
//! The boundary between the scheduler and user functions:
//!
//! - [`FunctionRegistry`] resolves a function reference to a [`Callable`]
//! - [`TransformEngine`] applies a callable to table data with a scope
//!
//! [`StandardRegistry::with_builtins`] provides the `std:` function library
//! and [`StandardEngine`] the default application semantics.

mod builtins;
mod callable;
mod engine;
mod error;
mod registry;

pub use callable::{Callable, FrameFn, TrainFn, ValueFn};
pub use engine::{StandardEngine, TransformEngine};
pub use error::TransformError;
pub use registry::{FunctionRegistry, StandardRegistry};

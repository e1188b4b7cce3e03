//! The `std:` function library.

mod model;
mod numeric;
mod reduce;
mod row;
mod tables;

use serde_json::Value;

use crate::error::TransformError;
use crate::registry::StandardRegistry;

pub(crate) type Reducer = fn(&Value, Option<&Value>) -> Result<Value, TransformError>;

const PREFIX: &str = "std:";

const REDUCERS: &[(&str, Reducer)] = &[
  ("sum", reduce::sum),
  ("mean", reduce::mean),
  ("min", reduce::min),
  ("max", reduce::max),
  ("count", reduce::count),
  ("first", reduce::first),
  ("last", reduce::last),
  ("mean_weighted", reduce::mean_weighted),
];

const VALUE_FUNCTIONS: &[(&str, Reducer)] = &[
  ("float", row::float),
  ("add", row::add),
  ("not_null", row::not_null),
  ("gt", row::gt),
  ("shift", row::shift),
  ("scale", model::scale),
];

/// A std reducer by name, with or without the `std:` prefix.
pub(crate) fn reducer(name: &str) -> Option<Reducer> {
  let name = name.strip_prefix(PREFIX).unwrap_or(name);
  REDUCERS.iter().find(|(n, _)| *n == name).map(|(_, f)| *f)
}

pub(crate) fn register(registry: &mut StandardRegistry) {
  for (name, f) in REDUCERS.iter().chain(VALUE_FUNCTIONS) {
    let f = *f;
    registry.register_value(format!("{}{}", PREFIX, name), f);
  }
  registry.register_train(format!("{}fit_scale", PREFIX), model::fit_scale);
  registry.register_frame(format!("{}join", PREFIX), tables::join);
  registry.register_frame(format!("{}aggregate", PREFIX), tables::aggregate);
}

//! Operation classification.
//!
//! Every table and every concrete column definition is classified once, when
//! the workflow is built. The result never changes afterwards.

use serde::Serialize;
use strata_config::{ColumnDef, ColumnOperation, Scope, TableDef, TableOperation};

const JOIN_HELPERS: &[&str] = &["std:join", "join"];
const AGGREGATE_HELPERS: &[&str] = &["std:aggregate", "aggregate"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
  Noop,
  Extend,
  All,
  Project,
  Product,
  Join,
  Aggregate,
}

impl TableKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Noop => "noop",
      Self::Extend => "extend",
      Self::All => "all",
      Self::Project => "project",
      Self::Product => "product",
      Self::Join => "join",
      Self::Aggregate => "aggregate",
    }
  }
}

impl From<TableOperation> for TableKind {
  fn from(operation: TableOperation) -> Self {
    match operation {
      TableOperation::Noop => Self::Noop,
      TableOperation::Extend => Self::Extend,
      TableOperation::All => Self::All,
      TableOperation::Project => Self::Project,
      TableOperation::Product => Self::Product,
      TableOperation::Join => Self::Join,
      TableOperation::Aggregate => Self::Aggregate,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ColumnKind {
  /// Function applied to each row.
  Calculate,
  /// Function applied to each window of `window` rows.
  Roll { window: usize },
  /// Function applied to the whole input at once.
  All,
  Link,
  Aggregate,
  Compose,
}

impl ColumnKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Calculate => "calculate",
      Self::Roll { .. } => "roll",
      Self::All => "all",
      Self::Link => "link",
      Self::Aggregate => "aggregate",
      Self::Compose => "compose",
    }
  }

  /// The application scope of a function-applying kind.
  pub fn scope(&self) -> Option<Scope> {
    match self {
      Self::Calculate => Some(Scope::One),
      Self::Roll { window } => Some(Scope::Window(*window)),
      Self::All => Some(Scope::All),
      _ => None,
    }
  }
}

/// Classify a table by its position in the workflow.
///
/// An explicit operation wins. Otherwise a function makes the table `all`,
/// unless it names the join or aggregate helper. Without either, the first
/// table is `noop` and every later one extends its predecessor.
pub fn classify_table(def: &TableDef, position: usize) -> TableKind {
  if let Some(operation) = def.operation {
    return operation.into();
  }
  match def.function.as_deref() {
    Some(f) if JOIN_HELPERS.contains(&f) => TableKind::Join,
    Some(f) if AGGREGATE_HELPERS.contains(&f) => TableKind::Aggregate,
    Some(_) => TableKind::All,
    None if position == 0 => TableKind::Noop,
    None => TableKind::Extend,
  }
}

/// Classify a concrete column definition. An explicit operation wins,
/// otherwise the scope selects among the function-applying kinds.
pub fn classify_column(def: &ColumnDef) -> ColumnKind {
  let scope = def.scope.unwrap_or_default();
  match def.operation {
    Some(ColumnOperation::Calculate) => ColumnKind::Calculate,
    Some(ColumnOperation::Roll) => ColumnKind::Roll {
      window: match scope {
        Scope::Window(size) => size,
        _ => 1,
      },
    },
    Some(ColumnOperation::All) => ColumnKind::All,
    Some(ColumnOperation::Link) => ColumnKind::Link,
    Some(ColumnOperation::Aggregate) => ColumnKind::Aggregate,
    Some(ColumnOperation::Compose) => ColumnKind::Compose,
    None => match scope {
      Scope::One => ColumnKind::Calculate,
      Scope::Window(size) => ColumnKind::Roll { window: size },
      Scope::All => ColumnKind::All,
    },
  }
}

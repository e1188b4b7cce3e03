use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use strata_frame::Frame;
use strata_workflow::Table;

/// Data of every table, each behind its own lock.
///
/// Seeds are the frames supplied by the caller before execution. Every run
/// starts from them, so a workflow can be executed more than once.
#[derive(Debug, Default)]
pub(crate) struct TableStore {
  positions: HashMap<String, usize>,
  seeds: Vec<RwLock<Option<Frame>>>,
  data: Vec<RwLock<Option<Frame>>>,
}

impl TableStore {
  pub(crate) fn new(tables: &[Table]) -> Self {
    Self {
      positions: tables.iter().map(|t| (t.id.clone(), t.position)).collect(),
      seeds: tables.iter().map(|_| RwLock::new(None)).collect(),
      data: tables.iter().map(|_| RwLock::new(None)).collect(),
    }
  }

  pub(crate) fn position(&self, id: &str) -> Option<usize> {
    self.positions.get(id).copied()
  }

  /// Supply the starting data of a table. Also visible before the next run.
  pub(crate) fn seed(&self, position: usize, frame: Frame) {
    *write(&self.seeds[position]) = Some(frame.clone());
    *write(&self.data[position]) = Some(frame);
  }

  pub(crate) fn is_seeded(&self, position: usize) -> bool {
    read(&self.seeds[position]).is_some()
  }

  /// Restore every table to its seed.
  pub(crate) fn reset(&self) {
    for (seed, data) in self.seeds.iter().zip(&self.data) {
      *write(data) = read(seed).clone();
    }
  }

  /// A copy of the current data of a table.
  pub(crate) fn get(&self, position: usize) -> Option<Frame> {
    read(&self.data[position]).clone()
  }

  /// A copy of the current data, or an empty frame.
  pub(crate) fn get_or_empty(&self, position: usize) -> Frame {
    self.get(position).unwrap_or_default()
  }

  pub(crate) fn set(&self, position: usize, frame: Frame) {
    *write(&self.data[position]) = Some(frame);
  }
}

// A panicking action never leaves a frame half written, so poisoned locks
// still hold consistent data.
fn read<T>(lock: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
  lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
  lock.write().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;
  use strata_workflow::Workflow;

  fn store() -> TableStore {
    let workflow = Workflow::from_json(r#"{"tables": [{"id": "A"}, {"id": "B"}]}"#).unwrap();
    TableStore::new(workflow.tables())
  }

  #[test]
  fn test_reset_restores_seeds() {
    let store = store();
    let seed = Frame::from_value(json!([{"x": 1}])).unwrap();
    store.seed(0, seed.clone());
    store.set(0, Frame::new());
    store.set(1, seed.clone());

    store.reset();
    assert_eq!(store.get(0), Some(seed));
    assert_eq!(store.get(1), None);
    assert!(store.is_seeded(0));
    assert!(!store.is_seeded(1));
  }

  #[test]
  fn test_position_by_id() {
    let store = store();
    assert_eq!(store.position("B"), Some(1));
    assert_eq!(store.position("C"), None);
    assert_eq!(store.get_or_empty(1), Frame::new());
  }
}

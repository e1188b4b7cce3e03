//! Name lists that may be written as a single string or as a list.

use std::ops::Deref;

use serde::de::Deserializer;
use serde::{Deserialize, Serialize};

/// A list of column or table names.
///
/// Accepts both `"A"` and `["A", "B"]` when deserializing and always
/// serializes as a list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Names(Vec<String>);

impl Names {
  pub fn new(names: Vec<String>) -> Self {
    Self(names)
  }

  pub fn into_vec(self) -> Vec<String> {
    self.0
  }

  pub fn as_slice(&self) -> &[String] {
    &self.0
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }
}

impl Deref for Names {
  type Target = [String];

  fn deref(&self) -> &Self::Target {
    &self.0
  }
}

impl From<Vec<String>> for Names {
  fn from(names: Vec<String>) -> Self {
    Self(names)
  }
}

impl From<&[&str]> for Names {
  fn from(names: &[&str]) -> Self {
    Self(names.iter().map(|n| n.to_string()).collect())
  }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawNames {
  One(String),
  Many(Vec<String>),
}

impl<'de> Deserialize<'de> for Names {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    Ok(match RawNames::deserialize(deserializer)? {
      RawNames::One(name) => Self(vec![name]),
      RawNames::Many(names) => Self(names),
    })
  }
}

/// A column selected either by name or by position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnRef {
  Index(usize),
  Name(String),
}

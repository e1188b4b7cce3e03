//! Application scope of a column function.
//!
//! The scope is written either as a string or as a number:
//!
//! - `"one"`, `"1"` or `1`: the function sees one row at a time
//! - `"all"`: the function sees the whole input once
//! - `"3"` or `3`: the function sees a rolling window of three rows

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Scope {
  #[default]
  One,
  Window(usize),
  All,
}

impl Scope {
  fn from_size(size: u64, raw: &str) -> Result<Self, ConfigError> {
    match size {
      0 => Err(ConfigError::InvalidScope {
        value: raw.to_string(),
      }),
      1 => Ok(Self::One),
      n => Ok(Self::Window(n as usize)),
    }
  }
}

impl FromStr for Scope {
  type Err = ConfigError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let trimmed = s.trim();
    match trimmed {
      "one" => Ok(Self::One),
      "all" => Ok(Self::All),
      other => {
        let size = other.parse::<u64>().map_err(|_| ConfigError::InvalidScope {
          value: s.to_string(),
        })?;
        Self::from_size(size, s)
      }
    }
  }
}

impl fmt::Display for Scope {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::One => f.write_str("one"),
      Self::All => f.write_str("all"),
      Self::Window(n) => write!(f, "{}", n),
    }
  }
}

impl Serialize for Scope {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    match self {
      Self::Window(n) => serializer.serialize_u64(*n as u64),
      other => serializer.serialize_str(&other.to_string()),
    }
  }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawScope {
  Size(i64),
  Text(String),
}

impl<'de> Deserialize<'de> for Scope {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    match RawScope::deserialize(deserializer)? {
      RawScope::Text(text) => text.parse().map_err(de::Error::custom),
      RawScope::Size(size) if size > 0 => {
        Self::from_size(size as u64, &size.to_string()).map_err(de::Error::custom)
      }
      RawScope::Size(size) => Err(de::Error::custom(ConfigError::InvalidScope {
        value: size.to_string(),
      })),
    }
  }
}

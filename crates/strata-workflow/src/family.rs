//! Column family expansion.
//!
//! A column definition with `extensions` describes one concrete column per
//! extension: the base definition with the extension's keys replaced.
//!
//! ```json
//! {
//!   "id": "sum(A)", "function": "std:sum", "inputs": ["A"],
//!   "extensions": [{"scope": "2"}, {"scope": "3", "outputs": "sum(A)_win3"}]
//! }
//! ```
//!
//! expands to two members writing `sum(A)_0` and `sum(A)_win3`.

use strata_config::{ColumnDef, ConfigError, Names};

/// Expand a column definition into its ordered concrete definitions.
///
/// Members never carry `extensions`. When a family has more than one member,
/// a member without explicit outputs writes to `<id>_<index>`.
pub fn expand_family(def: &ColumnDef) -> Result<Vec<ColumnDef>, ConfigError> {
  if !def.has_extensions() {
    return Ok(vec![def.clone()]);
  }

  let mut base = def.to_map()?;
  base.remove("extensions");

  let size = def.extensions.len();
  let mut members = Vec::with_capacity(size);
  for (index, extension) in def.extensions.iter().enumerate() {
    let mut merged = base.clone();
    for (key, value) in extension {
      let key = if key == "window" { "scope" } else { key.as_str() };
      merged.insert(key.to_string(), value.clone());
    }
    merged.remove("extensions");

    let mut member = ColumnDef::from_map(merged)?;
    if size > 1 && member.outputs.is_empty() {
      if let Some(id) = &def.id {
        member.outputs = Names::new(vec![format!("{}_{}", id, index)]);
      }
    }
    members.push(member);
  }
  Ok(members)
}

//! Per-node dependency resolution.
//!
//! | node                    | depends on                                             |
//! |-------------------------|--------------------------------------------------------|
//! | noop table              | nothing                                                |
//! | extend table            | closure of the base table                              |
//! | all / join / aggregate  | closure of every input table                           |
//! | project table           | source table and the columns producing projected names |
//! | product table           | every input table node                                 |
//! | calculate / roll / all  | owning table                                           |
//! | link column             | key producers, linked table and filter, linked keys    |
//! | aggregate column        | closure of the fact table, group column                |
//! | compose column          | link column, producer of the rest of the path          |
//! | filter                  | owning table and all of its columns                    |
//!
//! The closure of a table is the table node, its column nodes and its filter
//! node. Every column also depends on its owning table. Names without a
//! producing column are plain data attributes and add no dependency.

use std::collections::HashMap;

use crate::error::BuildError;
use crate::kind::{ColumnKind, TableKind};
use crate::node::{NodeKey, NodeRole};
use crate::table::{Column, ColumnMember, Table};

pub(crate) struct Resolver<'a> {
  tables: &'a [Table],
  positions: HashMap<&'a str, usize>,
}

impl<'a> Resolver<'a> {
  pub(crate) fn new(tables: &'a [Table]) -> Self {
    let positions = tables
      .iter()
      .map(|t| (t.id.as_str(), t.position))
      .collect();
    Self { tables, positions }
  }

  fn require_table(&self, node: NodeKey, id: &str) -> Result<&'a Table, BuildError> {
    let tables = self.tables;
    self
      .positions
      .get(id)
      .map(|p| &tables[*p])
      .ok_or_else(|| BuildError::UnresolvedReference {
        node: node_name(self.tables, node),
        reference: format!("table '{}'", id),
      })
  }

  /// The dependencies of a node, without duplicates, in discovery order.
  pub(crate) fn dependencies(&self, node: NodeKey) -> Result<Vec<NodeKey>, BuildError> {
    let tables = self.tables;
    let table = &tables[node.table];
    let mut deps = Deps::new(node);
    match node.role {
      NodeRole::Table => self.table_dependencies(node, table, &mut deps)?,
      NodeRole::Column(c) => {
        deps.push(NodeKey::table(table.position));
        let column = &table.columns[c];
        for member in &column.members {
          self.member_dependencies(node, table, column, member, &mut deps)?;
        }
      }
      NodeRole::Filter => {
        deps.push(NodeKey::table(table.position));
        for c in 0..table.columns.len() {
          deps.push(NodeKey::column(table.position, c));
        }
      }
    }
    Ok(deps.into_vec())
  }

  fn table_dependencies(
    &self,
    node: NodeKey,
    table: &'a Table,
    deps: &mut Deps,
  ) -> Result<(), BuildError> {
    let tables = self.tables;
    let def = &table.definition;
    match table.kind {
      TableKind::Noop => {}
      TableKind::Extend => {
        let base = match def.inputs.first() {
          Some(base) => self.require_table(node, base)?,
          None if table.position > 0 => &tables[table.position - 1],
          None => {
            return Err(BuildError::UnresolvedReference {
              node: table.id.clone(),
              reference: "preceding table to extend".to_string(),
            });
          }
        };
        deps.extend(base.nodes());
      }
      TableKind::All | TableKind::Join | TableKind::Aggregate => {
        for input in def.inputs.iter() {
          deps.extend(self.require_table(node, input)?.nodes());
        }
      }
      TableKind::Product => {
        for input in def.inputs.iter() {
          deps.push(NodeKey::table(self.require_table(node, input)?.position));
        }
      }
      TableKind::Project => {
        let (source, projected) = project_source(table).ok_or_else(|| {
          BuildError::InvalidDefinition {
            node: table.id.clone(),
            reason: "a project table needs a source table".to_string(),
          }
        })?;
        let source = self.require_table(node, source)?;
        if projected.is_empty() {
          deps.extend(source.nodes());
        } else {
          deps.push(NodeKey::table(source.position));
          for name in projected {
            if let Some(column) = source.producer(name) {
              deps.push(NodeKey::column(source.position, column.position));
            }
          }
        }
      }
    }
    Ok(())
  }

  fn member_dependencies(
    &self,
    node: NodeKey,
    table: &'a Table,
    column: &Column,
    member: &ColumnMember,
    deps: &mut Deps,
  ) -> Result<(), BuildError> {
    let def = &member.definition;
    match member.kind {
      ColumnKind::Calculate | ColumnKind::Roll { .. } | ColumnKind::All => {}
      ColumnKind::Link => {
        for key in def.keys.iter() {
          if let Some(producer) = table.producer(key) {
            deps.push(NodeKey::column(table.position, producer.position));
          }
        }
        let linked_id = def.linked_table.as_deref().ok_or_else(|| BuildError::InvalidDefinition {
          node: node_name(self.tables, node),
          reason: "a link column needs a linked_table".to_string(),
        })?;
        let linked = self.require_table(node, linked_id)?;
        deps.push(NodeKey::table(linked.position));
        // Row positions are only stable once the linked table is filtered.
        if linked.position != table.position && linked.has_filter() {
          deps.push(NodeKey::filter(linked.position));
        }
        for key in def.linked_keys.iter() {
          if let Some(producer) = linked.producer(key) {
            deps.push(NodeKey::column(linked.position, producer.position));
          }
        }
      }
      ColumnKind::Aggregate => {
        let fact_id = def.fact_table.as_deref().ok_or_else(|| BuildError::InvalidDefinition {
          node: node_name(self.tables, node),
          reason: "an aggregate column needs a fact_table".to_string(),
        })?;
        let facts = self.require_table(node, fact_id)?;
        deps.extend(facts.nodes());
        let group = def.group_column.as_deref().ok_or_else(|| BuildError::InvalidDefinition {
          node: node_name(self.tables, node),
          reason: "an aggregate column needs a group_column".to_string(),
        })?;
        let group = facts
          .column(group)
          .ok_or_else(|| BuildError::UnresolvedReference {
            node: node_name(self.tables, node),
            reference: format!("column '{}' of table '{}'", group, facts.id),
          })?;
        deps.push(NodeKey::column(facts.position, group.position));
      }
      ColumnKind::Compose => {
        let path = compose_path(node, self.tables, column, member)?;
        let link = self.link_column(node, table, &path[0])?;
        deps.push(NodeKey::column(table.position, link.position));
        let linked = self.linked_table(node, table, &path[0])?;
        let rest = &path[1..];
        if rest.len() == 1 {
          if let Some(producer) = linked.producer(&rest[0]) {
            deps.push(NodeKey::column(linked.position, producer.position));
          }
        } else {
          let target = find_compose(linked, rest).ok_or_else(|| BuildError::UnresolvedReference {
            node: node_name(self.tables, node),
            reference: format!("compose column '{}' of table '{}'", rest.join("::"), linked.id),
          })?;
          deps.push(NodeKey::column(linked.position, target.position));
        }
      }
    }
    Ok(())
  }

  /// The link column named by the first segment of a compose path.
  pub(crate) fn link_column(
    &self,
    node: NodeKey,
    table: &'a Table,
    name: &str,
  ) -> Result<&'a Column, BuildError> {
    table
      .producer(name)
      .filter(|c| c.members.iter().any(|m| m.kind == ColumnKind::Link))
      .ok_or_else(|| BuildError::UnresolvedReference {
        node: node_name(self.tables, node),
        reference: format!("link column '{}' of table '{}'", name, table.id),
      })
  }

  /// The table a link column of `table` points to.
  pub(crate) fn linked_table(
    &self,
    node: NodeKey,
    table: &'a Table,
    link: &str,
  ) -> Result<&'a Table, BuildError> {
    let column = self.link_column(node, table, link)?;
    let linked_id = column
      .members
      .iter()
      .find_map(|m| m.definition.linked_table.as_deref())
      .ok_or_else(|| BuildError::InvalidDefinition {
        node: format!("{}.{}", table.id, column.id),
        reason: "a link column needs a linked_table".to_string(),
      })?;
    self.require_table(node, linked_id)
  }
}

/// Source table id and projected column names of a project table.
///
/// With `source_table` set, `inputs` are the projected columns. Otherwise the
/// first input names the source and the remaining inputs are projected.
pub fn project_source(table: &Table) -> Option<(&str, &[String])> {
  let def = &table.definition;
  match def.source_table.as_deref() {
    Some(source) => Some((source, def.inputs.as_slice())),
    None => def
      .inputs
      .split_first()
      .map(|(source, rest)| (source.as_str(), rest)),
  }
}

/// The segments of a compose path, checked to have at least two.
pub(crate) fn compose_path<'c>(
  node: NodeKey,
  tables: &[Table],
  column: &Column,
  member: &'c ColumnMember,
) -> Result<&'c [String], BuildError> {
  let path = member.definition.inputs.as_slice();
  if path.len() < 2 {
    return Err(BuildError::InvalidDefinition {
      node: node_name(tables, node),
      reason: format!(
        "compose column '{}' needs a path of a link column and a target column",
        column.id
      ),
    });
  }
  Ok(path)
}

/// A compose column of `table` following exactly `path`.
pub fn find_compose<'t>(table: &'t Table, path: &[String]) -> Option<&'t Column> {
  table.columns.iter().find(|c| {
    c.members
      .iter()
      .any(|m| m.kind == ColumnKind::Compose && m.definition.inputs.as_slice() == path)
  })
}

/// Human readable node id: `Table`, `Table.Column` or `filter(Table)`.
pub fn node_name(tables: &[Table], node: NodeKey) -> String {
  let table = &tables[node.table];
  match node.role {
    NodeRole::Table => table.id.clone(),
    NodeRole::Column(c) => format!("{}.{}", table.id, table.columns[c].id),
    NodeRole::Filter => format!("filter({})", table.id),
  }
}

/// Ordered set of dependencies of one node. The node itself is never added.
struct Deps {
  node: NodeKey,
  keys: Vec<NodeKey>,
}

impl Deps {
  fn new(node: NodeKey) -> Self {
    Self {
      node,
      keys: Vec::new(),
    }
  }

  fn push(&mut self, key: NodeKey) {
    if key != self.node && !self.keys.contains(&key) {
      self.keys.push(key);
    }
  }

  fn extend(&mut self, keys: impl IntoIterator<Item = NodeKey>) {
    for key in keys {
      self.push(key);
    }
  }

  fn into_vec(self) -> Vec<NodeKey> {
    self.keys
  }
}

use std::collections::{BTreeMap, BTreeSet, HashSet};

use super::tables::ALL_TABLES;
use super::types::TableSchema;

/// Orders tables so foreign-key parents are created before their children
pub struct DependencyResolver {
    /// Table name -> (table, parents it references)
    deps: BTreeMap<&'static str, (&'static TableSchema, HashSet<&'static str>)>,
}

impl DependencyResolver {
    pub fn new() -> Self {
        Self::for_tables(ALL_TABLES)
    }

    fn for_tables(tables: &[&'static TableSchema]) -> Self {
        let deps = tables
            .iter()
            .map(|table| (table.name, (*table, table.dependencies())))
            .collect();
        Self { deps }
    }

    /// All tables, parents first.
    ///
    /// Repeatedly emits every table whose parents are all emitted, in name
    /// order, so the result does not depend on declaration order.
    pub fn creation_order(&self) -> Result<Vec<&'static TableSchema>, String> {
        let mut pending: BTreeSet<&'static str> = self.deps.keys().copied().collect();
        let mut done: HashSet<&'static str> = HashSet::new();
        let mut order = Vec::with_capacity(pending.len());

        while !pending.is_empty() {
            let ready: Vec<&'static str> = pending
                .iter()
                .copied()
                .filter(|name| {
                    self.deps[name]
                        .1
                        .iter()
                        .all(|parent| done.contains(parent) || !self.deps.contains_key(parent))
                })
                .collect();

            if ready.is_empty() {
                let stuck: Vec<_> = pending.into_iter().collect();
                return Err(format!("Circular dependency among: {}", stuck.join(", ")));
            }

            for name in ready {
                pending.remove(name);
                done.insert(name);
                order.push(self.deps[name].0);
            }
        }

        Ok(order)
    }
}

impl Default for DependencyResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::types::{Column, ColumnType, ForeignKey};

    fn position(names: &[&str], name: &str) -> usize {
        names.iter().position(|&n| n == name).unwrap()
    }

    #[test]
    fn test_parents_created_before_children() {
        let tables = DependencyResolver::new().creation_order().unwrap();
        let names: Vec<_> = tables.iter().map(|t| t.name).collect();

        assert_eq!(names.len(), ALL_TABLES.len());
        assert!(position(&names, "launches") < position(&names, "fairings"));
        assert!(position(&names, "launches") < position(&names, "links"));
        assert!(position(&names, "launch_lists") < position(&names, "launch_list_members"));
        assert!(position(&names, "tags") < position(&names, "launch_tags"));
    }

    #[test]
    fn test_roots_come_out_by_name() {
        let tables = DependencyResolver::new().creation_order().unwrap();
        let names: Vec<_> = tables.iter().map(|t| t.name).take(3).collect();
        assert_eq!(names, vec!["launch_lists", "launches", "tags"]);
    }

    static A: TableSchema = TableSchema {
        name: "a",
        columns: &[Column::new("b_id", ColumnType::Integer)],
        foreign_keys: &[ForeignKey::new("b_id", "b")],
        indexes: &[],
        conflict_key: None,
    };

    static B: TableSchema = TableSchema {
        name: "b",
        columns: &[Column::new("a_id", ColumnType::Integer)],
        foreign_keys: &[ForeignKey::new("a_id", "a")],
        indexes: &[],
        conflict_key: None,
    };

    #[test]
    fn test_cycle_is_reported() {
        let err = DependencyResolver::for_tables(&[&A, &B])
            .creation_order()
            .unwrap_err();
        assert_eq!(err, "Circular dependency among: a, b");
    }
}

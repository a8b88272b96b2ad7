//! Table schema definitions for the launch catalogue

use super::types::*;

// =============================================================================
// Independent Tables (no FK dependencies)
// =============================================================================

pub static LAUNCH_LISTS: TableSchema = TableSchema {
    name: "launch_lists",
    columns: &[
        Column::required("id", ColumnType::Integer),
        Column::required("title", ColumnType::Text),
    ],
    foreign_keys: &[],
    indexes: &[Index::unique(&["title"])],
    conflict_key: None,
};

pub static TAGS: TableSchema = TableSchema {
    name: "tags",
    columns: &[
        Column::required("id", ColumnType::Integer),
        Column::required("title", ColumnType::Text),
    ],
    foreign_keys: &[],
    indexes: &[Index::unique(&["title"])],
    conflict_key: None,
};

pub static LAUNCHES: TableSchema = TableSchema {
    name: "launches",
    columns: &[
        Column::required("id", ColumnType::Integer),
        Column::new("remote_id", ColumnType::Text),
        Column::required("name", ColumnType::Text),
        Column::required("launch_date", ColumnType::Timestamp),
        Column::required("is_viewed", ColumnType::Boolean).user(),
        Column::new("launchpad", ColumnType::Text),
        Column::new("notes", ColumnType::Text).user(),
        Column::new("flight_number", ColumnType::Integer),
        Column::new("upcoming", ColumnType::Boolean),
        Column::new("success", ColumnType::Boolean),
        Column::new("details", ColumnType::Text),
    ],
    foreign_keys: &[],
    indexes: &[
        Index::unique(&["remote_id"]),
        Index::on(&["name", "launch_date"]),
        Index::on(&["launch_date"]),
    ],
    conflict_key: Some("remote_id"),
};

// =============================================================================
// Satellite Tables (one-to-one with launches)
// =============================================================================

pub static FAIRINGS: TableSchema = TableSchema {
    name: "fairings",
    columns: &[
        Column::required("id", ColumnType::Text),
        Column::required("launch_remote_id", ColumnType::Text),
        Column::new("launch_id", ColumnType::Integer),
        Column::new("reused", ColumnType::Boolean),
        Column::new("recovery_attempt", ColumnType::Boolean),
        Column::new("recovered", ColumnType::Boolean),
        Column::new("ships", ColumnType::Json),
    ],
    foreign_keys: &[ForeignKey::new("launch_id", "launches")],
    indexes: &[
        Index::unique(&["launch_remote_id"]),
        Index::unique(&["launch_id"]),
    ],
    conflict_key: Some("launch_remote_id"),
};

pub static LINKS: TableSchema = TableSchema {
    name: "links",
    columns: &[
        Column::required("id", ColumnType::Text),
        Column::required("launch_remote_id", ColumnType::Text),
        Column::new("launch_id", ColumnType::Integer),
        Column::new("patch", ColumnType::Json),
        Column::new("reddit", ColumnType::Json),
        Column::new("flickr", ColumnType::Json),
        Column::new("presskit", ColumnType::Text),
        Column::new("webcast", ColumnType::Text),
        Column::new("youtube_id", ColumnType::Text),
        Column::new("article", ColumnType::Text),
        Column::new("wikipedia", ColumnType::Text),
    ],
    foreign_keys: &[ForeignKey::new("launch_id", "launches")],
    indexes: &[
        Index::unique(&["launch_remote_id"]),
        Index::unique(&["launch_id"]),
    ],
    conflict_key: Some("launch_remote_id"),
};

// =============================================================================
// Junction Tables (many-to-many)
// =============================================================================

pub static LAUNCH_LIST_MEMBERS: TableSchema = TableSchema {
    name: "launch_list_members",
    columns: &[
        Column::required("launch_id", ColumnType::Integer),
        Column::required("list_id", ColumnType::Integer),
    ],
    foreign_keys: &[
        ForeignKey::new("launch_id", "launches"),
        ForeignKey::new("list_id", "launch_lists"),
    ],
    indexes: &[Index::unique(&["launch_id", "list_id"])],
    conflict_key: None,
};

pub static LAUNCH_TAGS: TableSchema = TableSchema {
    name: "launch_tags",
    columns: &[
        Column::required("launch_id", ColumnType::Integer),
        Column::required("tag_id", ColumnType::Integer),
    ],
    foreign_keys: &[
        ForeignKey::new("launch_id", "launches"),
        ForeignKey::new("tag_id", "tags"),
    ],
    indexes: &[Index::unique(&["launch_id", "tag_id"])],
    conflict_key: None,
};

/// All tables, in declaration order (not dependency order)
pub static ALL_TABLES: &[&TableSchema] = &[
    &LAUNCH_LIST_MEMBERS,
    &LAUNCH_TAGS,
    &FAIRINGS,
    &LINKS,
    &LAUNCHES,
    &LAUNCH_LISTS,
    &TAGS,
];

/// Look up a table by name
pub fn get_table(name: &str) -> Option<&'static TableSchema> {
    ALL_TABLES.iter().find(|t| t.name == name).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_foreign_key_targets_a_known_table() {
        for table in ALL_TABLES {
            for fk in table.foreign_keys {
                assert!(
                    get_table(fk.parent).is_some(),
                    "{}.{} references unknown table {}",
                    table.name,
                    fk.column,
                    fk.parent
                );
            }
        }
    }

    #[test]
    fn test_conflict_keys_are_unique_indexed() {
        for table in ALL_TABLES {
            if let Some(key) = table.conflict_key {
                assert!(
                    table.indexes.iter().any(|i| i.is_unique_on(key)),
                    "{} upserts on {} without a unique index",
                    table.name,
                    key
                );
            }
        }
    }

    #[test]
    fn test_user_owned_columns() {
        let owned: Vec<_> = LAUNCHES
            .columns
            .iter()
            .filter(|c| c.user_owned)
            .map(|c| c.name)
            .collect();
        assert_eq!(owned, vec!["is_viewed", "notes"]);
    }
}

use std::collections::HashSet;

/// Storage class of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Text,
    /// 0 or 1
    Boolean,
    /// UTC timestamp as RFC 3339 text, so it sorts lexically
    Timestamp,
    /// Serialized JSON array or object
    Json,
}

impl ColumnType {
    pub fn sql_type(self) -> &'static str {
        match self {
            ColumnType::Integer | ColumnType::Boolean => "INTEGER",
            ColumnType::Text | ColumnType::Timestamp | ColumnType::Json => "TEXT",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Column {
    pub name: &'static str,
    pub kind: ColumnType,
    pub nullable: bool,
    /// Written by the user, never by an import; upserts leave it alone
    pub user_owned: bool,
}

impl Column {
    /// Nullable column filled from remote data
    pub const fn new(name: &'static str, kind: ColumnType) -> Self {
        Self {
            name,
            kind,
            nullable: true,
            user_owned: false,
        }
    }

    /// NOT NULL column
    pub const fn required(name: &'static str, kind: ColumnType) -> Self {
        Self {
            nullable: false,
            ..Self::new(name, kind)
        }
    }

    pub const fn user(self) -> Self {
        Self {
            user_owned: true,
            ..self
        }
    }
}

/// `column` references `parent(id)`; rows go away with their parent
#[derive(Debug, Clone)]
pub struct ForeignKey {
    pub column: &'static str,
    pub parent: &'static str,
}

impl ForeignKey {
    pub const fn new(column: &'static str, parent: &'static str) -> Self {
        Self { column, parent }
    }
}

#[derive(Debug, Clone)]
pub struct Index {
    pub columns: &'static [&'static str],
    pub unique: bool,
}

impl Index {
    pub const fn on(columns: &'static [&'static str]) -> Self {
        Self {
            columns,
            unique: false,
        }
    }

    pub const fn unique(columns: &'static [&'static str]) -> Self {
        Self {
            columns,
            unique: true,
        }
    }

    /// True for a unique index over exactly `column`
    pub fn is_unique_on(&self, column: &str) -> bool {
        self.unique && self.columns == [column]
    }
}

/// Static declaration of one table; DDL and upsert SQL are generated from it
#[derive(Debug, Clone)]
pub struct TableSchema {
    pub name: &'static str,
    pub columns: &'static [Column],
    pub foreign_keys: &'static [ForeignKey],
    pub indexes: &'static [Index],
    /// Natural key batch inserts upsert on (`ON CONFLICT (key)`)
    pub conflict_key: Option<&'static str>,
}

impl TableSchema {
    /// Tables referenced by this table's foreign keys, excluding itself
    pub fn dependencies(&self) -> HashSet<&'static str> {
        self.foreign_keys
            .iter()
            .map(|fk| fk.parent)
            .filter(|parent| *parent != self.name)
            .collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<&'static str> {
        self.columns.iter().map(|c| c.name).collect()
    }
}

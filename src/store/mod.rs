//! SQLite-backed launch catalogue.
//!
//! A [`Store`] owns one connection. Read operations take `&self`; anything
//! that writes more than one row takes `&mut self` and runs in a transaction.

pub mod launches;
pub mod lists;
pub mod sample;
pub mod tags;

use std::path::{Path, PathBuf};

use rusqlite::{Connection, Transaction};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::schema::ALL_TABLES;
use crate::writer::create_tables;

pub use launches::{Fairings, Launch, LaunchDetail, LaunchOrder, LaunchQuery, Links, NewLaunch};
pub use lists::LaunchList;
pub use tags::{normalize_tag, Tag};

pub struct Store {
    path: PathBuf,
    conn: Connection,
}

impl Store {
    /// Open or create the catalogue at `path`.
    ///
    /// Creates parent directories and any missing tables.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        conn.execute_batch(
            "PRAGMA foreign_keys = ON;
             PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )?;
        create_tables(&conn)?;

        info!("Database ready at {}", path.display());
        Ok(Self { path, conn })
    }

    /// In-memory catalogue for tests and previews
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        create_tables(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub(crate) fn transaction(&mut self) -> Result<Transaction<'_>> {
        Ok(self.conn.transaction()?)
    }

    /// Row count of every table, sorted by table name
    pub fn table_counts(&self) -> Result<Vec<(&'static str, u64)>> {
        let mut counts = Vec::with_capacity(ALL_TABLES.len());
        for table in ALL_TABLES {
            let count: i64 =
                self.conn
                    .query_row(&format!("SELECT COUNT(*) FROM {}", table.name), [], |row| {
                        row.get(0)
                    })?;
            counts.push((table.name, count as u64));
        }
        counts.sort_unstable_by_key(|(name, _)| *name);
        Ok(counts)
    }

    /// Run `PRAGMA optimize`, as after a large import
    pub fn optimize(&self) -> Result<()> {
        self.conn.execute_batch("PRAGMA optimize;")?;
        Ok(())
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store").field("path", &self.path).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_in_memory_creates_all_tables() {
        let store = Store::open_in_memory().unwrap();
        let counts = store.table_counts().unwrap();

        assert_eq!(counts.len(), ALL_TABLES.len());
        assert!(counts.iter().all(|(_, n)| *n == 0));
        assert_eq!(counts[0].0, "fairings");
    }

    #[test]
    fn test_open_file_creates_parent_dirs_and_reopens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a").join("b").join("launches.db");

        {
            let mut store = Store::open(&path).unwrap();
            store.create_list("Favourites").unwrap();
        }

        let store = Store::open(&path).unwrap();
        assert_eq!(store.path(), path.as_path());
        assert!(store.find_list("Favourites").unwrap().is_some());
    }

    #[test]
    fn test_foreign_keys_enforced() {
        let store = Store::open_in_memory().unwrap();
        let result = store.connection().execute(
            "INSERT INTO launch_list_members (launch_id, list_id) VALUES (99, 99)",
            [],
        );
        assert!(result.is_err());
    }
}

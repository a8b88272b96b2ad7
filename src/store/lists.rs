use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use tracing::info;

use super::Store;
use crate::error::{Error, Result};

/// A named collection of launches
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LaunchList {
    pub id: i64,
    pub title: String,
    pub launch_count: u64,
}

const LIST_SELECT: &str = "SELECT l.id, l.title, COUNT(m.launch_id)
     FROM launch_lists l
     LEFT JOIN launch_list_members m ON m.list_id = l.id";

fn list_from_row(row: &rusqlite::Row) -> rusqlite::Result<LaunchList> {
    Ok(LaunchList {
        id: row.get(0)?,
        title: row.get(1)?,
        launch_count: row.get::<_, i64>(2)? as u64,
    })
}

fn normalize_title(title: &str) -> Result<&str> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(Error::EmptyTitle { kind: "list" });
    }
    Ok(trimmed)
}

/// Id of the list titled `title`, if any
pub(crate) fn find_list_id(conn: &Connection, title: &str) -> Result<Option<i64>> {
    Ok(conn
        .query_row(
            "SELECT id FROM launch_lists WHERE title = ?1",
            [title.trim()],
            |row| row.get(0),
        )
        .optional()?)
}

/// Like [`find_list_id`], failing with [`Error::ListNotFound`]
pub(crate) fn require_list_id(conn: &Connection, title: &str) -> Result<i64> {
    find_list_id(conn, title)?.ok_or_else(|| Error::ListNotFound(title.to_string()))
}

pub(crate) fn insert_list(conn: &Connection, title: &str) -> Result<i64> {
    conn.execute("INSERT INTO launch_lists (title) VALUES (?1)", [title])?;
    Ok(conn.last_insert_rowid())
}

/// Add `launch_id` to `list_id`; returns false if it was already a member
pub(crate) fn add_member(conn: &Connection, launch_id: i64, list_id: i64) -> Result<bool> {
    let changed = conn.execute(
        "INSERT OR IGNORE INTO launch_list_members (launch_id, list_id) VALUES (?1, ?2)",
        params![launch_id, list_id],
    )?;
    Ok(changed > 0)
}

impl Store {
    /// Create each list in `titles` that does not exist yet.
    ///
    /// Idempotent. Returns the titles that were created.
    pub fn ensure_lists(&mut self, titles: &[&str]) -> Result<Vec<String>> {
        let tx = self.transaction()?;
        let mut created = Vec::new();

        for title in titles {
            let title = normalize_title(title)?;
            if find_list_id(&tx, title)?.is_none() {
                insert_list(&tx, title)?;
                created.push(title.to_string());
            }
        }

        tx.commit()?;
        if !created.is_empty() {
            info!(lists = ?created, "Created launch lists");
        }
        Ok(created)
    }

    pub fn create_list(&mut self, title: &str) -> Result<LaunchList> {
        let title = normalize_title(title)?;
        let tx = self.transaction()?;

        if find_list_id(&tx, title)?.is_some() {
            return Err(Error::DuplicateList(title.to_string()));
        }
        let id = insert_list(&tx, title)?;
        tx.commit()?;

        Ok(LaunchList {
            id,
            title: title.to_string(),
            launch_count: 0,
        })
    }

    /// All lists with their launch counts, ordered by title
    pub fn lists(&self) -> Result<Vec<LaunchList>> {
        let mut stmt = self
            .connection()
            .prepare(&format!("{LIST_SELECT} GROUP BY l.id ORDER BY l.title"))?;
        let lists = stmt
            .query_map([], list_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(lists)
    }

    pub fn find_list(&self, title: &str) -> Result<Option<LaunchList>> {
        Ok(self
            .connection()
            .query_row(
                &format!("{LIST_SELECT} WHERE l.title = ?1 GROUP BY l.id"),
                [title.trim()],
                list_from_row,
            )
            .optional()?)
    }

    /// Add an existing launch to an existing list
    pub fn add_to_list(&mut self, launch_id: i64, title: &str) -> Result<bool> {
        let tx = self.transaction()?;
        let list_id = require_list_id(&tx, title)?;
        super::launches::require_launch(&tx, launch_id)?;
        let added = add_member(&tx, launch_id, list_id)?;
        tx.commit()?;
        Ok(added)
    }
}

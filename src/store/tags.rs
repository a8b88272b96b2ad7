use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;

use super::launches::require_launch;
use super::Store;
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tag {
    pub id: i64,
    pub title: String,
    pub launch_count: u64,
}

/// Tag titles are stored trimmed and lowercased
pub fn normalize_tag(title: &str) -> Result<String> {
    let normalized = title.trim().to_lowercase();
    if normalized.is_empty() {
        return Err(Error::EmptyTitle { kind: "tag" });
    }
    Ok(normalized)
}

/// Look up a tag by title (case-insensitively), creating it when absent
pub(crate) fn fetch_or_create(conn: &Connection, title: &str) -> Result<(i64, String)> {
    let title = normalize_tag(title)?;

    let existing: Option<i64> = conn
        .query_row("SELECT id FROM tags WHERE title = ?1", [&title], |row| row.get(0))
        .optional()?;

    let id = match existing {
        Some(id) => id,
        None => {
            conn.execute("INSERT INTO tags (title) VALUES (?1)", [&title])?;
            conn.last_insert_rowid()
        }
    };

    Ok((id, title))
}

pub(crate) fn attach(conn: &Connection, launch_id: i64, tag_id: i64) -> Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO launch_tags (launch_id, tag_id) VALUES (?1, ?2)",
        params![launch_id, tag_id],
    )?;
    Ok(())
}

impl Store {
    pub fn fetch_or_create_tag(&mut self, title: &str) -> Result<Tag> {
        let tx = self.transaction()?;
        let (id, title) = fetch_or_create(&tx, title)?;
        let launch_count: i64 = tx.query_row(
            "SELECT COUNT(*) FROM launch_tags WHERE tag_id = ?1",
            [id],
            |row| row.get(0),
        )?;
        tx.commit()?;

        Ok(Tag {
            id,
            title,
            launch_count: launch_count as u64,
        })
    }

    /// Tag a launch; tags it already has are left alone.
    ///
    /// Returns the normalized titles that were applied.
    pub fn tag_launch(&mut self, launch_id: i64, titles: &[String]) -> Result<Vec<String>> {
        let tx = self.transaction()?;
        require_launch(&tx, launch_id)?;

        let mut applied = Vec::with_capacity(titles.len());
        for title in titles {
            let (tag_id, title) = fetch_or_create(&tx, title)?;
            attach(&tx, launch_id, tag_id)?;
            if !applied.contains(&title) {
                applied.push(title);
            }
        }

        tx.commit()?;
        Ok(applied)
    }

    /// Returns false when the launch did not carry the tag
    pub fn untag_launch(&mut self, launch_id: i64, title: &str) -> Result<bool> {
        let title = normalize_tag(title)?;
        require_launch(self.connection(), launch_id)?;
        let removed = self.connection().execute(
            "DELETE FROM launch_tags
             WHERE launch_id = ?1 AND tag_id = (SELECT id FROM tags WHERE title = ?2)",
            params![launch_id, title],
        )?;
        Ok(removed > 0)
    }

    /// All tags with usage counts, ordered by title
    pub fn tags(&self) -> Result<Vec<Tag>> {
        let mut stmt = self.connection().prepare(
            "SELECT t.id, t.title, COUNT(lt.launch_id)
             FROM tags t
             LEFT JOIN launch_tags lt ON lt.tag_id = t.id
             GROUP BY t.id
             ORDER BY t.title",
        )?;
        let tags = stmt
            .query_map([], |row| {
                Ok(Tag {
                    id: row.get(0)?,
                    title: row.get(1)?,
                    launch_count: row.get::<_, i64>(2)? as u64,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(tags)
    }

    /// Titles of the tags on a launch, sorted
    pub fn tags_for(&self, launch_id: i64) -> Result<Vec<String>> {
        let mut stmt = self.connection().prepare(
            "SELECT t.title FROM tags t
             JOIN launch_tags lt ON lt.tag_id = t.id
             WHERE lt.launch_id = ?1
             ORDER BY t.title",
        )?;
        let titles = stmt
            .query_map([launch_id], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(titles)
    }
}

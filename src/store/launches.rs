use chrono::{DateTime, Utc};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;

use super::lists::{add_member, require_list_id};
use super::{tags, Store};
use crate::error::{Error, Result};
use crate::parser::format_timestamp;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Launch {
    pub id: i64,
    /// Remote API id; `None` for launches created locally
    pub remote_id: Option<String>,
    pub name: String,
    pub launch_date: DateTime<Utc>,
    pub is_viewed: bool,
    pub launchpad: Option<String>,
    pub notes: Option<String>,
    pub flight_number: Option<i64>,
    pub upcoming: Option<bool>,
    pub success: Option<bool>,
    pub details: Option<String>,
}

/// A launch entered by hand
#[derive(Debug, Clone, PartialEq)]
pub struct NewLaunch {
    pub name: String,
    pub launch_date: DateTime<Utc>,
    pub is_viewed: bool,
    pub launchpad: Option<String>,
    pub notes: Option<String>,
    pub tags: Vec<String>,
}

impl NewLaunch {
    pub fn new(name: impl Into<String>, launch_date: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            launch_date,
            is_viewed: false,
            launchpad: None,
            notes: None,
            tags: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Fairings {
    pub id: String,
    pub reused: Option<bool>,
    pub recovery_attempt: Option<bool>,
    pub recovered: Option<bool>,
    pub ships: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Links {
    pub id: String,
    pub patch: BTreeMap<String, String>,
    pub reddit: BTreeMap<String, String>,
    pub flickr: BTreeMap<String, Vec<String>>,
    pub presskit: Option<String>,
    pub webcast: Option<String>,
    pub youtube_id: Option<String>,
    pub article: Option<String>,
    pub wikipedia: Option<String>,
}

/// A launch with everything hanging off it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LaunchDetail {
    pub launch: Launch,
    pub tags: Vec<String>,
    pub lists: Vec<String>,
    pub fairings: Option<Fairings>,
    pub links: Option<Links>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum LaunchOrder {
    /// Order of insertion
    Insertion,
    /// Launch date, earliest first
    #[default]
    Date,
    /// Name, then launch date for equal names
    Name,
}

impl LaunchOrder {
    fn order_by(self) -> &'static str {
        match self {
            LaunchOrder::Insertion => "l.id",
            LaunchOrder::Date => "l.launch_date, l.id",
            LaunchOrder::Name => "l.name, l.launch_date, l.id",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchQuery {
    /// Only launches in the list with this title
    pub list: Option<String>,
    pub unviewed_only: bool,
    pub order: LaunchOrder,
}

const LAUNCH_COLUMNS: &str = "l.id, l.remote_id, l.name, l.launch_date, l.is_viewed, l.launchpad, \
     l.notes, l.flight_number, l.upcoming, l.success, l.details";

fn launch_from_row(row: &Row) -> rusqlite::Result<Launch> {
    let date: String = row.get(3)?;
    let launch_date = DateTime::parse_from_rfc3339(&date)
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
        })?
        .with_timezone(&Utc);

    Ok(Launch {
        id: row.get(0)?,
        remote_id: row.get(1)?,
        name: row.get(2)?,
        launch_date,
        is_viewed: row.get(4)?,
        launchpad: row.get(5)?,
        notes: row.get(6)?,
        flight_number: row.get(7)?,
        upcoming: row.get(8)?,
        success: row.get(9)?,
        details: row.get(10)?,
    })
}

/// Decode a JSON text column, treating NULL as the default value
fn json_column<T: DeserializeOwned + Default>(row: &Row, idx: usize) -> rusqlite::Result<T> {
    match row.get::<_, Option<String>>(idx)? {
        None => Ok(T::default()),
        Some(text) => serde_json::from_str(&text).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        }),
    }
}

/// Fail with [`Error::LaunchNotFound`] unless launch `id` exists
pub(crate) fn require_launch(conn: &Connection, id: i64) -> Result<()> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM launches WHERE id = ?1)",
        [id],
        |row| row.get(0),
    )?;
    if exists {
        Ok(())
    } else {
        Err(Error::LaunchNotFound(id))
    }
}

/// Insert a user launch with its tags and add it to `list_id`
pub(crate) fn insert_launch(conn: &Connection, launch: &NewLaunch, list_id: i64) -> Result<i64> {
    if launch.name.trim().is_empty() {
        return Err(Error::EmptyTitle { kind: "launch" });
    }

    conn.execute(
        "INSERT INTO launches (name, launch_date, is_viewed, launchpad, notes)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            launch.name.trim(),
            format_timestamp(&launch.launch_date),
            launch.is_viewed,
            launch.launchpad,
            launch.notes,
        ],
    )?;
    let id = conn.last_insert_rowid();

    for title in &launch.tags {
        let (tag_id, _) = tags::fetch_or_create(conn, title)?;
        tags::attach(conn, id, tag_id)?;
    }
    add_member(conn, id, list_id)?;

    Ok(id)
}

impl Store {
    /// Insert a user launch into an existing list, with its tags.
    ///
    /// Returns the new launch id.
    pub fn create_launch(&mut self, launch: &NewLaunch, list_title: &str) -> Result<i64> {
        let tx = self.transaction()?;
        let list_id = require_list_id(&tx, list_title)?;
        let id = insert_launch(&tx, launch, list_id)?;
        tx.commit()?;
        Ok(id)
    }

    pub fn launch(&self, id: i64) -> Result<Launch> {
        self.connection()
            .query_row(
                &format!("SELECT {LAUNCH_COLUMNS} FROM launches l WHERE l.id = ?1"),
                [id],
                launch_from_row,
            )
            .optional()?
            .ok_or(Error::LaunchNotFound(id))
    }

    /// Look up an imported launch by its remote id
    pub fn launch_by_remote_id(&self, remote_id: &str) -> Result<Option<Launch>> {
        Ok(self
            .connection()
            .query_row(
                &format!("SELECT {LAUNCH_COLUMNS} FROM launches l WHERE l.remote_id = ?1"),
                [remote_id],
                launch_from_row,
            )
            .optional()?)
    }

    pub fn launches(&self, query: &LaunchQuery) -> Result<Vec<Launch>> {
        let mut sql = format!("SELECT {LAUNCH_COLUMNS} FROM launches l");
        let mut conditions = Vec::new();

        // ANY membership: a launch may sit in several lists
        if query.list.is_some() {
            conditions.push(
                "EXISTS (SELECT 1 FROM launch_list_members m
                         JOIN launch_lists ll ON ll.id = m.list_id
                         WHERE m.launch_id = l.id AND ll.title = ?1)",
            );
        }
        if query.unviewed_only {
            conditions.push("l.is_viewed = 0");
        }
        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }
        sql.push_str(" ORDER BY ");
        sql.push_str(query.order.order_by());

        let mut stmt = self.connection().prepare(&sql)?;
        let launches = stmt
            .query_map(
                params_from_iter(query.list.iter().map(|t| t.trim())),
                launch_from_row,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(launches)
    }

    /// Unviewed launches in a list, by name then date
    pub fn launches_in_list(&self, title: &str) -> Result<Vec<Launch>> {
        require_list_id(self.connection(), title)?;
        self.launches(&LaunchQuery {
            list: Some(title.to_string()),
            unviewed_only: true,
            order: LaunchOrder::Name,
        })
    }

    pub fn mark_viewed(&mut self, id: i64, viewed: bool) -> Result<()> {
        let changed = self.connection().execute(
            "UPDATE launches SET is_viewed = ?1 WHERE id = ?2",
            params![viewed, id],
        )?;
        if changed == 0 {
            return Err(Error::LaunchNotFound(id));
        }
        Ok(())
    }

    pub fn set_notes(&mut self, id: i64, notes: Option<&str>) -> Result<()> {
        let changed = self.connection().execute(
            "UPDATE launches SET notes = ?1 WHERE id = ?2",
            params![notes, id],
        )?;
        if changed == 0 {
            return Err(Error::LaunchNotFound(id));
        }
        Ok(())
    }

    pub fn fairings_for(&self, launch_id: i64) -> Result<Option<Fairings>> {
        Ok(self
            .connection()
            .query_row(
                "SELECT id, reused, recovery_attempt, recovered, ships
                 FROM fairings WHERE launch_id = ?1",
                [launch_id],
                |row| {
                    Ok(Fairings {
                        id: row.get(0)?,
                        reused: row.get(1)?,
                        recovery_attempt: row.get(2)?,
                        recovered: row.get(3)?,
                        ships: json_column(row, 4)?,
                    })
                },
            )
            .optional()?)
    }

    pub fn links_for(&self, launch_id: i64) -> Result<Option<Links>> {
        Ok(self
            .connection()
            .query_row(
                "SELECT id, patch, reddit, flickr, presskit, webcast, youtube_id, article, wikipedia
                 FROM links WHERE launch_id = ?1",
                [launch_id],
                |row| {
                    Ok(Links {
                        id: row.get(0)?,
                        patch: json_column(row, 1)?,
                        reddit: json_column(row, 2)?,
                        flickr: json_column(row, 3)?,
                        presskit: row.get(4)?,
                        webcast: row.get(5)?,
                        youtube_id: row.get(6)?,
                        article: row.get(7)?,
                        wikipedia: row.get(8)?,
                    })
                },
            )
            .optional()?)
    }

    /// Titles of the lists a launch belongs to, sorted
    pub fn lists_for(&self, launch_id: i64) -> Result<Vec<String>> {
        let mut stmt = self.connection().prepare(
            "SELECT ll.title FROM launch_lists ll
             JOIN launch_list_members m ON m.list_id = ll.id
             WHERE m.launch_id = ?1
             ORDER BY ll.title",
        )?;
        let titles = stmt
            .query_map([launch_id], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(titles)
    }

    pub fn launch_detail(&self, id: i64) -> Result<LaunchDetail> {
        let launch = self.launch(id)?;
        Ok(LaunchDetail {
            tags: self.tags_for(id)?,
            lists: self.lists_for(id)?,
            fairings: self.fairings_for(id)?,
            links: self.links_for(id)?,
            launch,
        })
    }
}

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use std::collections::{BTreeMap, HashMap};

use crate::api::{FairingsJson, LaunchJson, LinksJson};
use crate::error::{Error, Result};

/// A parsed row ready for insertion
#[derive(Debug, Clone, Default)]
pub struct ParsedRow {
    pub values: HashMap<&'static str, SqlValue>,
}

impl ParsedRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, column: &'static str, value: impl Into<SqlValue>) -> &mut Self {
        self.values.insert(column, value.into());
        self
    }

    /// Value for `column`, NULL when unset
    pub fn get(&self, column: &str) -> SqlValue {
        self.values.get(column).cloned().unwrap_or(SqlValue::Null)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Text(String),
}

impl SqlValue {
    pub fn bind_to(&self, idx: usize, stmt: &mut rusqlite::Statement) -> rusqlite::Result<()> {
        match self {
            SqlValue::Null => stmt.raw_bind_parameter(idx, rusqlite::types::Null)?,
            SqlValue::Integer(i) => stmt.raw_bind_parameter(idx, i)?,
            SqlValue::Text(s) => stmt.raw_bind_parameter(idx, s.as_str())?,
        }
        Ok(())
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Integer(value)
    }
}

impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        SqlValue::Integer(i64::from(value))
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_string())
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(SqlValue::Null)
    }
}

/// Parse a launch date given as RFC 3339 or as a bare `YYYY-MM-DD` (midnight UTC)
pub fn parse_launch_date(value: &str) -> Result<DateTime<Utc>> {
    let trimmed = value.trim();
    if let Ok(date) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(date.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| Error::InvalidDate {
            value: value.to_string(),
        })
}

/// Canonical storage form of a timestamp
pub fn format_timestamp(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Build the `launches` row for a remote launch record
pub fn launch_row(launch: &LaunchJson) -> Result<ParsedRow> {
    let date = parse_launch_date(&launch.date_utc)?;

    let mut row = ParsedRow::new();
    row.set("remote_id", launch.id.as_str())
        .set("name", launch.name.as_str())
        .set("launch_date", format_timestamp(&date))
        .set("is_viewed", false)
        .set("launchpad", launch.launchpad.clone())
        .set("flight_number", launch.flight_number)
        .set("upcoming", launch.upcoming)
        .set("success", launch.success)
        .set("details", launch.details.clone());
    Ok(row)
}

/// Build the `fairings` row for the fairings of launch `launch_remote_id`
pub fn fairings_row(id: &str, launch_remote_id: &str, fairings: &FairingsJson) -> Result<ParsedRow> {
    let mut row = ParsedRow::new();
    row.set("id", id)
        .set("launch_remote_id", launch_remote_id)
        .set("reused", fairings.reused)
        .set("recovery_attempt", fairings.recovery_attempt)
        .set("recovered", fairings.recovered)
        .set("ships", serde_json::to_string(&fairings.ships)?);
    Ok(row)
}

/// Build the `links` row for the links of launch `launch_remote_id`.
///
/// Null patch and reddit entries are stored as empty strings.
pub fn links_row(id: &str, launch_remote_id: &str, links: &LinksJson) -> Result<ParsedRow> {
    let mut row = ParsedRow::new();
    row.set("id", id)
        .set("launch_remote_id", launch_remote_id)
        .set("patch", serde_json::to_string(&blank_nulls(&links.patch))?)
        .set("reddit", serde_json::to_string(&blank_nulls(&links.reddit))?)
        .set("flickr", serde_json::to_string(&links.flickr)?)
        .set("presskit", links.presskit.clone())
        .set("webcast", links.webcast.clone())
        .set("youtube_id", links.youtube_id.clone())
        .set("article", links.article.clone())
        .set("wikipedia", links.wikipedia.clone());
    Ok(row)
}

fn blank_nulls(map: &BTreeMap<String, Option<String>>) -> BTreeMap<&str, &str> {
    map.iter()
        .map(|(k, v)| (k.as_str(), v.as_deref().unwrap_or("")))
        .collect()
}

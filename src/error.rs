//! Error types for rocket-launches.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for catalogue, import and sync operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Storage Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {}: {source}", .path.display())]
    DatabaseOpen {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    Database(#[from] rusqlite::Error),

    /// The static table declarations are inconsistent (e.g. an FK cycle).
    #[error("invalid table schema: {0}")]
    Schema(String),

    /// A bulk insert phase failed; the whole import is aborted.
    #[error("batch insert into {table} failed: {source}")]
    BatchInsert {
        table: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    /// Satellite rows whose owning launch could not be found.
    #[error("{} {table} record(s) could not be linked to a launch: {}", .remote_ids.len(), .remote_ids.join(", "))]
    UnlinkedRecords {
        table: &'static str,
        remote_ids: Vec<String>,
    },

    // === Catalogue Errors ===
    #[error("launch list not found: {0}")]
    ListNotFound(String),

    #[error("launch list already exists: {0}")]
    DuplicateList(String),

    #[error("launch not found: {0}")]
    LaunchNotFound(i64),

    /// A list or tag title was blank after trimming.
    #[error("{kind} title must not be empty")]
    EmptyTitle { kind: &'static str },

    #[error("invalid launch date: {value}")]
    InvalidDate { value: String },

    // === Remote Errors ===
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("request to {url} returned status {status}")]
    HttpStatus { url: String, status: u16 },

    /// Offline sync asked for a feed that was never cached.
    #[error("no cached response for feed '{feed}' at {}", .path.display())]
    CacheMiss { feed: String, path: PathBuf },

    // === Configuration Errors ===
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    #[error("invalid configuration: {message}")]
    ConfigValidation { message: String },

    // === I/O Errors ===
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to create directory {}: {source}", .path.display())]
    DirectoryCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for rocket-launches operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Wrap a failed statement as an aborted batch insert for `table`.
    #[must_use]
    pub fn batch_insert(table: &'static str, source: rusqlite::Error) -> Self {
        Self::BatchInsert { table, source }
    }

    /// True when the error means a list, launch or cached feed is missing.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::ListNotFound(_) | Self::LaunchNotFound(_) | Self::CacheMiss { .. }
        )
    }
}

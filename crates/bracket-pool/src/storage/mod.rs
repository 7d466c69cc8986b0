//! SQLite storage bootstrap for contest entries.
//!
//! The `entries` table is created on open when missing. Email uniqueness is a table
//! constraint, so concurrent registrations cannot slip past a pre-check.

use std::fmt;
use std::path::Path;
use std::time::{Duration, Instant};

use rusqlite::Connection;
use tracing::{error, info};

use crate::config::StorageConfig;

mod sqlite;

pub use sqlite::SqliteEntryRepository;

const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS entries (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    email TEXT NOT NULL,
    username TEXT,
    bracket TEXT,
    score INTEGER NOT NULL DEFAULT 0,
    locked INTEGER NOT NULL DEFAULT 0,
    created_at INTEGER NOT NULL,
    CONSTRAINT uq_entries_email UNIQUE (email)
);
CREATE INDEX IF NOT EXISTS ix_entries_created_at ON entries (created_at);
CREATE INDEX IF NOT EXISTS ix_entries_ranking ON entries (score DESC, created_at ASC);
";

#[derive(Debug)]
pub enum StorageError {
    Open { target: String, source: rusqlite::Error },
    Schema(rusqlite::Error),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::Open { target, source } => {
                write!(f, "unable to open database '{target}': {source}")
            }
            StorageError::Schema(err) => write!(f, "unable to prepare schema: {err}"),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StorageError::Open { source, .. } => Some(source),
            StorageError::Schema(err) => Some(err),
        }
    }
}

/// Open the configured database and make sure the schema exists.
pub fn open(config: &StorageConfig) -> Result<Connection, StorageError> {
    if config.is_in_memory() {
        open_in_memory()
    } else {
        open_file(&config.database_path)
    }
}

pub fn open_file(path: impl AsRef<Path>) -> Result<Connection, StorageError> {
    let path = path.as_ref();
    let started_at = Instant::now();
    let conn = Connection::open(path).map_err(|source| StorageError::Open {
        target: path.display().to_string(),
        source,
    })?;
    finish_open(conn, "file", started_at)
}

pub fn open_in_memory() -> Result<Connection, StorageError> {
    let started_at = Instant::now();
    let conn = Connection::open_in_memory().map_err(|source| StorageError::Open {
        target: ":memory:".to_string(),
        source,
    })?;
    finish_open(conn, "memory", started_at)
}

fn finish_open(
    conn: Connection,
    mode: &'static str,
    started_at: Instant,
) -> Result<Connection, StorageError> {
    match bootstrap(&conn) {
        Ok(()) => {
            info!(
                mode,
                duration_ms = started_at.elapsed().as_millis() as u64,
                "database ready"
            );
            Ok(conn)
        }
        Err(err) => {
            error!(mode, error = %err, "database bootstrap failed");
            Err(StorageError::Schema(err))
        }
    }
}

fn bootstrap(conn: &Connection) -> rusqlite::Result<()> {
    conn.busy_timeout(Duration::from_secs(5))?;
    conn.execute_batch(SCHEMA_SQL)
}

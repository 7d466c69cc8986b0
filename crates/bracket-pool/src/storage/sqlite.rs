use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};

use super::StorageError;
use crate::config::StorageConfig;
use crate::contest::entries::{
    BracketDocument, Entry, EntryId, EntryRepository, NewEntry, RepositoryError,
};

const ENTRY_SELECT_SQL: &str = "SELECT
    id,
    name,
    email,
    username,
    bracket,
    score,
    locked,
    created_at
FROM entries";

/// SQLite-backed entry repository. A single connection is shared behind a mutex, so every
/// repository call runs as one serialized statement.
pub struct SqliteEntryRepository {
    conn: Mutex<Connection>,
}

impl SqliteEntryRepository {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    pub fn open(config: &StorageConfig) -> Result<Self, StorageError> {
        super::open(config).map(Self::new)
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        super::open_in_memory().map(Self::new)
    }

    fn connection(&self) -> Result<MutexGuard<'_, Connection>, RepositoryError> {
        self.conn
            .lock()
            .map_err(|_| RepositoryError::Unavailable("connection mutex poisoned".to_string()))
    }

    fn query_entries(&self, order_by: &str) -> Result<Vec<Entry>, RepositoryError> {
        let conn = self.connection()?;
        let mut stmt = conn
            .prepare(&format!("{ENTRY_SELECT_SQL} ORDER BY {order_by}"))
            .map_err(unavailable)?;
        let rows = stmt
            .query_map([], StoredEntry::from_row)
            .map_err(unavailable)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(unavailable)?;
        rows.into_iter().map(StoredEntry::into_entry).collect()
    }

    fn update_one(&self, sql: &str, id: EntryId, value: i64) -> Result<(), RepositoryError> {
        let conn = self.connection()?;
        let changed = conn.execute(sql, params![value, id.0]).map_err(unavailable)?;
        if changed == 0 {
            Err(RepositoryError::NotFound)
        } else {
            Ok(())
        }
    }
}

impl EntryRepository for SqliteEntryRepository {
    fn insert(&self, entry: NewEntry) -> Result<Entry, RepositoryError> {
        let conn = self.connection()?;
        let created_at = entry.created_at.timestamp_micros();

        conn.execute(
            "INSERT INTO entries (name, email, username, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![entry.name, entry.email, entry.username, created_at],
        )
        .map_err(|err| {
            if is_unique_violation(&err) {
                RepositoryError::Conflict
            } else {
                unavailable(err)
            }
        })?;

        Ok(Entry {
            id: EntryId(conn.last_insert_rowid()),
            name: entry.name,
            email: entry.email,
            username: entry.username,
            bracket: None,
            score: 0,
            locked: false,
            created_at: entry.created_at,
        })
    }

    fn fetch(&self, id: EntryId) -> Result<Option<Entry>, RepositoryError> {
        let conn = self.connection()?;
        let stored = conn
            .query_row(
                &format!("{ENTRY_SELECT_SQL} WHERE id = ?1"),
                params![id.0],
                StoredEntry::from_row,
            )
            .optional()
            .map_err(unavailable)?;
        stored.map(StoredEntry::into_entry).transpose()
    }

    fn list_by_creation(&self) -> Result<Vec<Entry>, RepositoryError> {
        self.query_entries("created_at ASC")
    }

    fn ranked(&self) -> Result<Vec<Entry>, RepositoryError> {
        self.query_entries("score DESC, created_at ASC")
    }

    fn replace_bracket(
        &self,
        id: EntryId,
        bracket: &BracketDocument,
    ) -> Result<(), RepositoryError> {
        let encoded = serde_json::to_string(bracket)
            .map_err(|err| RepositoryError::CorruptRecord(err.to_string()))?;

        let conn = self.connection()?;
        let changed = conn
            .execute(
                "UPDATE entries SET bracket = ?1 WHERE id = ?2 AND locked = 0",
                params![encoded, id.0],
            )
            .map_err(unavailable)?;
        if changed > 0 {
            return Ok(());
        }

        let exists = conn
            .query_row("SELECT 1 FROM entries WHERE id = ?1", params![id.0], |_| {
                Ok(())
            })
            .optional()
            .map_err(unavailable)?;
        match exists {
            Some(()) => Err(RepositoryError::Locked),
            None => Err(RepositoryError::NotFound),
        }
    }

    fn set_score(&self, id: EntryId, score: i64) -> Result<(), RepositoryError> {
        self.update_one("UPDATE entries SET score = ?1 WHERE id = ?2", id, score)
    }

    fn lock(&self, id: EntryId) -> Result<(), RepositoryError> {
        self.update_one("UPDATE entries SET locked = ?1 WHERE id = ?2", id, 1)
    }

    fn lock_all(&self) -> Result<usize, RepositoryError> {
        let conn = self.connection()?;
        conn.execute("UPDATE entries SET locked = 1 WHERE locked = 0", [])
            .map_err(unavailable)
    }
}

/// Row image before the bracket text and timestamp are decoded.
struct StoredEntry {
    id: i64,
    name: String,
    email: String,
    username: Option<String>,
    bracket: Option<String>,
    score: i64,
    locked: bool,
    created_at: i64,
}

impl StoredEntry {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            email: row.get(2)?,
            username: row.get(3)?,
            bracket: row.get(4)?,
            score: row.get(5)?,
            locked: row.get(6)?,
            created_at: row.get(7)?,
        })
    }

    fn into_entry(self) -> Result<Entry, RepositoryError> {
        let bracket = match self.bracket.as_deref() {
            None | Some("") => None,
            Some(text) => Some(serde_json::from_str::<BracketDocument>(text).map_err(|err| {
                RepositoryError::CorruptRecord(format!("entry {} bracket: {err}", self.id))
            })?),
        };
        let created_at = DateTime::<Utc>::from_timestamp_micros(self.created_at).ok_or_else(|| {
            RepositoryError::CorruptRecord(format!(
                "entry {} created_at out of range: {}",
                self.id, self.created_at
            ))
        })?;

        Ok(Entry {
            id: EntryId(self.id),
            name: self.name,
            email: self.email,
            username: self.username,
            bracket,
            score: self.score,
            locked: self.locked,
            created_at,
        })
    }
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.code == ErrorCode::ConstraintViolation
                && failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

fn unavailable(err: rusqlite::Error) -> RepositoryError {
    RepositoryError::Unavailable(err.to_string())
}

//! Database module
//!
//! Persists the durable projection of chat sessions (messages and settings).
//! Loading and error state are never written.

mod schema;

use schema::SCHEMA;

use crate::session::{Message, PersistedState, Settings};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;

/// Snapshot name used when none is configured
pub const DEFAULT_SNAPSHOT_NAME: &str = "chat-store";

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Corrupt snapshot {name}: {source}")]
    CorruptSnapshot {
        name: String,
        source: serde_json::Error,
    },
    #[error("Failed to encode snapshot: {0}")]
    Encode(#[from] serde_json::Error),
}

pub type DbResult<T> = Result<T, DbError>;

/// Thread-safe database handle
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    /// Open an in-memory database (for testing)
    #[allow(dead_code)] // Used in tests
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn run_migrations(&self) -> DbResult<()> {
        self.conn().execute_batch(SCHEMA)?;
        Ok(())
    }

    // ==================== Snapshot Operations ====================

    /// Replace the named snapshot
    pub fn save_snapshot(&self, name: &str, snapshot: &PersistedState) -> DbResult<()> {
        let messages = serde_json::to_string(&snapshot.messages)?;
        let settings = serde_json::to_string(&snapshot.settings)?;
        let now = Utc::now();

        self.conn().execute(
            "INSERT INTO session_snapshots (name, messages, settings, updated_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(name) DO UPDATE SET
                messages = excluded.messages,
                settings = excluded.settings,
                updated_at = excluded.updated_at",
            params![name, messages, settings, now.to_rfc3339()],
        )?;
        Ok(())
    }

    /// Load the named snapshot, `None` if it was never saved
    pub fn load_snapshot(&self, name: &str) -> DbResult<Option<PersistedState>> {
        let row: Option<(String, String)> = self
            .conn()
            .query_row(
                "SELECT messages, settings FROM session_snapshots WHERE name = ?1",
                params![name],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let Some((messages, settings)) = row else {
            return Ok(None);
        };

        let corrupt = |source| DbError::CorruptSnapshot {
            name: name.to_string(),
            source,
        };
        let messages: Vec<Message> = serde_json::from_str(&messages).map_err(corrupt)?;
        let settings: Settings = serde_json::from_str(&settings).map_err(corrupt)?;

        Ok(Some(PersistedState { messages, settings }))
    }

    /// When the named snapshot was last written
    pub fn snapshot_updated_at(&self, name: &str) -> DbResult<Option<DateTime<Utc>>> {
        let updated: Option<String> = self
            .conn()
            .query_row(
                "SELECT updated_at FROM session_snapshots WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()?;
        Ok(updated.as_deref().map(parse_datetime))
    }

    /// Remove the named snapshot
    #[allow(dead_code)] // API completeness
    pub fn delete_snapshot(&self, name: &str) -> DbResult<()> {
        self.conn().execute(
            "DELETE FROM session_snapshots WHERE name = ?1",
            params![name],
        )?;
        Ok(())
    }
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).map_or_else(|_| Utc::now(), |dt| dt.with_timezone(&Utc))
}

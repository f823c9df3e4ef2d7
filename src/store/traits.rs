//! Trait abstractions for store I/O
//!
//! These traits let the store run against in-memory fakes in tests.

use crate::db::Database;
use crate::session::PersistedState;
use std::sync::Arc;

/// Destination for the durable projection of a session
pub trait SnapshotSink: Send + Sync {
    /// Replace the stored snapshot
    fn save_snapshot(&self, snapshot: &PersistedState) -> Result<(), String>;
}

impl<T: SnapshotSink + ?Sized> SnapshotSink for Arc<T> {
    fn save_snapshot(&self, snapshot: &PersistedState) -> Result<(), String> {
        (**self).save_snapshot(snapshot)
    }
}

// ============================================================================
// Production Adapters
// ============================================================================

/// Adapter to use Database as a snapshot sink under a fixed name
#[derive(Clone)]
pub struct DatabaseSink {
    db: Database,
    name: String,
}

impl DatabaseSink {
    pub fn new(db: Database, name: impl Into<String>) -> Self {
        Self {
            db,
            name: name.into(),
        }
    }
}

impl SnapshotSink for DatabaseSink {
    fn save_snapshot(&self, snapshot: &PersistedState) -> Result<(), String> {
        self.db
            .save_snapshot(&self.name, snapshot)
            .map_err(|e| e.to_string())
    }
}

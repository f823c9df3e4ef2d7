//! Database schema

/// SQL schema for initialization
pub const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS session_snapshots (
    name TEXT PRIMARY KEY,
    messages TEXT NOT NULL,
    settings TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
";

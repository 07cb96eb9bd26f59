//! Database module - SQLite connection and schema
//!
//! Single embedded backing store for assets and attribute sightings.
//! Every multi-step write goes through a transaction so no other process
//! observes a half-updated row.

pub mod assets;
pub mod attributes;

pub use attributes::Attribute;

use std::path::Path;

use rusqlite::Connection;

use crate::error::Result;

/// Handle to the asset tracking database.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (creating if needed) the database file and apply the schema.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| crate::error::Error::Persistence(e.to_string()))?;
        }
        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    /// In-memory database, used by tests.
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", true)?;
        conn.execute_batch(SCHEMA_SQL)?;
        log::debug!("database schema applied");
        Ok(Self { conn })
    }

    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }
}

/// Database schema SQL
const SCHEMA_SQL: &str = r#"
-- Tracked assets, one row per hostname
CREATE TABLE IF NOT EXISTS assets (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    hostname TEXT NOT NULL UNIQUE,
    kind TEXT NOT NULL DEFAULT 'unknown',
    status TEXT NOT NULL DEFAULT 'unknown',
    first_seen TEXT NOT NULL,
    last_seen TEXT,
    notes TEXT
);

-- Attribute sightings, at most one row per (asset, attribute kind)
CREATE TABLE IF NOT EXISTS attributes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    asset_id INTEGER NOT NULL REFERENCES assets(id) ON DELETE CASCADE,
    name TEXT NOT NULL,
    last_seen TEXT NOT NULL,
    detail TEXT,
    UNIQUE (asset_id, name)
);

-- Indexes
CREATE INDEX IF NOT EXISTS idx_assets_status ON assets(status);
CREATE INDEX IF NOT EXISTS idx_attributes_asset ON attributes(asset_id);
CREATE INDEX IF NOT EXISTS idx_attributes_name ON attributes(name);
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_creates_schema() {
        let db = Database::open_in_memory().unwrap();
        let count: i64 = db
            .conn()
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN ('assets', 'attributes')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 2);
    }

    #[test]
    fn test_open_file_backed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tracking.sqlite");
        {
            let db = Database::open(&path).unwrap();
            db.get_or_create_asset("host-1").unwrap();
        }
        // Reopen and confirm the row survived.
        let db = Database::open(&path).unwrap();
        assert!(db.get_asset("host-1").unwrap().is_some());
    }
}

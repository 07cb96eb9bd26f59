//! Attribute Store
//!
//! Durable mapping from (asset, attribute kind) to the last time that
//! monitoring source saw the asset. Upserts only ever move `last_seen`
//! forward; a replayed old event never rewinds a sighting.

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};
use serde::Serialize;

use super::Database;
use crate::error::{Error, Result};

/// A timestamped record that an attribute kind observed an asset.
#[derive(Debug, Clone, Serialize)]
pub struct Attribute {
    pub id: i64,
    pub asset_id: i64,
    pub name: String,
    pub last_seen: DateTime<Utc>,
    pub detail: Option<String>,
}

impl Attribute {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            asset_id: row.get("asset_id")?,
            name: row.get("name")?,
            last_seen: row.get("last_seen")?,
            detail: row.get("detail")?,
        })
    }
}

impl std::fmt::Display for Attribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Attribute: Name={}, Last Seen={}, Detail Length={}",
            self.name,
            self.last_seen.format("%Y-%m-%d %H:%M:%S"),
            self.detail.as_deref().map(str::len).unwrap_or(0),
        )
    }
}

/// Validate an attribute kind identifier.
fn validate_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(Error::Validation(
            "attribute kind must not be empty".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}

impl Database {
    /// Create or refresh the sighting for `(hostname, name)`. The row is
    /// only rewritten when `observed` is newer than what is stored.
    /// Returns the current sighting either way.
    pub fn upsert_sighting(
        &self,
        hostname: &str,
        name: &str,
        observed: DateTime<Utc>,
        detail: Option<&str>,
    ) -> Result<Attribute> {
        let name = validate_name(name)?;
        let asset = self.require_asset(hostname)?;

        let tx = self.conn().unchecked_transaction()?;
        let existing = tx
            .query_row(
                "SELECT * FROM attributes WHERE asset_id = ?1 AND name = ?2",
                params![asset.id, name],
                Attribute::from_row,
            )
            .optional()?;

        match existing {
            Some(attribute) if attribute.last_seen >= observed => {
                log::debug!(
                    "keeping newer sighting {}:{} ({} >= {})",
                    asset.hostname,
                    name,
                    attribute.last_seen,
                    observed
                );
                tx.commit()?;
                Ok(attribute)
            }
            Some(attribute) => {
                tx.execute(
                    "UPDATE attributes SET last_seen = ?1, detail = COALESCE(?2, detail)
                     WHERE id = ?3",
                    params![observed, detail, attribute.id],
                )?;
                tx.commit()?;
                self.get_sighting(hostname, &name)?
                    .ok_or_else(|| Error::Persistence("sighting vanished after update".to_string()))
            }
            None => {
                tx.execute(
                    "INSERT INTO attributes (asset_id, name, last_seen, detail)
                     VALUES (?1, ?2, ?3, ?4)",
                    params![asset.id, name, observed, detail],
                )?;
                tx.commit()?;
                self.get_sighting(hostname, &name)?
                    .ok_or_else(|| Error::Persistence("sighting vanished after insert".to_string()))
            }
        }
    }

    /// The current sighting for one attribute kind, if recorded.
    pub fn get_sighting(&self, hostname: &str, name: &str) -> Result<Option<Attribute>> {
        let name = validate_name(name)?;
        let asset = match self.get_asset(hostname)? {
            Some(asset) => asset,
            None => return Ok(None),
        };
        let attribute = self
            .conn()
            .query_row(
                "SELECT * FROM attributes WHERE asset_id = ?1 AND name = ?2",
                params![asset.id, name],
                Attribute::from_row,
            )
            .optional()?;
        Ok(attribute)
    }

    /// All current sightings for an asset; empty if none (or the asset is
    /// unregistered).
    pub fn list_sightings(&self, hostname: &str) -> Result<Vec<Attribute>> {
        let asset = match self.get_asset(hostname)? {
            Some(asset) => asset,
            None => return Ok(vec![]),
        };
        let mut stmt = self
            .conn()
            .prepare("SELECT * FROM attributes WHERE asset_id = ?1 ORDER BY name")?;
        let rows = stmt.query_map(params![asset.id], Attribute::from_row)?;
        let mut sightings = Vec::new();
        for row in rows {
            sightings.push(row?);
        }
        Ok(sightings)
    }

    /// Remove one attribute sighting. Returns false if it did not exist.
    pub fn delete_sighting(&self, hostname: &str, name: &str) -> Result<bool> {
        let name = validate_name(name)?;
        let asset = self.require_asset(hostname)?;
        let deleted = self.conn().execute(
            "DELETE FROM attributes WHERE asset_id = ?1 AND name = ?2",
            params![asset.id, name],
        )?;
        Ok(deleted > 0)
    }

    /// Remove every sighting for an asset (cascade for asset deletion).
    pub fn delete_sightings_for_asset(&self, hostname: &str) -> Result<usize> {
        let asset = self.require_asset(hostname)?;
        let deleted = self.conn().execute(
            "DELETE FROM attributes WHERE asset_id = ?1",
            params![asset.id],
        )?;
        Ok(deleted)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upsert_creates_then_refreshes() {
        let db = Database::open_in_memory().unwrap();
        db.get_or_create_asset("ws-1").unwrap();
        let t1 = Utc::now() - chrono::Duration::hours(2);
        let t2 = Utc::now();

        db.upsert_sighting("ws-1", "edr", t1, Some("agent v1")).unwrap();
        db.upsert_sighting("ws-1", "edr", t2, None).unwrap();

        let sightings = db.list_sightings("ws-1").unwrap();
        assert_eq!(sightings.len(), 1);
        assert_eq!(sightings[0].last_seen, t2);
        // Detail survives a refresh that carried none.
        assert_eq!(sightings[0].detail.as_deref(), Some("agent v1"));
    }

    #[test]
    fn test_upsert_ignores_older_event() {
        let db = Database::open_in_memory().unwrap();
        db.get_or_create_asset("ws-1").unwrap();
        let newer = Utc::now();
        let older = newer - chrono::Duration::days(1);

        db.upsert_sighting("ws-1", "av", newer, None).unwrap();
        let kept = db.upsert_sighting("ws-1", "av", older, Some("stale")).unwrap();
        assert_eq!(kept.last_seen, newer);
        assert_eq!(kept.detail, None);
    }

    #[test]
    fn test_upsert_requires_identifiers() {
        let db = Database::open_in_memory().unwrap();
        db.get_or_create_asset("ws-1").unwrap();
        assert!(matches!(
            db.upsert_sighting("ws-1", "", Utc::now(), None),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            db.upsert_sighting("", "edr", Utc::now(), None),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_delete_asset_cascades_sightings() {
        let db = Database::open_in_memory().unwrap();
        db.get_or_create_asset("ws-1").unwrap();
        db.upsert_sighting("ws-1", "edr", Utc::now(), None).unwrap();
        db.upsert_sighting("ws-1", "av", Utc::now(), None).unwrap();

        db.delete_asset("ws-1").unwrap();
        assert!(db.list_sightings("ws-1").unwrap().is_empty());
        let orphans: i64 = db
            .conn()
            .query_row("SELECT COUNT(*) FROM attributes", [], |row| row.get(0))
            .unwrap();
        assert_eq!(orphans, 0);
    }
}

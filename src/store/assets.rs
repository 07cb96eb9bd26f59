//! Asset Registry
//!
//! Durable mapping from hostname to asset record. Hostnames are
//! case-normalized to uppercase, matching how they appear in AD.

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};
use serde::Serialize;

use super::Database;
use crate::error::{Error, Result};
use crate::logic::status::{AssetKind, AssetStatus};

/// A tracked computing endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct Asset {
    pub id: i64,
    pub hostname: String,
    pub kind: AssetKind,
    pub status: AssetStatus,
    pub first_seen: DateTime<Utc>,
    pub last_seen: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

impl Asset {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let kind: String = row.get("kind")?;
        let status: String = row.get("status")?;
        Ok(Self {
            id: row.get("id")?,
            hostname: row.get("hostname")?,
            kind: AssetKind::parse(&kind).unwrap_or(AssetKind::Unknown),
            status: AssetStatus::parse(&status).unwrap_or(AssetStatus::Unknown),
            first_seen: row.get("first_seen")?,
            last_seen: row.get("last_seen")?,
            notes: row.get("notes")?,
        })
    }
}

impl std::fmt::Display for Asset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let last_seen = self
            .last_seen
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "never".to_string());
        write!(
            f,
            "Asset: Hostname={}, Kind={}, Status={}, First Seen={}, Last Seen={}",
            self.hostname,
            self.kind,
            self.status,
            self.first_seen.format("%Y-%m-%d %H:%M:%S"),
            last_seen,
        )
    }
}

/// Uppercase and validate a hostname identifier.
pub fn normalize_hostname(hostname: &str) -> Result<String> {
    let trimmed = hostname.trim();
    if trimmed.is_empty() {
        return Err(Error::Validation("hostname must not be empty".to_string()));
    }
    Ok(trimmed.to_uppercase())
}

impl Database {
    /// Look up an asset by hostname (case-insensitive).
    pub fn get_asset(&self, hostname: &str) -> Result<Option<Asset>> {
        let hostname = normalize_hostname(hostname)?;
        let asset = self
            .conn()
            .query_row(
                "SELECT * FROM assets WHERE hostname = ?1",
                params![hostname],
                Asset::from_row,
            )
            .optional()?;
        Ok(asset)
    }

    /// Look up an asset, failing with `NotFound` if it is not registered.
    pub fn require_asset(&self, hostname: &str) -> Result<Asset> {
        self.get_asset(hostname)?
            .ok_or_else(|| Error::NotFound(hostname.trim().to_uppercase()))
    }

    /// Return the existing asset or create a new one in the
    /// `unknown`/`unknown` state, registered now. `last_seen` stays empty
    /// until the first sighting so it always names a real observation.
    pub fn get_or_create_asset(&self, hostname: &str) -> Result<Asset> {
        let hostname = normalize_hostname(hostname)?;
        if let Some(asset) = self.get_asset(&hostname)? {
            return Ok(asset);
        }
        self.conn().execute(
            "INSERT INTO assets (hostname, kind, status, first_seen)
             VALUES (?1, 'unknown', 'unknown', ?2)",
            params![hostname, Utc::now()],
        )?;
        self.require_asset(&hostname)
    }

    /// All registered assets, ordered by hostname.
    pub fn list_assets(&self) -> Result<Vec<Asset>> {
        let mut stmt = self
            .conn()
            .prepare("SELECT * FROM assets ORDER BY hostname")?;
        let rows = stmt.query_map([], Asset::from_row)?;
        let mut assets = Vec::new();
        for row in rows {
            assets.push(row?);
        }
        Ok(assets)
    }

    /// Set the asset's status. Idempotent: returns false (and writes
    /// nothing) when the status is already `status`.
    pub fn update_asset_status(&self, hostname: &str, status: AssetStatus) -> Result<bool> {
        let asset = self.require_asset(hostname)?;
        if asset.status == status {
            return Ok(false);
        }
        self.conn().execute(
            "UPDATE assets SET status = ?1 WHERE id = ?2",
            params![status.as_str(), asset.id],
        )?;
        Ok(true)
    }

    /// Set the asset's derived kind. Idempotent like `update_asset_status`.
    pub fn update_asset_kind(&self, hostname: &str, kind: AssetKind) -> Result<bool> {
        let asset = self.require_asset(hostname)?;
        if asset.kind == kind {
            return Ok(false);
        }
        self.conn().execute(
            "UPDATE assets SET kind = ?1 WHERE id = ?2",
            params![kind.as_str(), asset.id],
        )?;
        Ok(true)
    }

    /// Move the asset's last-seen time forward. An older observation
    /// never rewinds it.
    pub fn touch_asset(&self, hostname: &str, observed: DateTime<Utc>) -> Result<()> {
        let asset = self.require_asset(hostname)?;
        match asset.last_seen {
            Some(current) if current >= observed => Ok(()),
            _ => {
                self.conn().execute(
                    "UPDATE assets SET last_seen = ?1 WHERE id = ?2",
                    params![observed, asset.id],
                )?;
                Ok(())
            }
        }
    }

    /// Delete an asset and all of its attribute sightings.
    pub fn delete_asset(&self, hostname: &str) -> Result<()> {
        let asset = self.require_asset(hostname)?;
        let tx = self.conn().unchecked_transaction()?;
        tx.execute("DELETE FROM attributes WHERE asset_id = ?1", params![asset.id])?;
        tx.execute("DELETE FROM assets WHERE id = ?1", params![asset.id])?;
        tx.commit()?;
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_or_create_normalizes_hostname() {
        let db = Database::open_in_memory().unwrap();
        let created = db.get_or_create_asset("srv-web-01").unwrap();
        assert_eq!(created.hostname, "SRV-WEB-01");
        assert_eq!(created.kind, AssetKind::Unknown);
        assert_eq!(created.status, AssetStatus::Unknown);

        // Lookup by any casing resolves to the same row.
        let again = db.get_or_create_asset("SRV-Web-01").unwrap();
        assert_eq!(again.id, created.id);
        assert_eq!(db.list_assets().unwrap().len(), 1);
    }

    #[test]
    fn test_empty_hostname_rejected() {
        let db = Database::open_in_memory().unwrap();
        assert!(matches!(
            db.get_or_create_asset("   "),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_update_status_is_idempotent() {
        let db = Database::open_in_memory().unwrap();
        db.get_or_create_asset("ws-1").unwrap();

        assert!(db.update_asset_status("ws-1", AssetStatus::Compliant).unwrap());
        assert!(!db.update_asset_status("ws-1", AssetStatus::Compliant).unwrap());
        assert_eq!(
            db.require_asset("ws-1").unwrap().status,
            AssetStatus::Compliant
        );
    }

    #[test]
    fn test_touch_never_rewinds() {
        let db = Database::open_in_memory().unwrap();
        db.get_or_create_asset("ws-1").unwrap();
        let newer = Utc::now() + chrono::Duration::hours(1);
        let older = Utc::now() - chrono::Duration::hours(1);

        db.touch_asset("ws-1", newer).unwrap();
        db.touch_asset("ws-1", older).unwrap();
        assert_eq!(db.require_asset("ws-1").unwrap().last_seen, Some(newer));
    }

    #[test]
    fn test_delete_unknown_asset_is_not_found() {
        let db = Database::open_in_memory().unwrap();
        assert!(matches!(db.delete_asset("ghost"), Err(Error::NotFound(_))));
    }
}

//! Report Export
//!
//! Flattens the database into a JSON report: one row per asset with a
//! column per attribute carrying that attribute's last-seen time.

use std::path::{Path, PathBuf};

use chrono::Utc;
use serde_json::{json, Map, Value};

use crate::error::{Error, Result};
use crate::store::Database;

/// Write the report into `dir` and return the file path.
///
/// Machine accounts (hostnames ending in `$`) are left out of the report;
/// deleting them stays an explicit operator action.
pub fn export_report(db: &Database, dir: &Path) -> Result<PathBuf> {
    let mut rows: Vec<Value> = Vec::new();

    for asset in db.list_assets()? {
        if asset.hostname.ends_with('$') {
            log::debug!("skipping machine account {}", asset.hostname);
            continue;
        }

        let mut row = Map::new();
        row.insert("hostname".to_string(), json!(asset.hostname));
        row.insert("kind".to_string(), json!(asset.kind));
        row.insert("status".to_string(), json!(asset.status));
        row.insert("first_seen".to_string(), json!(asset.first_seen));
        row.insert("last_seen".to_string(), json!(asset.last_seen));

        for attribute in db.list_sightings(&asset.hostname)? {
            row.insert(
                attribute.name.clone(),
                json!(attribute.last_seen.format("%Y-%m-%d %H:%M:%S").to_string()),
            );
        }
        rows.push(Value::Object(row));
    }

    std::fs::create_dir_all(dir).map_err(|e| Error::Persistence(e.to_string()))?;
    let stamp = Utc::now().format("%Y-%m-%dT%H-%M-%S");
    let path = dir.join(format!("asset_tracking_{}.json", stamp));
    let content = serde_json::to_string_pretty(&rows)
        .map_err(|e| Error::Persistence(e.to_string()))?;
    std::fs::write(&path, content).map_err(|e| Error::Persistence(e.to_string()))?;

    log::info!("exported {} assets to {}", rows.len(), path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_skips_machine_accounts() {
        let db = Database::open_in_memory().unwrap();
        db.get_or_create_asset("WS-1").unwrap();
        db.upsert_sighting("WS-1", "edr", Utc::now(), None).unwrap();
        db.get_or_create_asset("WS-2$").unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = export_report(&db, dir.path()).unwrap();

        let content = std::fs::read_to_string(path).unwrap();
        let rows: Vec<Value> = serde_json::from_str(&content).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["hostname"], "WS-1");
        assert!(rows[0].get("edr").is_some());
    }
}

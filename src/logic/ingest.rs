//! Ingestion Interface
//!
//! Single entry point for attribute-sighting events. Import adapters parse
//! their vendor logs and call `ingest` once per observed (asset, attribute)
//! pair; the generic JSON importer below covers sources that export flat
//! event arrays.

use std::path::Path;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::logic::policy::Policy;
use crate::logic::status::{evaluate, Evaluation};
use crate::store::Database;

/// Event keys tried, in order, for each field of an imported record.
const HOSTNAME_KEYS: [&str; 3] = ["hostname", "name", "displayName"];
const TIME_KEYS: [&str; 5] = [
    "last_observed",
    "event_time",
    "_time",
    "approximateLastSignInDateTime",
    "last_contact_time",
];
const DETAIL_KEYS: [&str; 1] = ["attribute_detail"];

/// Record one attribute sighting and re-evaluate the asset.
///
/// Creates the asset if this is the first time the hostname is seen,
/// moves its last-seen time forward, and upserts the sighting.
pub fn ingest(
    db: &Database,
    policy: &Policy,
    hostname: &str,
    attribute_kind: &str,
    observed: DateTime<Utc>,
    detail: Option<&str>,
) -> Result<Evaluation> {
    let asset = db.get_or_create_asset(hostname)?;
    db.touch_asset(&asset.hostname, observed)?;
    db.upsert_sighting(&asset.hostname, attribute_kind, observed, detail)?;
    evaluate(db, policy, &asset.hostname)
}

/// Outcome of a bulk import.
#[derive(Debug, Default)]
pub struct ImportSummary {
    pub imported: usize,
    pub skipped: usize,
}

/// Import a JSON array of events from `path`.
///
/// `source` names the attribute kind assigned to every event; when absent,
/// each event must carry its own `attribute_name`. Malformed events are
/// logged and skipped, never abort the import.
pub fn import_file(
    db: &Database,
    policy: &Policy,
    path: &Path,
    source: Option<&str>,
) -> Result<ImportSummary> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Import(format!("{}: {}", path.display(), e)))?;
    let data: Value = serde_json::from_str(&content)
        .map_err(|e| Error::Import(format!("{}: {}", path.display(), e)))?;
    let events = data
        .as_array()
        .ok_or_else(|| Error::Import(format!("{}: expected a JSON array", path.display())))?;

    if policy.is_empty() {
        log::warn!("zero security tools required; every asset with sightings will be compliant");
    }
    log::info!("parsing {} events for asset tracking", events.len());

    let mut summary = ImportSummary::default();
    for event in events {
        match import_event(db, policy, event, source) {
            Ok(()) => summary.imported += 1,
            Err(err) => {
                log::error!("skipping event: {}", err);
                summary.skipped += 1;
            }
        }
    }
    Ok(summary)
}

fn import_event(db: &Database, policy: &Policy, event: &Value, source: Option<&str>) -> Result<()> {
    let attribute_kind = match source {
        Some(name) => name.to_string(),
        None => event
            .get("attribute_name")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| Error::Import("no attribute_name in event".to_string()))?,
    };

    let hostname = first_string(event, &HOSTNAME_KEYS)
        .map(|h| strip_domain(&h))
        .ok_or_else(|| Error::Import("no hostname in event".to_string()))?;

    let raw_time = first_string(event, &TIME_KEYS)
        .ok_or_else(|| Error::Import(format!("no observation time for {}", hostname)))?;
    let observed = parse_observed(&raw_time)
        .ok_or_else(|| Error::Import(format!("unparseable observation time: {}", raw_time)))?;

    // Fall back to the whole event as proof of the sighting.
    let detail = first_string(event, &DETAIL_KEYS).unwrap_or_else(|| event.to_string());

    ingest(db, policy, &hostname, &attribute_kind, observed, Some(&detail))?;
    Ok(())
}

fn first_string(event: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| event.get(*key))
        .filter_map(Value::as_str)
        .map(str::to_string)
        .find(|s| !s.is_empty())
}

/// Reduce `DOMAIN\host` forms to the bare hostname.
fn strip_domain(hostname: &str) -> String {
    match hostname.rfind('\\') {
        Some(idx) => hostname[idx + 1..].to_string(),
        None => hostname.to_string(),
    }
}

/// Parse an observation timestamp: RFC 3339, or a naive
/// `Y-m-d H:M:S` / `Y-m-dTH:M:S` assumed to be UTC.
pub fn parse_observed(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    None
}

// ============================================================================
// TESTS
// ============================================================================

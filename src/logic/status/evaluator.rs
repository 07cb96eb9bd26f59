//! Status Evaluator
//!
//! Orchestrates one asset's evaluation: read sightings, apply the pure
//! rules, persist kind/status when they changed. Transitions are returned
//! to the caller rather than logged here.

use chrono::Utc;

use super::rules::{classify_kind, derive_status, evaluate_required};
use super::types::{AssetStatus, BatchEvaluation, Evaluation};
use crate::error::Result;
use crate::logic::policy::Policy;
use crate::store::Database;

/// Recompute one asset's kind and status from its current sightings.
///
/// Idempotent: a second call with no intervening ingestion derives the same
/// status and writes nothing.
pub fn evaluate(db: &Database, policy: &Policy, hostname: &str) -> Result<Evaluation> {
    let asset = db.require_asset(hostname)?;
    let sightings = db.list_sightings(&asset.hostname)?;

    let kind = classify_kind(&asset.hostname, policy);
    let check = evaluate_required(&sightings, policy, Utc::now());
    let status = derive_status(kind, check, !sightings.is_empty());

    if kind != asset.kind {
        db.update_asset_kind(&asset.hostname, kind)?;
    }
    let changed = status != asset.status;
    if changed {
        db.update_asset_status(&asset.hostname, status)?;
    }

    Ok(Evaluation {
        hostname: asset.hostname,
        kind,
        previous_status: asset.status,
        status,
        changed,
    })
}

/// Re-evaluate every registered asset.
///
/// Per-asset failures are collected and reported; one bad asset never
/// aborts the batch. Safe to re-run, since each evaluation is a pure
/// recomputation from durable state.
pub fn evaluate_all(db: &Database, policy: &Policy) -> Result<BatchEvaluation> {
    let mut batch = BatchEvaluation::default();
    for asset in db.list_assets()? {
        match evaluate(db, policy, &asset.hostname) {
            Ok(evaluation) => batch.evaluated.push(evaluation),
            Err(err) => {
                log::warn!("failed to evaluate {}: {}", asset.hostname, err);
                batch.failed.push((asset.hostname, err.to_string()));
            }
        }
    }
    Ok(batch)
}

/// Set an asset's status directly, bypassing derivation.
///
/// Operator escape hatch. Not sticky: the next `evaluate` recomputes the
/// status from current data. Returns false when the status already matched.
pub fn manual_override(db: &Database, hostname: &str, status: AssetStatus) -> Result<bool> {
    db.update_asset_status(hostname, status)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::status::types::AssetKind;
    use chrono::Duration;

    fn tracking_policy() -> Policy {
        let mut policy = Policy::unconfigured();
        policy.server_pattern = Some(regex::Regex::new(r"^SRV-").unwrap());
        policy.workstation_pattern = Some(regex::Regex::new(r"^WS-").unwrap());
        policy.require_all = vec!["edr".to_string(), "av".to_string()];
        policy.require_one = vec!["ad".to_string()];
        policy.freshness_window = Some(Duration::days(4));
        policy
    }

    fn seed(db: &Database, hostname: &str, attrs: &[(&str, i64)]) {
        db.get_or_create_asset(hostname).unwrap();
        for (name, age_days) in attrs {
            db.upsert_sighting(hostname, name, Utc::now() - Duration::days(*age_days), None)
                .unwrap();
        }
    }

    #[test]
    fn test_no_sightings_stays_unknown() {
        let db = Database::open_in_memory().unwrap();
        db.get_or_create_asset("WS-100").unwrap();

        let eval = evaluate(&db, &tracking_policy(), "WS-100").unwrap();
        assert_eq!(eval.status, AssetStatus::Unknown);
        assert!(!eval.changed);
    }

    #[test]
    fn test_fully_reporting_workstation_is_compliant() {
        let db = Database::open_in_memory().unwrap();
        seed(&db, "WS-100", &[("edr", 0), ("av", 1), ("ad", 2)]);

        let eval = evaluate(&db, &tracking_policy(), "WS-100").unwrap();
        assert_eq!(eval.kind, AssetKind::Workstation);
        assert_eq!(eval.status, AssetStatus::Compliant);
        assert!(eval.changed);
        assert_eq!(eval.previous_status, AssetStatus::Unknown);

        let asset = db.require_asset("WS-100").unwrap();
        assert_eq!(asset.kind, AssetKind::Workstation);
        assert_eq!(asset.status, AssetStatus::Compliant);
    }

    #[test]
    fn test_missing_required_tool_is_non_compliant() {
        let db = Database::open_in_memory().unwrap();
        seed(&db, "SRV-DB-01", &[("edr", 0), ("ad", 0)]);

        let eval = evaluate(&db, &tracking_policy(), "SRV-DB-01").unwrap();
        assert_eq!(eval.status, AssetStatus::NonCompliant);
    }

    #[test]
    fn test_unrecognized_hostname_failing_policy_is_rogue() {
        let db = Database::open_in_memory().unwrap();
        seed(&db, "MYSTERY-BOX", &[("ad", 0)]);

        let eval = evaluate(&db, &tracking_policy(), "MYSTERY-BOX").unwrap();
        assert_eq!(eval.kind, AssetKind::Unknown);
        assert_eq!(eval.status, AssetStatus::Rogue);
    }

    #[test]
    fn test_unrecognized_but_fully_reporting_is_compliant() {
        let db = Database::open_in_memory().unwrap();
        seed(&db, "MYSTERY-BOX", &[("edr", 0), ("av", 0), ("ad", 0)]);

        let eval = evaluate(&db, &tracking_policy(), "MYSTERY-BOX").unwrap();
        assert_eq!(eval.kind, AssetKind::Unknown);
        assert_eq!(eval.status, AssetStatus::Compliant);
    }

    #[test]
    fn test_evaluate_is_idempotent() {
        let db = Database::open_in_memory().unwrap();
        seed(&db, "WS-100", &[("edr", 0), ("av", 0), ("ad", 0)]);
        let policy = tracking_policy();

        let first = evaluate(&db, &policy, "WS-100").unwrap();
        assert!(first.changed);

        let second = evaluate(&db, &policy, "WS-100").unwrap();
        assert_eq!(second.status, first.status);
        assert!(!second.changed);
    }

    #[test]
    fn test_compliance_decays_with_time() {
        let db = Database::open_in_memory().unwrap();
        // All tools reported, but 5 days ago - outside the 4 day window.
        seed(&db, "WS-100", &[("edr", 5), ("av", 5), ("ad", 5)]);

        let eval = evaluate(&db, &tracking_policy(), "WS-100").unwrap();
        assert_eq!(eval.status, AssetStatus::NonCompliant);
    }

    #[test]
    fn test_empty_policy_is_vacuously_compliant() {
        let db = Database::open_in_memory().unwrap();
        seed(&db, "ANYTHING", &[("syslog", 30)]);

        let eval = evaluate(&db, &Policy::unconfigured(), "ANYTHING").unwrap();
        assert_eq!(eval.status, AssetStatus::Compliant);
    }

    #[test]
    fn test_evaluate_unknown_hostname_is_not_found() {
        let db = Database::open_in_memory().unwrap();
        assert!(matches!(
            evaluate(&db, &tracking_policy(), "GHOST"),
            Err(crate::error::Error::NotFound(_))
        ));
    }

    #[test]
    fn test_batch_continues_past_failures() {
        let db = Database::open_in_memory().unwrap();
        seed(&db, "WS-100", &[("edr", 0), ("av", 0), ("ad", 0)]);
        seed(&db, "WS-200", &[("edr", 0)]);
        // A row another process left unresolvable: empty hostname bypassing
        // normalization, so its evaluation fails while the batch goes on.
        db.conn()
            .execute(
                "INSERT INTO assets (hostname, first_seen) VALUES ('', datetime('now'))",
                [],
            )
            .unwrap();

        let policy = tracking_policy();
        let batch = evaluate_all(&db, &policy).unwrap();
        assert_eq!(batch.evaluated.len(), 2);
        assert_eq!(batch.failed.len(), 1);
        assert_eq!(batch.changed_count(), 2);

        // Second refresh with no new data changes nothing.
        let again = evaluate_all(&db, &policy).unwrap();
        assert_eq!(again.changed_count(), 0);
    }

    #[test]
    fn test_manual_override_holds_until_next_evaluation() {
        let db = Database::open_in_memory().unwrap();
        seed(&db, "WS-100", &[("edr", 0)]); // non-compliant by policy
        let policy = tracking_policy();
        evaluate(&db, &policy, "WS-100").unwrap();

        assert!(manual_override(&db, "WS-100", AssetStatus::Compliant).unwrap());
        assert_eq!(
            db.require_asset("WS-100").unwrap().status,
            AssetStatus::Compliant
        );

        // Refresh recomputes from data; the override does not stick.
        let eval = evaluate(&db, &policy, "WS-100").unwrap();
        assert_eq!(eval.status, AssetStatus::NonCompliant);
        assert!(eval.changed);
    }
}

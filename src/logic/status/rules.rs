//! Classification Rules
//!
//! The pure decision kernel: hostname kind, required-attribute
//! satisfaction, and status derivation. Deterministic, total over its
//! inputs, and free of I/O - absence of data, patterns, or thresholds all
//! have defined fallbacks.

use chrono::{DateTime, Utc};

use super::types::{AssetKind, AssetStatus, RequiredCheck};
use crate::logic::policy::Policy;
use crate::store::Attribute;

// ============================================================================
// HOSTNAME KIND
// ============================================================================

/// Classify a hostname against the configured naming standards.
///
/// The server pattern is tested first, so a hostname matching both
/// standards deterministically resolves to `Server`. An unconfigured
/// pattern never matches.
pub fn classify_kind(hostname: &str, policy: &Policy) -> AssetKind {
    if let Some(re) = &policy.server_pattern {
        if re.is_match(hostname) {
            return AssetKind::Server;
        }
    }
    if let Some(re) = &policy.workstation_pattern {
        if re.is_match(hostname) {
            return AssetKind::Workstation;
        }
    }
    AssetKind::Unknown
}

// ============================================================================
// REQUIRED ATTRIBUTES
// ============================================================================

/// Check the asset's sightings against the required-attribute sets.
///
/// A sighting satisfies its kind when the freshness window is unset or the
/// sighting is no older than the window. Empty required sets are vacuously
/// satisfied. Attribute kinds compare case-insensitively.
pub fn evaluate_required(
    sightings: &[Attribute],
    policy: &Policy,
    now: DateTime<Utc>,
) -> RequiredCheck {
    let fresh: Vec<String> = sightings
        .iter()
        .filter(|s| is_fresh(s.last_seen, policy, now))
        .map(|s| s.name.to_lowercase())
        .collect();

    RequiredCheck {
        all_satisfied: policy.require_all.iter().all(|kind| fresh.contains(kind)),
        one_satisfied: policy.require_one.is_empty()
            || policy.require_one.iter().any(|kind| fresh.contains(kind)),
    }
}

fn is_fresh(last_seen: DateTime<Utc>, policy: &Policy, now: DateTime<Utc>) -> bool {
    match policy.freshness_window {
        Some(window) => now - last_seen <= window,
        None => true,
    }
}

// ============================================================================
// STATUS DERIVATION
// ============================================================================

/// Derive the asset's status.
///
/// Precedence, exact and order-sensitive:
/// 1. no sighting ever recorded -> `Unknown` (newly discovered, not evaluable)
/// 2. both required checks pass -> `Compliant` (even for unknown-kind hosts)
/// 3. kind is `Unknown` -> `Rogue` (unrecognized hostname failing policy)
/// 4. otherwise -> `NonCompliant`
pub fn derive_status(kind: AssetKind, check: RequiredCheck, has_any_sighting: bool) -> AssetStatus {
    if !has_any_sighting {
        return AssetStatus::Unknown;
    }
    if check.satisfied() {
        return AssetStatus::Compliant;
    }
    if kind == AssetKind::Unknown {
        return AssetStatus::Rogue;
    }
    AssetStatus::NonCompliant
}

// ============================================================================
// TESTS
// ============================================================================

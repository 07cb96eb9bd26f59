//! Status Types
//!
//! Core enums and result types for asset classification.
//! No logic here - only data structures.

use serde::{Deserialize, Serialize};

// ============================================================================
// ASSET KIND
// ============================================================================

/// What kind of device a hostname names, per the configured naming standards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    Server,
    Workstation,
    Unknown,
}

impl AssetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetKind::Server => "server",
            AssetKind::Workstation => "workstation",
            AssetKind::Unknown => "unknown",
        }
    }

    pub fn values() -> [&'static str; 3] {
        ["server", "workstation", "unknown"]
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "server" => Some(AssetKind::Server),
            "workstation" => Some(AssetKind::Workstation),
            "unknown" => Some(AssetKind::Unknown),
            _ => None,
        }
    }
}

impl std::fmt::Display for AssetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// ASSET STATUS
// ============================================================================

/// Compliance status of an asset.
///
/// - `Compliant`: every required security attribute has recently reported.
/// - `NonCompliant`: a recognized hostname missing required attributes.
/// - `Unknown`: no attribute sighting recorded yet; not evaluable.
/// - `Rogue`: failing policy AND the hostname matches no naming standard -
///   a candidate unauthorized/unmanaged device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetStatus {
    Compliant,
    NonCompliant,
    Unknown,
    Rogue,
}

impl AssetStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetStatus::Compliant => "compliant",
            AssetStatus::NonCompliant => "non_compliant",
            AssetStatus::Unknown => "unknown",
            AssetStatus::Rogue => "rogue",
        }
    }

    pub fn values() -> [&'static str; 4] {
        ["compliant", "non_compliant", "unknown", "rogue"]
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "compliant" => Some(AssetStatus::Compliant),
            "non_compliant" => Some(AssetStatus::NonCompliant),
            "unknown" => Some(AssetStatus::Unknown),
            "rogue" => Some(AssetStatus::Rogue),
            _ => None,
        }
    }
}

impl std::fmt::Display for AssetStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// REQUIRED-ATTRIBUTE CHECK
// ============================================================================

/// Outcome of checking an asset's sightings against the required sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequiredCheck {
    /// Every kind in `require_all` has a fresh sighting (vacuously true if empty).
    pub all_satisfied: bool,
    /// At least one kind in `require_one` has a fresh sighting (vacuously true if empty).
    pub one_satisfied: bool,
}

impl RequiredCheck {
    pub fn satisfied(&self) -> bool {
        self.all_satisfied && self.one_satisfied
    }
}

// ============================================================================
// EVALUATION RESULT
// ============================================================================

/// Result of evaluating one asset. The transition is exposed here so the
/// calling layer can log or audit it; the evaluator itself stays quiet.
#[derive(Debug, Clone, Serialize)]
pub struct Evaluation {
    pub hostname: String,
    pub kind: AssetKind,
    pub previous_status: AssetStatus,
    pub status: AssetStatus,
    pub changed: bool,
}

/// Result of a full refresh over every registered asset.
#[derive(Debug, Default)]
pub struct BatchEvaluation {
    pub evaluated: Vec<Evaluation>,
    /// Hostnames that failed to evaluate, with the error text.
    pub failed: Vec<(String, String)>,
}

impl BatchEvaluation {
    pub fn changed_count(&self) -> usize {
        self.evaluated.iter().filter(|e| e.changed).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for value in AssetStatus::values() {
            assert_eq!(AssetStatus::parse(value).unwrap().as_str(), value);
        }
        assert!(AssetStatus::parse("bogus").is_none());
    }

    #[test]
    fn test_kind_round_trip() {
        for value in AssetKind::values() {
            assert_eq!(AssetKind::parse(value).unwrap().as_str(), value);
        }
    }
}

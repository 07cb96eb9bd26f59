//! Policy Configuration
//!
//! The resolved compliance policy: hostname classification patterns and
//! required-attribute sets. Built once from `Settings` at startup and
//! immutable for the run. Bad patterns or a bad freshness value are fatal
//! here rather than surfacing per-classification.

use chrono::Duration;
use regex::Regex;

use crate::config::Settings;
use crate::error::{Error, Result};

/// Resolved, precompiled compliance policy.
#[derive(Debug, Clone)]
pub struct Policy {
    /// Matches hostnames following the server naming standard.
    pub server_pattern: Option<Regex>,

    /// Matches hostnames following the workstation naming standard.
    pub workstation_pattern: Option<Regex>,

    /// Attribute kinds that must ALL have a fresh sighting (lowercased).
    pub require_all: Vec<String>,

    /// Attribute kinds of which at least ONE must have a fresh sighting (lowercased).
    pub require_one: Vec<String>,

    /// Maximum age of a sighting still counted as reporting.
    /// `None` disables the staleness check.
    pub freshness_window: Option<Duration>,
}

impl Policy {
    /// Compile and validate a policy from raw settings.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let server_pattern = compile_pattern(&settings.server_pattern)?;
        let workstation_pattern = compile_pattern(&settings.workstation_pattern)?;

        let days: i64 = settings.freshness_days.trim().parse().map_err(|_| {
            Error::Policy(format!(
                "invalid freshness window: {:?} (expected whole days)",
                settings.freshness_days
            ))
        })?;
        let freshness_window = if days > 0 {
            Some(Duration::days(days))
        } else {
            None
        };

        Ok(Self {
            server_pattern,
            workstation_pattern,
            require_all: lowercase_all(&settings.require_all),
            require_one: lowercase_all(&settings.require_one),
            freshness_window,
        })
    }

    /// Empty policy: no patterns, no required attributes, no staleness check.
    pub fn unconfigured() -> Self {
        Self {
            server_pattern: None,
            workstation_pattern: None,
            require_all: vec![],
            require_one: vec![],
            freshness_window: None,
        }
    }

    /// True when no attribute requirements are configured at all.
    /// Every asset with any sighting history is then vacuously compliant.
    pub fn is_empty(&self) -> bool {
        self.require_all.is_empty() && self.require_one.is_empty()
    }
}

/// Compile an optional pattern; empty string means unconfigured.
fn compile_pattern(raw: &str) -> Result<Option<Regex>> {
    if raw.trim().is_empty() {
        return Ok(None);
    }
    let re = Regex::new(raw).map_err(|e| Error::Policy(format!("invalid pattern {:?}: {}", raw, e)))?;
    Ok(Some(re))
}

fn lowercase_all(items: &[String]) -> Vec<String> {
    items.iter().map(|s| s.to_lowercase()).collect()
}

// ============================================================================
// TESTS
// ============================================================================

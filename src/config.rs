//! Configuration module
//!
//! Raw settings read from the environment once at startup. Pattern strings
//! and the freshness window are kept as text here; `Policy::from_settings`
//! compiles and validates them.

use std::path::PathBuf;

use crate::constants;

/// Application settings, resolved from environment variables.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Path to the SQLite database file.
    pub database_path: PathBuf,

    /// Regex matching server hostnames (empty = unconfigured).
    pub server_pattern: String,

    /// Regex matching workstation hostnames (empty = unconfigured).
    pub workstation_pattern: String,

    /// Comma-separated attribute kinds that must ALL report.
    pub require_all: Vec<String>,

    /// Comma-separated attribute kinds of which at least ONE must report.
    pub require_one: Vec<String>,

    /// Freshness window in days, as text. "0" disables the staleness check.
    pub freshness_days: String,
}

impl Settings {
    /// Load settings from environment variables.
    pub fn from_env() -> Self {
        let database_path = constants::env_var("ASSET_TRACKING_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| constants::get_data_dir().join(constants::DATABASE_FILE_NAME));

        Self {
            database_path,

            server_pattern: constants::env_var("ASSET_TRACKING_SERVER_PATTERN")
                .unwrap_or_default(),

            workstation_pattern: constants::env_var("ASSET_TRACKING_WORKSTATION_PATTERN")
                .unwrap_or_default(),

            require_all: split_list(
                &constants::env_var("ASSET_TRACKING_REQUIRE_ALL").unwrap_or_default(),
            ),

            require_one: split_list(
                &constants::env_var("ASSET_TRACKING_REQUIRE_ONE").unwrap_or_default(),
            ),

            freshness_days: constants::env_var("ASSET_TRACKING_FRESHNESS_DAYS")
                .unwrap_or_else(|| constants::DEFAULT_FRESHNESS_DAYS.to_string()),
        }
    }
}

/// Split a comma-separated list, trimming entries and dropping empties.
fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

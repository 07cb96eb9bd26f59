//! Central Configuration Constants
//!
//! Single source of truth for all configuration defaults.
//! To change a default, only edit this file.

use std::path::PathBuf;

/// Default freshness window in days. An attribute sighting older than this
/// no longer counts toward compliance. `0` disables the staleness check.
pub const DEFAULT_FRESHNESS_DAYS: i64 = 4;

/// Database file name inside the data directory.
pub const DATABASE_FILE_NAME: &str = "asset_tracking.sqlite";

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// App name
pub const APP_NAME: &str = "asset-tracking";

// ============================================
// Helper functions to read from env with fallback
// ============================================

/// Get an env var, treating the empty string as unset.
pub fn env_var(name: &str) -> Option<String> {
    match std::env::var(name) {
        Ok(val) if !val.trim().is_empty() => Some(val),
        _ => None,
    }
}

/// Data directory: `ASSET_TRACKING_DATA_DIR` or the platform-local app data dir.
pub fn get_data_dir() -> PathBuf {
    if let Some(dir) = env_var("ASSET_TRACKING_DATA_DIR") {
        return PathBuf::from(dir);
    }
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

//! Error handling
//!
//! One error taxonomy for the whole crate. Classification logic itself
//! never fails; these cover identifiers, configuration and the backing store.

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed identifier (empty hostname, empty attribute kind).
    #[error("validation error: {0}")]
    Validation(String),

    /// Operation referenced a hostname that is not registered.
    #[error("asset not found: {0}")]
    NotFound(String),

    /// Malformed policy configuration (bad regex, bad freshness duration).
    /// Fatal for the run, detected at policy load.
    #[error("policy error: {0}")]
    Policy(String),

    /// Backing store failure.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// Import data could not be read or parsed.
    #[error("import error: {0}")]
    Import(String),
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Persistence(err.to_string())
    }
}

// ============================================================================
// TESTS
// ============================================================================

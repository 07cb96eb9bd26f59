//! Status Module
//!
//! Asset compliance classification.
//!
//! ## Structure
//! - `types`: Core types (AssetKind, AssetStatus, RequiredCheck, Evaluation)
//! - `rules`: Pure classification kernel (no I/O, never fails)
//! - `evaluator`: Orchestration against the store

pub mod evaluator;
pub mod rules;
pub mod types;

// Re-export main types for convenience
pub use evaluator::{evaluate, evaluate_all, manual_override};
pub use types::{AssetKind, AssetStatus, Evaluation};

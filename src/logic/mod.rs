//! Domain logic: policy, classification, ingestion, reporting.

pub mod export;
pub mod ingest;
pub mod policy;
pub mod status;

//! CLI command implementations.

pub mod ask;
pub mod config;
pub mod doctor;
pub mod ingest;
pub mod serve;

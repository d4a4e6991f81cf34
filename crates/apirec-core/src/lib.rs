//! # apirec-core
//!
//! Core types, configuration, and utilities for apirec.
//!
//! This crate provides shared functionality used across all apirec crates:
//!
//! - **Configuration**: Loading, validation, and persistence of the JSON5 config file
//! - **Types**: Catalog records, index metadata, and recommendation records
//! - **Utilities**: Path resolution, environment handling, and secret strings

pub mod config;
pub mod env;
pub mod error;
pub mod paths;
pub mod secret;
pub mod types;

// Re-exports for convenience
pub use config::Config;
pub use error::ConfigError;
pub use secret::SecretString;
pub use types::*;

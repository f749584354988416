//! Core types: run configuration and the error taxonomy

pub mod config;
pub mod error;

pub use config::UpgradeRequest;
pub use error::UpgradeError;

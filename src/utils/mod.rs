//! Shared utilities

pub mod prompt;
pub mod spinner;

//! Error types for ratecheck.

use thiserror::Error;

use crate::ratelimit::WindowIndex;

/// Main error type for ratecheck operations.
///
/// The predicates themselves never fail. Errors are raised where raw
/// input is turned into typed counters, policies and snapshots.
#[derive(Error, Debug)]
pub enum RatecheckError {
    /// A counter mapping lacks one of the five fixed windows
    #[error("Missing counter for window {0}")]
    MissingWindow(WindowIndex),

    /// Structurally invalid input (wrong counter array length, etc.)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Snapshot parsing errors
    #[error("Snapshot error: {0}")]
    Snapshot(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<config::ConfigError> for RatecheckError {
    fn from(e: config::ConfigError) -> Self {
        RatecheckError::Config(e.to_string())
    }
}

/// Result type alias for ratecheck operations.
pub type Result<T> = std::result::Result<T, RatecheckError>;

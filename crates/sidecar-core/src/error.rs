//! Error types for the sidecar
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for sidecar operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the sidecar
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// The address to publish could not be determined
    #[error("Address unavailable: {0}")]
    AddressUnavailable(String),

    /// The directory service rejected or failed to process a change
    #[error("Change submission failed: {0}")]
    Submission(String),

    /// A change status query failed
    #[error("Change status query failed: {0}")]
    Query(String),

    /// Too many status queries failed while waiting for a change to propagate
    #[error("Gave up waiting for propagation after {failures} failed status queries: {last_error}")]
    PropagationUnconfirmed {
        /// Number of failed queries in the wait call
        failures: usize,
        /// Rendered last query error
        last_error: String,
    },

    /// Retracting the record failed during teardown
    #[error("Failed to retract record: {0}")]
    RetractFailed(Box<Error>),

    /// Installing termination signal handlers failed
    #[error("Signal handler error: {0}")]
    Signal(#[from] std::io::Error),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an address resolution error
    pub fn address(msg: impl Into<String>) -> Self {
        Self::AddressUnavailable(msg.into())
    }

    /// Create a change submission error
    pub fn submission(msg: impl Into<String>) -> Self {
        Self::Submission(msg.into())
    }

    /// Create a status query error
    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }

    /// Whether this error happened before any DNS action was taken
    ///
    /// Configuration and address resolution problems are startup errors;
    /// everything else is a runtime failure.
    pub fn is_startup(&self) -> bool {
        matches!(self, Self::Config(_) | Self::AddressUnavailable(_))
    }
}

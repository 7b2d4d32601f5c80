//! Error types for feature discovery.

use thiserror::Error;

/// Failure of a single driver operation.
///
/// Every backend maps its native failures onto this type, so upper layers can
/// tell a missing element apart from a backend that stopped answering.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DriverError {
    /// The automation backend rejected or failed the call
    #[error("Backend error: {0}")]
    Backend(String),

    /// No element at the requested position for the selector
    #[error("Element not found: {selector} (index {index})")]
    ElementNotFound {
        /// Selector that was resolved
        selector: String,
        /// Position requested within the match list
        index: usize,
    },

    /// Operation exceeded its time budget
    #[error("Timeout after {timeout_ms}ms during {operation}")]
    Timeout {
        /// Operation name, e.g. "click"
        operation: String,
        /// Budget that was exceeded
        timeout_ms: u64,
    },

    /// Navigation to a URL failed
    #[error("Navigation to {url} failed: {reason}")]
    Navigation {
        /// Target URL
        url: String,
        /// Backend-supplied reason
        reason: String,
    },
}

impl DriverError {
    /// Shorthand for a backend failure.
    pub fn backend(message: impl Into<String>) -> Self {
        DriverError::Backend(message.into())
    }

    /// Whether this error means the element was missing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, DriverError::ElementNotFound { .. })
    }
}

/// Result type for driver operations.
pub type DriverResult<T> = std::result::Result<T, DriverError>;

/// Main error type for feature discovery operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Driver failure that escaped to a caller expecting a fatal error
    #[error(transparent)]
    Driver(#[from] DriverError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Backend name that no driver implements
    #[error("Unsupported backend: {0}")]
    UnsupportedBackend(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parse errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Invalid input or parameters (generic)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Generic error with custom message
    #[error("{0}")]
    Other(String),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

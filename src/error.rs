//! Error taxonomy shared by every operation

use thiserror::Error;

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Stable error codes, used for machine-readable output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or invalid configuration
    Configuration,
    /// Bad operation arguments
    Validation,
    /// Access code absent from the registry
    NotFound,
    /// Operation would break a record invariant
    InvalidState,
    /// Network or HTTP failure on a remote exchange
    Transport,
}

impl ErrorKind {
    /// Get the error code string
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Configuration => "CONFIGURATION",
            Self::Validation => "VALIDATION",
            Self::NotFound => "NOT_FOUND",
            Self::InvalidState => "INVALID_STATE",
            Self::Transport => "TRANSPORT",
        }
    }
}

/// Errors returned by the registry, the client and the facade.
///
/// `Clone` so that a single fetch result can be handed to every caller
/// waiting on it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Configuration could not be loaded or is incomplete
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Arguments rejected before any network call
    #[error("validation error: {0}")]
    Validation(String),

    /// No record with this access code
    #[error("no record found with access code: {0}")]
    NotFound(String),

    /// Record is not in a state that allows the operation
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Remote exchange failed
    #[error("transport error{}: {message}", status_suffix(.status))]
    Transport {
        /// HTTP status, when a response was received
        status: Option<u16>,
        /// Failure description, or the response body for non-2xx replies
        message: String,
    },
}

#[allow(clippy::ref_option)]
fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {s})")).unwrap_or_default()
}

impl Error {
    /// Create a configuration error
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Create a validation error
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a transport error without an HTTP status
    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            status: None,
            message: message.into(),
        }
    }

    /// Get the stable kind of this error
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::Validation(_) => ErrorKind::Validation,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::InvalidState(_) => ErrorKind::InvalidState,
            Self::Transport { .. } => ErrorKind::Transport,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport {
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }
}

/*
[INPUT]:  Error sources (HTTP, API, serialization, session state, token checks, storage)
[OUTPUT]: Structured error types with taxonomy and retry hints
[POS]:    Error handling layer - unified error types for entire crate
[UPDATE]: When adding new error sources or improving error messages
*/

use reqwest::StatusCode;
use thiserror::Error;

use crate::auth::TokenRejection;

/// Main error type for the auth client
#[derive(Error, Debug)]
pub enum FusedError {
    /// HTTP request failed before a response arrived
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned a non-success status
    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// Request exceeded its deadline
    #[error("Request timed out after {seconds}s")]
    Timeout { seconds: u64 },

    /// Caller cancelled a pending request
    #[error("Request cancelled")]
    Cancelled,

    /// Response body was not the JSON we expected, or was unusable
    #[error("Invalid response: {0}")]
    Protocol(String),

    /// No registration code is pending
    #[error("No pending registration code; call register first")]
    NotRegistered,

    /// No stored bearer token
    #[error("Not authenticated; register and log in first")]
    NotAuthenticated,

    /// Stored or received token failed validation
    #[error("Bearer token rejected: {0}")]
    TokenInvalid(#[from] TokenRejection),

    /// Credential store failure
    #[error("Credential storage error: {0}")]
    Storage(#[from] std::io::Error),

    /// URL parsing failed
    #[error("Invalid URL: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Coarse error classes callers branch on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transport,
    Protocol,
    State,
    TokenInvalid,
    Storage,
    Config,
}

impl FusedError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FusedError::Http(_)
            | FusedError::Api { .. }
            | FusedError::Timeout { .. }
            | FusedError::Cancelled => ErrorKind::Transport,
            FusedError::Protocol(_) => ErrorKind::Protocol,
            FusedError::NotRegistered | FusedError::NotAuthenticated => ErrorKind::State,
            FusedError::TokenInvalid(_) => ErrorKind::TokenInvalid,
            FusedError::Storage(_) => ErrorKind::Storage,
            FusedError::UrlParse(_) | FusedError::Config(_) => ErrorKind::Config,
        }
    }

    /// Check if repeating the same call may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            FusedError::Http(_) | FusedError::Timeout { .. } | FusedError::Cancelled => true,
            FusedError::Api { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    /// Check if the only remedy is a fresh register + login
    pub fn requires_reauthentication(&self) -> bool {
        matches!(
            self,
            FusedError::TokenInvalid(_) | FusedError::NotAuthenticated
        ) || matches!(self, FusedError::Api { status, .. } if *status == 401)
    }

    /// Create an API error from status code and message
    pub fn api_error(status: StatusCode, message: impl Into<String>) -> Self {
        FusedError::Api {
            status: status.as_u16(),
            message: message.into(),
        }
    }
}

/// Result type alias for auth client operations
pub type Result<T> = std::result::Result<T, FusedError>;

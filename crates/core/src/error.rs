//! Error types for the Manta client
//!
//! Callers branch on the variant only where an algorithm needs to tell
//! "missing" apart from "failed" (parent-creating mkdir, `type_of`).
//! Everything else is propagated unchanged.

use serde::Deserialize;
use thiserror::Error;

/// Service error code returned when a directory's parent does not exist
pub const DIRECTORY_DOES_NOT_EXIST: &str = "DirectoryDoesNotExist";

/// Service error code returned for a missing object or directory
pub const RESOURCE_NOT_FOUND: &str = "ResourceNotFound";

/// Result type alias for manta operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for manta operations
#[derive(Error, Debug)]
pub enum Error {
    /// The caller violated a precondition of the operation
    #[error("Usage error: {0}")]
    Usage(String),

    /// The service answered with an unexpected status
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The exchange succeeded but the body failed verification
    #[error("Integrity error: {0}")]
    Integrity(String),

    /// The path does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// The service sent something this client cannot interpret
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The transport failed before a response was received
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// The service error code, if this is an API error that carried one
    pub fn api_code(&self) -> Option<&str> {
        match self {
            Error::Api(e) => e.code.as_deref(),
            _ => None,
        }
    }

    /// The HTTP status, if this is an API error
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Api(e) => Some(e.status),
            _ => None,
        }
    }

    /// Whether this error means the path (or its parent) does not exist
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::NotFound(_) => true,
            Error::Api(_) => matches!(
                self.api_code(),
                Some(RESOURCE_NOT_FOUND) | Some(DIRECTORY_DOES_NOT_EXIST)
            ),
            _ => false,
        }
    }
}

/// An unexpected response from the storage service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    /// HTTP status code of the response
    pub status: u16,
    /// Service error code, e.g. `DirectoryDoesNotExist`
    pub code: Option<String>,
    /// Human readable message
    pub message: String,
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.code {
            Some(code) => write!(f, "API error ({}): {}: {}", self.status, code, self.message),
            None => write!(f, "API error ({}): {}", self.status, self.message),
        }
    }
}

impl std::error::Error for ApiError {}

#[derive(Deserialize)]
struct ErrorBody {
    code: Option<String>,
    message: Option<String>,
}

impl ApiError {
    /// Build an API error from a response status and body.
    ///
    /// The service sends `{"code": ..., "message": ...}`. Anything else is
    /// kept verbatim as the message.
    pub fn from_response(status: u16, body: &[u8]) -> Self {
        if let Ok(parsed) = serde_json::from_slice::<ErrorBody>(body) {
            return Self {
                status,
                code: parsed.code,
                message: parsed.message.unwrap_or_default(),
            };
        }

        let text = String::from_utf8_lossy(body).trim().to_string();
        let message = if text.is_empty() {
            http::StatusCode::from_u16(status)
                .ok()
                .and_then(|s| s.canonical_reason())
                .unwrap_or("unexpected status")
                .to_string()
        } else {
            text
        };

        Self {
            status,
            code: None,
            message,
        }
    }
}

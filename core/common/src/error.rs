//! Common error types for drivekit.

use thiserror::Error;

/// Top-level error type for drivekit operations.
#[derive(Debug, Error)]
pub enum Error {
    /// No credential is held by the client making the call.
    #[error("Not authenticated: authorize before calling the Drive API")]
    Unauthenticated,

    /// Endpoint table or client configuration is incomplete or invalid.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The Drive API answered with a non-success status.
    ///
    /// Displays as the server-provided message, verbatim.
    #[error("{message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Message from the JSON error body.
        message: String,
    },

    /// A response body could not be decoded as the expected JSON.
    #[error("Malformed response: {0}")]
    Decode(String),

    /// Transport-level failure.
    #[error("Network error: {0}")]
    Network(String),

    /// OAuth2 exchange failed.
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid input provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    /// HTTP status of a remote API failure, if this is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Result type alias using the common Error.
pub type Result<T> = std::result::Result<T, Error>;

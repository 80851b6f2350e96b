//! Server error types.

use thiserror::Error;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors raised outside a single availability request: configuration and
/// encoding of response bodies.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Protocol error (encoding, decoding).
    #[error("Protocol error: {0}")]
    Protocol(#[from] commonslot_protocol::ProtocolError),

    /// Configuration error.
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl ServerError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

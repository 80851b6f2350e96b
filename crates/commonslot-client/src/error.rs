//! Client error types.

use thiserror::Error;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur in the client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Secret reference could not be resolved.
    #[error("secret error: {0}")]
    Secret(String),

    /// Provider could not be constructed.
    #[error("provider error: {0}")]
    Provider(#[from] commonslot_providers::ProviderError),

    /// Engine error outside a single request.
    #[error(transparent)]
    Server(#[from] commonslot_server::ServerError),

    /// Request or response document error.
    #[error("protocol error: {0}")]
    Protocol(#[from] commonslot_protocol::ProtocolError),

    /// The availability request was rejected or failed.
    #[error("{message} (HTTP {status})")]
    Request { status: u16, message: String },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

impl From<commonslot_protocol::ErrorResponse> for ClientError {
    fn from(err: commonslot_protocol::ErrorResponse) -> Self {
        Self::Request {
            status: err.status_code(),
            message: err.error,
        }
    }
}

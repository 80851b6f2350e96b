//! Protocol error types.

use thiserror::Error;

/// Result type for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Errors that can occur while decoding or encoding protocol documents.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The document is not valid JSON for the expected type.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The document was empty.
    #[error("empty document")]
    Empty,

    /// IO error while reading a document.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

//! Client error types

use serde_json::Value;
use storefront_core::ValidationError;
use thiserror::Error;

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors surfaced by client operations
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request could not complete at the transport level
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),

    /// The server answered with an error envelope
    #[error("{message}")]
    Api {
        status: u16,
        message: String,
        details: Option<Value>,
    },

    /// Rejected locally; no request was made
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A success response that does not match the wire contract
    #[error("unexpected response shape: {0}")]
    Decode(#[from] serde_json::Error),

    /// Token persistence failed
    #[error("token storage: {0}")]
    Storage(String),

    /// The operation was superseded by a logout before it could commit
    #[error("operation superseded by logout")]
    Cancelled,
}

impl ClientError {
    /// HTTP status when the server reported the failure
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

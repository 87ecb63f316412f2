//! Error types for the RPC client

use srpc_rpc_types::{CodecError, ErrorKind};
use srpc_transport::TransportError;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    /// Connecting, sending or receiving failed
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// The request could not be encoded or the response decoded
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    /// A value did not have the expected shape
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{operation} timed out after {timeout:?}")]
    Timeout {
        operation: &'static str,
        timeout: Duration,
    },

    /// The server answered with an error. Displays the server's message as is.
    #[error("{message}")]
    Remote { kind: ErrorKind, message: String },
}

impl ClientError {
    pub fn timeout(operation: &'static str, timeout: Duration) -> Self {
        Self::Timeout { operation, timeout }
    }

    /// The kind of a remote error, `None` for local failures.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            ClientError::Remote { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    pub fn is_remote_kind(&self, kind: ErrorKind) -> bool {
        self.kind() == Some(kind)
    }
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;

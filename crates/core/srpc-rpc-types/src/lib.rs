//! Wire envelope for the secure RPC protocol.
//!
//! One [`Request`] travels per connection and exactly one [`Response`] comes back.
//! Values are carried as JSON; see [`codec`] for the byte encoding.

use serde::{Deserialize, Serialize};
use srpc_identity_core::Token;

pub mod codec;

pub use codec::{CodecError, decode, encode};

/// A single remote call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    /// The method name to call.
    pub name: String,

    /// Positional arguments.
    #[serde(default)]
    pub args: Vec<serde_json::Value>,

    /// Proof of authentication, required by secure methods.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Token>,
}

impl Request {
    pub fn new(name: impl Into<String>, args: Vec<serde_json::Value>) -> Self {
        Self {
            name: name.into(),
            args,
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, metadata: Option<Token>) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Category of a failed call, sent alongside the message so clients can
/// branch on it instead of parsing text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    DuplicateUser,
    UserNotFound,
    InvalidCredentials,
    PermissionDenied,
    MethodNotFound,
    InvalidParams,
    Internal,
}

/// Error information returned in place of a result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteError {
    pub kind: ErrorKind,

    /// Human-readable message.
    pub message: String,
}

impl RemoteError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Outcome of a call. Exactly one of `result` and `error` is meaningful:
/// when `error` is present the result is absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// The return value (present on success, may be absent for unit results).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,

    /// Error information (present on failure).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RemoteError>,
}

impl Response {
    /// Creates a successful response.
    pub fn success(result: serde_json::Value) -> Self {
        Self {
            result: Some(result),
            error: None,
        }
    }

    /// Creates an error response.
    pub fn failure(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            result: None,
            error: Some(RemoteError::new(kind, message)),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

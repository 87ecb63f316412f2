//! Errors raised while dispatching a request.
//!
//! Every variant is turned into a [`Response`](srpc_rpc_types::Response) error at
//! the dispatcher boundary; none of them reach the wire as anything but a
//! kind and a message.

use srpc_identity_core::IdentityError;
use srpc_rpc_types::ErrorKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DispatchError {
    /// The caller lacks a valid administrator token for a secure method
    #[error("Secure operation '{method}' requires admin privileges")]
    PermissionDenied { method: String },

    /// No service exposes the method
    #[error("Method '{0}' not found")]
    MethodNotFound(String),

    /// The positional arguments do not fit the method's parameters
    #[error("Invalid params for '{method}': {reason}")]
    InvalidParams { method: String, reason: String },

    /// A service operation failed
    #[error(transparent)]
    Identity(#[from] IdentityError),

    /// The result could not be encoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DispatchError {
    pub fn invalid_params<M: Into<String>, R: Into<String>>(method: M, reason: R) -> Self {
        Self::InvalidParams {
            method: method.into(),
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            DispatchError::PermissionDenied { .. } => ErrorKind::PermissionDenied,
            DispatchError::MethodNotFound(_) => ErrorKind::MethodNotFound,
            DispatchError::InvalidParams { .. } => ErrorKind::InvalidParams,
            DispatchError::Identity(IdentityError::DuplicateUser(_)) => ErrorKind::DuplicateUser,
            DispatchError::Identity(IdentityError::UserNotFound(_)) => ErrorKind::UserNotFound,
            DispatchError::Identity(IdentityError::InvalidCredentials) => {
                ErrorKind::InvalidCredentials
            }
            DispatchError::Identity(_) | DispatchError::Serialization(_) => ErrorKind::Internal,
        }
    }
}

/// Convenience type alias for dispatch results
pub type DispatchResult<T> = Result<T, DispatchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_errors_keep_their_kind_and_text() {
        let error = DispatchError::from(IdentityError::DuplicateUser("gciatto".to_string()));
        assert_eq!(error.kind(), ErrorKind::DuplicateUser);
        assert_eq!(error.to_string(), "User with ID gciatto already exists");

        let error = DispatchError::from(IdentityError::InvalidCredentials);
        assert_eq!(error.kind(), ErrorKind::InvalidCredentials);

        let error = DispatchError::from(IdentityError::Signing("boom".to_string()));
        assert_eq!(error.kind(), ErrorKind::Internal);
    }

    #[test]
    fn test_permission_denied_message() {
        let error = DispatchError::PermissionDenied {
            method: "get_user".to_string(),
        };
        assert_eq!(error.kind(), ErrorKind::PermissionDenied);
        assert!(error.to_string().starts_with("Secure operation"));
    }
}

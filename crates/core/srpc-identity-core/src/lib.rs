//! Core identity types and the capability traits shared by the server-side
//! services and their remote client facades.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

mod types;

pub use types::{Credentials, Role, Token, User};

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("User with ID {0} already exists")]
    DuplicateUser(String),

    #[error("User with ID {0} not found")]
    UserNotFound(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Password hashing failed: {0}")]
    PasswordHash(String),

    #[error("Token signing failed: {0}")]
    Signing(String),

    #[error("Invalid token duration: {0}")]
    InvalidDuration(String),
}

pub type IdentityResult<T> = Result<T, IdentityError>;

/// Directory of users keyed by id.
///
/// Implemented in-process by the local store and remotely by the client facade,
/// each with its own error type.
#[async_trait]
pub trait UserDatabase: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Inserts a new user. Fails if a user with the same id exists.
    async fn add_user(&self, user: User) -> Result<(), Self::Error>;

    /// Returns the redacted user with the given id.
    async fn get_user(&self, id: &str) -> Result<User, Self::Error>;

    /// Whether a user with `credentials.id` exists and has `credentials.password`.
    ///
    /// An unknown id or wrong password is `Ok(false)`, not an error.
    async fn check_password(&self, credentials: &Credentials) -> Result<bool, Self::Error>;
}

/// Issues and validates signed, expiring tokens.
#[async_trait]
pub trait AuthenticationService: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Issues a token valid for `duration`, or the service default when `None`.
    async fn authenticate(
        &self,
        credentials: &Credentials,
        duration: Option<Duration>,
    ) -> Result<Token, Self::Error>;

    /// Whether the token carries a genuine signature and has not expired.
    async fn validate_token(&self, token: &Token) -> Result<bool, Self::Error>;

    /// Secured user read. Exposed on the wire as `get_user`; authorization
    /// is decided by the dispatcher before this is reached.
    async fn get_user_with_token(
        &self,
        id: &str,
        metadata: Option<&Token>,
    ) -> Result<User, Self::Error>;
}

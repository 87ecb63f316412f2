//! Authorization gate for secure methods.

use crate::error::{DispatchError, DispatchResult};
use srpc_identity_core::{AuthenticationService, IdentityError, Token};
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, warn};

/// Why a call to a secure method was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    MissingToken,
    NotAdmin,
    InvalidToken,
}

impl fmt::Display for Denial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Denial::MissingToken => "no token presented",
            Denial::NotAdmin => "token user is not an administrator",
            Denial::InvalidToken => "token is forged or expired",
        };
        f.write_str(reason)
    }
}

/// Names the methods that need an administrator token.
///
/// A call to a secure method passes only if a token is attached, its user has
/// the admin role, and the token validates, checked in that order. The first
/// failing gate denies the call.
#[derive(Debug, Clone)]
pub struct AuthorizationPolicy {
    secure_methods: HashSet<String>,
}

impl Default for AuthorizationPolicy {
    fn default() -> Self {
        Self::new(["get_user"])
    }
}

impl AuthorizationPolicy {
    pub fn new<I, S>(secure_methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            secure_methods: secure_methods.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_secure(&self, method: &str) -> bool {
        self.secure_methods.contains(method)
    }

    /// Evaluates the gates for `method` without producing a dispatch error.
    pub async fn check<A>(
        &self,
        method: &str,
        metadata: Option<&Token>,
        validator: &A,
    ) -> Result<(), Denial>
    where
        A: AuthenticationService<Error = IdentityError> + ?Sized,
    {
        if !self.is_secure(method) {
            return Ok(());
        }

        let token = metadata.ok_or(Denial::MissingToken)?;
        if !token.user.is_admin() {
            return Err(Denial::NotAdmin);
        }

        match validator.validate_token(token).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(Denial::InvalidToken),
            Err(e) => {
                warn!("Token validation error: {}", e);
                Err(Denial::InvalidToken)
            }
        }
    }

    pub async fn authorize<A>(
        &self,
        method: &str,
        metadata: Option<&Token>,
        validator: &A,
    ) -> DispatchResult<()>
    where
        A: AuthenticationService<Error = IdentityError> + ?Sized,
    {
        self.check(method, metadata, validator)
            .await
            .map_err(|denial| {
                debug!(method, %denial, "Denied secure operation");
                DispatchError::PermissionDenied {
                    method: method.to_string(),
                }
            })
    }
}

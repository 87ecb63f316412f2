//! Token issuance and validation.
//!
//! A token binds a redacted user to an expiration instant with an HMAC over
//! both. The secret never leaves the server; clients treat tokens as opaque and
//! only ever hand them back to the service that issued them.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey};
use serde::Serialize;
use srpc_identity_core::{
    AuthenticationService, Credentials, IdentityError, IdentityResult, Token, User, UserDatabase,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct TokenConfig {
    pub secret: String,
    /// Lifetime of a token when `authenticate` is called without a duration.
    pub default_ttl: Duration,
    /// Must be one of the HMAC algorithms.
    pub algorithm: Algorithm,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            secret: "change-me-in-production".to_string(),
            default_ttl: Duration::from_secs(24 * 60 * 60),
            algorithm: Algorithm::HS256,
        }
    }
}

impl TokenConfig {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            ..Self::default()
        }
    }

    pub fn with_default_ttl(mut self, default_ttl: Duration) -> Self {
        self.default_ttl = default_ttl;
        self
    }

    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    fn validate(&self) -> IdentityResult<()> {
        if self.secret.is_empty() {
            return Err(IdentityError::Signing("token secret is empty".to_string()));
        }
        match self.algorithm {
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => Ok(()),
            other => Err(IdentityError::Signing(format!(
                "{:?} is not a symmetric signing algorithm",
                other
            ))),
        }
    }
}

/// The signed portion of a token, in a fixed field order.
#[derive(Serialize)]
struct SignedClaims<'a> {
    user: &'a User,
    expiration: &'a DateTime<Utc>,
}

pub struct TokenAuthenticationService<D> {
    config: TokenConfig,
    user_database: Arc<D>,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl<D> TokenAuthenticationService<D>
where
    D: UserDatabase<Error = IdentityError>,
{
    pub fn new(config: TokenConfig, user_database: Arc<D>) -> IdentityResult<Self> {
        config.validate()?;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            config,
            user_database,
        })
    }

    pub fn user_database(&self) -> &Arc<D> {
        &self.user_database
    }

    fn claims_bytes(user: &User, expiration: &DateTime<Utc>) -> IdentityResult<Vec<u8>> {
        serde_json::to_vec(&SignedClaims { user, expiration })
            .map_err(|e| IdentityError::Signing(e.to_string()))
    }

    fn sign(&self, user: &User, expiration: &DateTime<Utc>) -> IdentityResult<String> {
        let message = Self::claims_bytes(user, expiration)?;
        jsonwebtoken::crypto::sign(&message, &self.encoding_key, self.config.algorithm)
            .map_err(|e| IdentityError::Signing(e.to_string()))
    }

    fn signature_matches(&self, token: &Token) -> IdentityResult<bool> {
        let message = Self::claims_bytes(&token.user, &token.expiration)?;
        jsonwebtoken::crypto::verify(
            &token.signature,
            &message,
            &self.decoding_key,
            self.config.algorithm,
        )
        .map_err(|e| IdentityError::Signing(e.to_string()))
    }
}

#[async_trait]
impl<D> AuthenticationService for TokenAuthenticationService<D>
where
    D: UserDatabase<Error = IdentityError> + 'static,
{
    type Error = IdentityError;

    async fn authenticate(
        &self,
        credentials: &Credentials,
        duration: Option<Duration>,
    ) -> IdentityResult<Token> {
        if !self.user_database.check_password(credentials).await? {
            debug!(user_id = %credentials.id, "Rejected credentials");
            return Err(IdentityError::InvalidCredentials);
        }

        let user = self.user_database.get_user(&credentials.id).await?.redacted();

        let ttl = duration.unwrap_or(self.config.default_ttl);
        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|e| IdentityError::InvalidDuration(e.to_string()))?;
        let expiration = Utc::now()
            .checked_add_signed(ttl)
            .ok_or_else(|| IdentityError::InvalidDuration("expiration out of range".to_string()))?;

        let signature = self.sign(&user, &expiration)?;
        debug!(user_id = %user.id, %expiration, "Issued token");

        Ok(Token {
            user,
            expiration,
            signature,
        })
    }

    async fn validate_token(&self, token: &Token) -> IdentityResult<bool> {
        let genuine = match self.signature_matches(token) {
            Ok(genuine) => genuine,
            Err(e) => {
                warn!("Token validation failed: {}", e);
                false
            }
        };

        Ok(genuine && token.is_live_at(Utc::now()))
    }

    async fn get_user_with_token(
        &self,
        id: &str,
        _metadata: Option<&Token>,
    ) -> IdentityResult<User> {
        self.user_database.get_user(id).await
    }
}

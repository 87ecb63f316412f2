//! Users, credentials and tokens exchanged between the identity services and their callers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Privilege level of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    User,
    Admin,
}

/// A directory entry, keyed by `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Unique identity key.
    pub id: String,

    /// Clear-text password. Only present when a user is being added;
    /// every read path returns a redacted copy.
    #[serde(default)]
    pub password: Option<String>,

    pub role: Role,
}

impl User {
    pub fn new(id: impl Into<String>, password: Option<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            password,
            role,
        }
    }

    /// Returns a copy of this user without the password.
    pub fn redacted(&self) -> Self {
        Self {
            id: self.id.clone(),
            password: None,
            role: self.role,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// An authentication attempt. Never stored.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub id: String,
    pub password: String,
}

impl Credentials {
    pub fn new(id: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("id", &self.id)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Signed, time-bounded proof of a successful authentication.
///
/// The signature covers `user` and `expiration` only; a token is a bearer
/// credential and can be re-presented by whoever holds it until it expires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// The authenticated user, always redacted.
    pub user: User,
    pub expiration: DateTime<Utc>,
    pub signature: String,
}

impl Token {
    /// Whether the expiration lies strictly after `now`.
    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        self.expiration > now
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_redacted_drops_password_only() {
        let user = User::new("gciatto", Some("pwd".to_string()), Role::Admin);
        let redacted = user.redacted();

        assert_eq!(redacted.id, "gciatto");
        assert_eq!(redacted.role, Role::Admin);
        assert!(redacted.password.is_none());
        assert_eq!(user.password.as_deref(), Some("pwd"));
    }

    #[test]
    fn test_role_wire_names() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"ADMIN\"");
        assert_eq!(
            serde_json::from_str::<Role>("\"USER\"").unwrap(),
            Role::User
        );
    }

    #[test]
    fn test_user_without_password_field_deserializes() {
        let user: User = serde_json::from_value(serde_json::json!({
            "id": "alice",
            "role": "USER"
        }))
        .unwrap();

        assert_eq!(user, User::new("alice", None, Role::User));
    }

    #[test]
    fn test_credentials_debug_hides_password() {
        let credentials = Credentials::new("alice", "supersecret");
        let debug = format!("{:?}", credentials);

        assert!(debug.contains("alice"));
        assert!(!debug.contains("supersecret"));
    }

    #[test]
    fn test_token_liveness_is_strict() {
        let now = Utc::now();
        let token = Token {
            user: User::new("alice", None, Role::User),
            expiration: now,
            signature: String::new(),
        };

        assert!(!token.is_live_at(now));
        assert!(token.is_live_at(now - Duration::milliseconds(1)));
    }

    #[test]
    fn test_token_timestamp_survives_json() {
        let token = Token {
            user: User::new("alice", None, Role::User),
            expiration: Utc::now(),
            signature: "sig".to_string(),
        };

        let json = serde_json::to_string(&token).unwrap();
        let decoded: Token = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, token);
    }
}

//! In-memory user directory with Argon2-hashed passwords.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use async_trait::async_trait;
use rand_core::OsRng;
use srpc_identity_core::{Credentials, IdentityError, IdentityResult, User, UserDatabase};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{RwLock, Semaphore};
use tracing::debug;

// A real Argon2 hash of "dummy_password", verified against when the id is
// unknown so that both failure paths take the same time.
const DUMMY_HASH: &str = "$argon2id$v=19$m=19456,t=2,p=1$9QsJRKgzJkKaOUvlp7gl2Q$qmE3qIFBNJ6nZYbLYXEI2uo0zZc7T0Q8LU1ZsqsZ3QE";

const MAX_CONCURRENT_VERIFICATIONS: usize = 5;

#[derive(Debug, Clone)]
struct StoredUser {
    /// Redacted on insertion.
    user: User,
    password_hash: Option<String>,
}

#[derive(Clone)]
pub struct InMemoryUserDatabase {
    users: Arc<RwLock<HashMap<String, StoredUser>>>,
    semaphore: Arc<Semaphore>,
}

impl InMemoryUserDatabase {
    pub fn new() -> Self {
        Self {
            users: Arc::new(RwLock::new(HashMap::new())),
            semaphore: Arc::new(Semaphore::new(MAX_CONCURRENT_VERIFICATIONS)),
        }
    }

    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }

    fn hash_password(password: &str) -> IdentityResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| IdentityError::PasswordHash(e.to_string()))
    }
}

impl Default for InMemoryUserDatabase {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserDatabase for InMemoryUserDatabase {
    type Error = IdentityError;

    async fn add_user(&self, user: User) -> IdentityResult<()> {
        // Hash outside the lock; the duplicate check and insert below form
        // one critical section.
        let password_hash = user
            .password
            .as_deref()
            .map(Self::hash_password)
            .transpose()?;

        let mut users = self.users.write().await;
        if users.contains_key(&user.id) {
            return Err(IdentityError::DuplicateUser(user.id));
        }

        debug!(user_id = %user.id, role = ?user.role, "Adding user");
        users.insert(
            user.id.clone(),
            StoredUser {
                user: user.redacted(),
                password_hash,
            },
        );

        Ok(())
    }

    async fn get_user(&self, id: &str) -> IdentityResult<User> {
        let users = self.users.read().await;
        users
            .get(id)
            .map(|stored| stored.user.redacted())
            .ok_or_else(|| IdentityError::UserNotFound(id.to_string()))
    }

    async fn check_password(&self, credentials: &Credentials) -> IdentityResult<bool> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|e| IdentityError::PasswordHash(e.to_string()))?;
        let users = self.users.read().await;

        let stored_hash = users
            .get(&credentials.id)
            .and_then(|stored| stored.password_hash.as_deref());
        let (user_has_password, password_hash) = match stored_hash {
            Some(hash) => (true, hash),
            None => (false, DUMMY_HASH),
        };

        let parsed_hash =
            PasswordHash::new(password_hash).map_err(|e| IdentityError::PasswordHash(e.to_string()))?;

        let password_valid = Argon2::default()
            .verify_password(credentials.password.as_bytes(), &parsed_hash)
            .is_ok();

        Ok(user_has_password && password_valid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use srpc_identity_core::Role;

    fn gc_user() -> User {
        User::new("gciatto", Some("pwd".to_string()), Role::User)
    }

    async fn setup_test_database() -> InMemoryUserDatabase {
        let database = InMemoryUserDatabase::new();
        database.add_user(gc_user()).await.unwrap();
        database
            .add_user(User::new(
                "alice",
                Some("supersecret".to_string()),
                Role::Admin,
            ))
            .await
            .unwrap();
        database
    }

    #[tokio::test]
    async fn test_add_user_twice_is_duplicate() {
        let database = InMemoryUserDatabase::new();

        database.add_user(gc_user()).await.unwrap();
        let result = database.add_user(gc_user()).await;

        match result {
            Err(IdentityError::DuplicateUser(id)) => assert_eq!(id, "gciatto"),
            other => panic!("Expected DuplicateUser, got: {:?}", other),
        }
        assert_eq!(database.len().await, 1);
    }

    #[tokio::test]
    async fn test_get_user_is_redacted() {
        let database = setup_test_database().await;

        let user = database.get_user("gciatto").await.unwrap();
        assert_eq!(user, gc_user().redacted());
        assert!(user.password.is_none());
    }

    #[tokio::test]
    async fn test_get_unknown_user_fails() {
        let database = setup_test_database().await;

        let result = database.get_user("nobody").await;
        assert!(matches!(result, Err(IdentityError::UserNotFound(id)) if id == "nobody"));
    }

    #[tokio::test]
    async fn test_check_password_scenario() {
        let database = setup_test_database().await;

        assert!(
            database
                .check_password(&Credentials::new("gciatto", "pwd"))
                .await
                .unwrap()
        );
        assert!(
            !database
                .check_password(&Credentials::new("gciatto", "wrong"))
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_check_password_unknown_user_is_false() {
        let database = setup_test_database().await;

        let valid = database
            .check_password(&Credentials::new("nonexistentuser", "anypassword"))
            .await
            .unwrap();
        assert!(!valid);
    }

    #[tokio::test]
    async fn test_user_without_password_never_matches() {
        let database = InMemoryUserDatabase::new();
        database
            .add_user(User::new("passwordless", None, Role::User))
            .await
            .unwrap();

        assert!(
            !database
                .check_password(&Credentials::new("passwordless", ""))
                .await
                .unwrap()
        );
        assert!(
            !database
                .check_password(&Credentials::new("passwordless", "dummy_password"))
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_special_characters_in_credentials() {
        let database = InMemoryUserDatabase::new();
        database
            .add_user(User::new(
                "user@domain.com",
                Some("p@ssw0rd!#$%".to_string()),
                Role::User,
            ))
            .await
            .unwrap();

        assert!(
            database
                .check_password(&Credentials::new("user@domain.com", "p@ssw0rd!#$%"))
                .await
                .unwrap()
        );
        assert!(
            !database
                .check_password(&Credentials::new(
                    "user@domain.com'; DROP TABLE users; --",
                    "p@ssw0rd!#$%"
                ))
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_concurrent_add_same_id_inserts_once() {
        let database = Arc::new(InMemoryUserDatabase::new());

        const CONCURRENT_ATTEMPTS: usize = 8;
        let mut handles = Vec::new();
        for _ in 0..CONCURRENT_ATTEMPTS {
            let database = Arc::clone(&database);
            handles.push(tokio::spawn(async move {
                database
                    .add_user(User::new("racer", Some("pwd".to_string()), Role::User))
                    .await
            }));
        }

        let mut inserted = 0;
        let mut duplicates = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(()) => inserted += 1,
                Err(IdentityError::DuplicateUser(_)) => duplicates += 1,
                Err(other) => panic!("Unexpected error: {:?}", other),
            }
        }

        assert_eq!(inserted, 1);
        assert_eq!(duplicates, CONCURRENT_ATTEMPTS - 1);
        assert_eq!(database.len().await, 1);
    }

    #[cfg(feature = "timing-tests")]
    #[tokio::test]
    async fn test_timing_attack_resistance() {
        use std::time::{Duration, Instant};

        let database = setup_test_database().await;

        const NUM_ATTEMPTS: usize = 10;
        let mut nonexistent_times = Vec::new();
        let mut wrong_password_times = Vec::new();

        for i in 0..NUM_ATTEMPTS {
            let credentials = Credentials::new(format!("nonexistentuser{}", i), "anypassword");
            let start = Instant::now();
            let _ = database.check_password(&credentials).await;
            nonexistent_times.push(start.elapsed());
        }

        for i in 0..NUM_ATTEMPTS {
            let credentials = Credentials::new("gciatto", format!("wrongpassword{}", i));
            let start = Instant::now();
            let _ = database.check_password(&credentials).await;
            wrong_password_times.push(start.elapsed());
        }

        let avg_nonexistent = nonexistent_times.iter().sum::<Duration>() / NUM_ATTEMPTS as u32;
        let avg_wrong_password =
            wrong_password_times.iter().sum::<Duration>() / NUM_ATTEMPTS as u32;

        let time_diff = if avg_nonexistent > avg_wrong_password {
            avg_nonexistent - avg_wrong_password
        } else {
            avg_wrong_password - avg_nonexistent
        };

        assert!(
            time_diff < Duration::from_millis(50),
            "Timing difference too large: {:?}",
            time_diff
        );
    }
}

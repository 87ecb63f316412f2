//! Wiring of the services behind a dispatcher.

use crate::config::Config;
use crate::dispatcher::RequestDispatcher;
use anyhow::{Context, Result};
use srpc_identity_core::UserDatabase;
use srpc_identity_local::InMemoryUserDatabase;
use srpc_identity_session::TokenAuthenticationService;
use std::sync::Arc;
use tracing::info;

/// Build the user store, the token service and the dispatcher over them,
/// creating the configured seed users.
pub async fn build_dispatcher(config: &Config) -> Result<Arc<RequestDispatcher>> {
    let user_database = Arc::new(InMemoryUserDatabase::new());

    for seed in &config.seed.users {
        user_database
            .add_user(seed.to_user())
            .await
            .with_context(|| format!("Failed to seed user '{}'", seed.id))?;
        info!(user_id = %seed.id, role = ?seed.role, "Seeded user");
    }

    let auth = Arc::new(
        TokenAuthenticationService::new(config.token_config()?, user_database.clone())
            .context("Failed to create authentication service")?,
    );

    Ok(Arc::new(RequestDispatcher::new(
        user_database,
        auth,
        config.policy(),
    )))
}

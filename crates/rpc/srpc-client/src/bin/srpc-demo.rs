//! Runs the user directory and authentication walkthrough against a server.

use anyhow::{Context, Result, ensure};
use chrono::Utc;
use clap::Parser;
use srpc_client::{ClientConfig, ClientError, RemoteAuthenticationService};
use srpc_identity_core::{AuthenticationService, Credentials, Role, User, UserDatabase};
use srpc_rpc_types::ErrorKind;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Exercise a secure RPC server end to end
#[derive(Parser, Debug)]
#[command(name = "srpc-demo")]
#[command(version = "0.1.0")]
struct Args {
    /// Server address as host:port
    #[arg(default_value = "127.0.0.1:8080")]
    address: String,

    /// Id of the user added by the walkthrough
    #[arg(long, default_value = "gciatto")]
    user_id: String,

    /// Request timeout in milliseconds
    #[arg(long, default_value_t = 5000)]
    timeout_ms: u64,
}

fn expect_remote<T: std::fmt::Debug>(
    result: Result<T, ClientError>,
    kind: ErrorKind,
) -> Result<ClientError> {
    match result {
        Err(e) if e.is_remote_kind(kind) => Ok(e),
        other => anyhow::bail!("Expected a {:?} error, got {:?}", kind, other),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = Args::parse();
    let config = ClientConfig::builder()
        .server_address(args.address.clone())
        .request_timeout(Duration::from_millis(args.timeout_ms))
        .build();
    let service = RemoteAuthenticationService::new(config);

    let user = User::new(args.user_id.clone(), Some("my secret password".to_string()), Role::Admin);
    let credentials_ok = Credentials::new(args.user_id.clone(), "my secret password");
    let credentials_wrong = Credentials::new(args.user_id.clone(), "wrong password");

    service
        .add_user(user.clone())
        .await
        .context("Adding a new user")?;
    info!("Added user {}", user.id);

    let e = expect_remote(service.add_user(user.clone()).await, ErrorKind::DuplicateUser)?;
    ensure!(e.to_string().starts_with("User with ID"));
    info!("Duplicate add rejected: {}", e);

    let e = expect_remote(service.get_user(&user.id).await, ErrorKind::PermissionDenied)?;
    ensure!(e.to_string().starts_with("Secure operation"));
    info!("Unauthenticated read rejected: {}", e);

    let token = service
        .authenticate(&credentials_ok, None)
        .await
        .context("Authenticating with valid credentials")?;
    ensure!(token.user == user.redacted(), "Token must carry the redacted user");
    ensure!(token.expiration > Utc::now(), "Token must expire in the future");
    info!("Authenticated, token expires at {}", token.expiration);

    ensure!(service.validate_token(&token).await?, "Fresh token must be valid");

    let fetched = service.get_user(&user.id).await.context("Authorized read")?;
    ensure!(fetched == user.redacted());
    info!("Authorized read returned {:?}", fetched);

    ensure!(service.check_password(&credentials_ok).await?);
    ensure!(!service.check_password(&credentials_wrong).await?);
    info!("Password checks behave");

    let e = expect_remote(
        service.authenticate(&credentials_wrong, None).await,
        ErrorKind::InvalidCredentials,
    )?;
    ensure!(e.to_string().contains("Invalid credentials"));
    info!("Wrong credentials rejected");

    let mut tampered = token.clone();
    tampered.signature = "wrong signature".to_string();
    ensure!(!service.validate_token(&tampered).await?, "Tampered token must be invalid");
    info!("Tampered token rejected");

    let short_lived = service
        .authenticate(&credentials_ok, Some(Duration::from_millis(10)))
        .await?;
    tokio::time::sleep(Duration::from_millis(100)).await;
    ensure!(!service.validate_token(&short_lived).await?, "Expired token must be invalid");
    info!("Expired token rejected");

    info!("Walkthrough completed");
    Ok(())
}

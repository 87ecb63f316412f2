//! Remote implementations of the identity traits.
//!
//! Each call is one round trip through a [`ClientStub`]. The facades are
//! interchangeable with the in-process services behind the same traits.

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::session::{InMemorySession, TokenSession};
use crate::stub::ClientStub;
use async_trait::async_trait;
use serde_json::json;
use srpc_identity_core::{AuthenticationService, Credentials, Token, User, UserDatabase};
use srpc_transport::{Connector, TcpConnector};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub struct RemoteUserDatabase<C: Connector = TcpConnector> {
    stub: Arc<ClientStub<C>>,
}

impl RemoteUserDatabase<TcpConnector> {
    pub fn new(config: ClientConfig) -> Self {
        Self::from_stub(Arc::new(ClientStub::new(config)))
    }
}

impl<C: Connector> RemoteUserDatabase<C> {
    pub fn from_stub(stub: Arc<ClientStub<C>>) -> Self {
        Self { stub }
    }

    pub fn stub(&self) -> &Arc<ClientStub<C>> {
        &self.stub
    }

    async fn get_user_as(&self, id: &str, metadata: Option<&Token>) -> ClientResult<User> {
        self.stub.rpc("get_user", vec![json!(id)], metadata).await
    }
}

#[async_trait]
impl<C: Connector> UserDatabase for RemoteUserDatabase<C> {
    type Error = ClientError;

    async fn add_user(&self, user: User) -> ClientResult<()> {
        self.stub
            .rpc("add_user", vec![serde_json::to_value(&user)?], None)
            .await
    }

    async fn get_user(&self, id: &str) -> ClientResult<User> {
        self.get_user_as(id, None).await
    }

    async fn check_password(&self, credentials: &Credentials) -> ClientResult<bool> {
        self.stub
            .rpc("check_password", vec![serde_json::to_value(credentials)?], None)
            .await
    }
}

/// Remote authentication service with a token session.
///
/// The token from the last successful `authenticate` is attached to
/// `get_user` calls made without an explicit token.
pub struct RemoteAuthenticationService<C: Connector = TcpConnector> {
    users: RemoteUserDatabase<C>,
    session: Arc<dyn TokenSession>,
}

impl RemoteAuthenticationService<TcpConnector> {
    pub fn new(config: ClientConfig) -> Self {
        Self::with_session(
            RemoteUserDatabase::new(config),
            Arc::new(InMemorySession::new()),
        )
    }
}

impl<C: Connector> RemoteAuthenticationService<C> {
    pub fn with_session(users: RemoteUserDatabase<C>, session: Arc<dyn TokenSession>) -> Self {
        Self { users, session }
    }

    pub fn users(&self) -> &RemoteUserDatabase<C> {
        &self.users
    }

    pub fn session(&self) -> &Arc<dyn TokenSession> {
        &self.session
    }
}

#[async_trait]
impl<C: Connector> UserDatabase for RemoteAuthenticationService<C> {
    type Error = ClientError;

    async fn add_user(&self, user: User) -> ClientResult<()> {
        self.users.add_user(user).await
    }

    /// Uses the cached token, if any.
    async fn get_user(&self, id: &str) -> ClientResult<User> {
        self.get_user_with_token(id, None).await
    }

    async fn check_password(&self, credentials: &Credentials) -> ClientResult<bool> {
        self.users.check_password(credentials).await
    }
}

#[async_trait]
impl<C: Connector> AuthenticationService for RemoteAuthenticationService<C> {
    type Error = ClientError;

    async fn authenticate(
        &self,
        credentials: &Credentials,
        duration: Option<Duration>,
    ) -> ClientResult<Token> {
        let mut args = vec![serde_json::to_value(credentials)?];
        if let Some(duration) = duration {
            args.push(serde_json::to_value(duration)?);
        }

        let token: Token = self.users.stub().rpc("authenticate", args, None).await?;
        debug!(user_id = %token.user.id, "Caching session token");
        self.session.store(token.clone()).await;
        Ok(token)
    }

    async fn validate_token(&self, token: &Token) -> ClientResult<bool> {
        self.users
            .stub()
            .rpc("validate_token", vec![serde_json::to_value(token)?], None)
            .await
    }

    /// An explicit token replaces the cached one.
    async fn get_user_with_token(&self, id: &str, metadata: Option<&Token>) -> ClientResult<User> {
        let token = match metadata {
            Some(token) => {
                self.session.store(token.clone()).await;
                Some(token.clone())
            }
            None => self.session.current().await,
        };
        self.users.get_user_as(id, token.as_ref()).await
    }
}

//! Client-side token cache.

use async_trait::async_trait;
use srpc_identity_core::Token;
use tokio::sync::RwLock;

/// Holds the token attached to secured calls.
#[async_trait]
pub trait TokenSession: Send + Sync {
    async fn current(&self) -> Option<Token>;

    async fn store(&self, token: Token);

    async fn clear(&self);
}

/// Keeps the most recent token in memory. Tokens are never evicted on expiry.
#[derive(Debug, Default)]
pub struct InMemorySession {
    token: RwLock<Option<Token>>,
}

impl InMemorySession {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TokenSession for InMemorySession {
    async fn current(&self) -> Option<Token> {
        self.token.read().await.clone()
    }

    async fn store(&self, token: Token) {
        *self.token.write().await = Some(token);
    }

    async fn clear(&self) {
        self.token.write().await.take();
    }
}

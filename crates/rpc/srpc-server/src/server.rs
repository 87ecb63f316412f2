//! Accept loop serving each connection on its own task.

use crate::connection::handle_connection;
use crate::dispatcher::RequestDispatcher;
use srpc_transport::{Connection, Listener, TransportResult};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{Instrument, error, info, info_span};
use uuid::Uuid;

/// Pause after a failed accept, e.g. when file descriptors run out.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

pub struct RpcServer<L: Listener> {
    listener: L,
    dispatcher: Arc<RequestDispatcher>,
}

impl<L: Listener> RpcServer<L> {
    pub fn new(listener: L, dispatcher: Arc<RequestDispatcher>) -> Self {
        Self {
            listener,
            dispatcher,
        }
    }

    pub fn local_addr(&self) -> TransportResult<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept connections until `shutdown` resolves.
    ///
    /// Connections already being served keep running on their own tasks.
    pub async fn serve_with_shutdown<F>(mut self, shutdown: F) -> TransportResult<()>
    where
        F: Future<Output = ()>,
    {
        let address = self.listener.local_addr()?;
        info!("Server listening on {}", address);

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                accepted = self.listener.accept() => match accepted {
                    Ok(connection) => self.spawn_connection(connection),
                    Err(e) => {
                        error!("Failed to accept connection: {}", e);
                        tokio::time::sleep(ACCEPT_BACKOFF).await;
                    }
                },
            }
        }

        info!("Server stopped");
        Ok(())
    }

    pub async fn serve(self) -> TransportResult<()> {
        self.serve_with_shutdown(std::future::pending()).await
    }

    fn spawn_connection(&self, connection: L::Connection) {
        let dispatcher = self.dispatcher.clone();
        let span = info_span!(
            "connection",
            id = %Uuid::new_v4(),
            peer = %connection.peer_addr()
        );

        tokio::spawn(
            async move {
                handle_connection(connection, &dispatcher).await;
            }
            .instrument(span),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::AuthorizationPolicy;
    use async_trait::async_trait;
    use serde_json::json;
    use srpc_identity_local::InMemoryUserDatabase;
    use srpc_identity_session::{TokenAuthenticationService, TokenConfig};
    use srpc_rpc_types::{Request, Response, codec};
    use srpc_transport::{
        Connector, TcpConnection, TcpConnector, TcpTransportListener, TransportError,
    };
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::oneshot;

    /// Listener whose accept always fails, as when the process is out of descriptors.
    struct ExhaustedListener {
        attempts: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Listener for ExhaustedListener {
        type Connection = TcpConnection;

        fn local_addr(&self) -> TransportResult<SocketAddr> {
            Ok("127.0.0.1:0".parse().unwrap())
        }

        async fn accept(&mut self) -> TransportResult<TcpConnection> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            Err(TransportError::Io(std::io::Error::other("too many open files")))
        }
    }

    fn dispatcher() -> Arc<RequestDispatcher> {
        let db = Arc::new(InMemoryUserDatabase::new());
        let auth = Arc::new(
            TokenAuthenticationService::new(TokenConfig::new("server-secret"), db.clone()).unwrap(),
        );
        Arc::new(RequestDispatcher::new(db, auth, AuthorizationPolicy::default()))
    }

    #[tokio::test]
    async fn test_serves_connections_until_shutdown() {
        let listener = TcpTransportListener::bind("127.0.0.1:0").await.unwrap();
        let server = RpcServer::new(listener, dispatcher());
        let address = server.local_addr().unwrap().to_string();

        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(server.serve_with_shutdown(async {
            let _ = stop_rx.await;
        }));

        for _ in 0..2 {
            let mut connection = TcpConnector::new().connect(&address).await.unwrap();
            let request = Request::new("check_password", vec![json!({"id": "a", "password": "b"})]);
            connection.send(&codec::encode(&request).unwrap()).await.unwrap();

            let response: Response = codec::decode(&connection.receive().await.unwrap()).unwrap();
            assert_eq!(response.result, Some(json!(false)));

            // One request per connection: the server closes afterwards.
            assert!(matches!(
                connection.receive().await,
                Err(TransportError::ConnectionClosed)
            ));
        }

        stop_tx.send(()).unwrap();
        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_failed_accepts_back_off() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let listener = ExhaustedListener {
            attempts: attempts.clone(),
        };
        let server = RpcServer::new(listener, dispatcher());

        server
            .serve_with_shutdown(tokio::time::sleep(Duration::from_millis(250)))
            .await
            .unwrap();

        let attempts = attempts.load(Ordering::SeqCst);
        assert!(attempts >= 1);
        assert!(attempts <= 4, "accept retried {} times without pausing", attempts);
    }
}

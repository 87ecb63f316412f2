//! Connect-per-call RPC stub.

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use serde::de::DeserializeOwned;
use serde_json::Value;
use srpc_identity_core::Token;
use srpc_rpc_types::{Request, Response, codec};
use srpc_transport::{Connection, Connector, TcpConnector};
use tokio::time::timeout;
use tracing::debug;

/// Sends one request per connection and decodes the response.
pub struct ClientStub<C: Connector = TcpConnector> {
    config: ClientConfig,
    connector: C,
}

impl ClientStub<TcpConnector> {
    pub fn new(config: ClientConfig) -> Self {
        Self::with_connector(config, TcpConnector::new())
    }
}

impl<C: Connector> ClientStub<C> {
    pub fn with_connector(config: ClientConfig, connector: C) -> Self {
        Self { config, connector }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Calls `name` on the server.
    ///
    /// A fresh connection is opened for the call and closed on every exit
    /// path. An error response becomes [`ClientError::Remote`]; an absent
    /// result is decoded from `null`.
    pub async fn rpc<R>(&self, name: &str, args: Vec<Value>, metadata: Option<&Token>) -> ClientResult<R>
    where
        R: DeserializeOwned,
    {
        let request = Request::new(name, args).with_metadata(metadata.cloned());
        let payload = codec::encode(&request)?;

        let mut connection = timeout(
            self.config.connect_timeout,
            self.connector.connect(&self.config.server_address),
        )
        .await
        .map_err(|_| ClientError::timeout("connect", self.config.connect_timeout))??;
        debug!(method = name, "Connected to {}", connection.peer_addr());

        let exchanged = self.exchange(&mut connection, &payload).await;

        if let Err(e) = connection.close().await {
            debug!("Error while closing connection: {}", e);
        }
        debug!(method = name, "Disconnected from {}", connection.peer_addr());

        let response: Response = codec::decode(&exchanged?)?;
        if let Some(error) = response.error {
            return Err(ClientError::Remote {
                kind: error.kind,
                message: error.message,
            });
        }

        Ok(serde_json::from_value(response.result.unwrap_or(Value::Null))?)
    }

    async fn exchange(&self, connection: &mut C::Connection, payload: &[u8]) -> ClientResult<Vec<u8>> {
        let round_trip = async {
            connection.send(payload).await?;
            connection.receive().await
        };

        let received = timeout(self.config.request_timeout, round_trip)
            .await
            .map_err(|_| ClientError::timeout("request", self.config.request_timeout))??;
        Ok(received)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use srpc_rpc_types::ErrorKind;
    use srpc_transport::{Listener, TcpTransportListener};
    use std::time::Duration;

    /// Serves one connection with a canned response and hands back the request.
    async fn one_shot_server(response: Response) -> (String, tokio::task::JoinHandle<Request>) {
        let mut listener = TcpTransportListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap().to_string();

        let handle = tokio::spawn(async move {
            let mut connection = listener.accept().await.unwrap();
            let request: Request = codec::decode(&connection.receive().await.unwrap()).unwrap();
            connection
                .send(&codec::encode(&response).unwrap())
                .await
                .unwrap();
            let _ = connection.close().await;
            request
        });

        (address, handle)
    }

    #[tokio::test]
    async fn test_rpc_sends_request_and_decodes_result() {
        let (address, server) = one_shot_server(Response::success(json!(true))).await;
        let stub = ClientStub::new(ClientConfig::new(address));

        let result: bool = stub
            .rpc("check_password", vec![json!({"id": "a", "password": "b"})], None)
            .await
            .unwrap();
        assert!(result);

        let request = server.await.unwrap();
        assert_eq!(request.name, "check_password");
        assert_eq!(request.args.len(), 1);
        assert!(request.metadata.is_none());
    }

    #[tokio::test]
    async fn test_error_response_becomes_remote_error() {
        let (address, _server) = one_shot_server(Response::failure(
            ErrorKind::UserNotFound,
            "User with ID nobody not found",
        ))
        .await;
        let stub = ClientStub::new(ClientConfig::new(address));

        let error = stub
            .rpc::<serde_json::Value>("get_user", vec![json!("nobody")], None)
            .await
            .unwrap_err();

        assert!(error.is_remote_kind(ErrorKind::UserNotFound));
        assert_eq!(error.to_string(), "User with ID nobody not found");
    }

    #[tokio::test]
    async fn test_absent_result_decodes_as_unit() {
        let (address, _server) = one_shot_server(Response {
            result: None,
            error: None,
        })
        .await;
        let stub = ClientStub::new(ClientConfig::new(address));

        let result: ClientResult<()> = stub.rpc("add_user", vec![], None).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_silent_server_times_out() {
        let mut listener = TcpTransportListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap().to_string();
        let _server = tokio::spawn(async move {
            let _connection = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
        });

        let config = ClientConfig::builder()
            .server_address(address)
            .request_timeout(Duration::from_millis(100))
            .build();
        let error = ClientStub::new(config)
            .rpc::<bool>("check_password", vec![], None)
            .await
            .unwrap_err();

        assert!(matches!(error, ClientError::Timeout { operation: "request", .. }));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_transport_error() {
        let listener = TcpTransportListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap().to_string();
        drop(listener);

        let error = ClientStub::new(ClientConfig::new(address))
            .rpc::<bool>("check_password", vec![], None)
            .await
            .unwrap_err();

        assert!(matches!(error, ClientError::Transport(_)));
    }
}

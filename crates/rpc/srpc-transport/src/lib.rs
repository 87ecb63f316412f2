//! Byte-stream transport used by the RPC server and client.
//!
//! The RPC layer only depends on the [`Listener`], [`Connector`] and
//! [`Connection`] traits; [`tcp`] provides the default implementation.

use async_trait::async_trait;
use std::net::SocketAddr;
use thiserror::Error;

pub mod frame;
pub mod tcp;

pub use frame::DEFAULT_MAX_FRAME_LEN;
pub use tcp::{TcpConnection, TcpConnector, TcpTransportListener};

/// Errors raised by a transport.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Underlying socket error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Peer announced a frame larger than allowed
    #[error("Frame of {len} bytes exceeds limit of {max} bytes")]
    FrameTooLarge { len: usize, max: usize },

    /// Peer closed the connection before a full message arrived
    #[error("Connection closed by peer")]
    ConnectionClosed,
}

/// Result type for transport operations
pub type TransportResult<T> = Result<T, TransportError>;

/// One open, message-oriented connection.
#[async_trait]
pub trait Connection: Send {
    /// Address of the other end.
    fn peer_addr(&self) -> SocketAddr;

    /// Send one complete message.
    async fn send(&mut self, payload: &[u8]) -> TransportResult<()>;

    /// Wait for the next complete message.
    async fn receive(&mut self) -> TransportResult<Vec<u8>>;

    /// Close the connection. Further calls are errors.
    async fn close(&mut self) -> TransportResult<()>;
}

/// Server side: yields accepted connections.
#[async_trait]
pub trait Listener: Send {
    type Connection: Connection + 'static;

    fn local_addr(&self) -> TransportResult<SocketAddr>;

    async fn accept(&mut self) -> TransportResult<Self::Connection>;
}

/// Client side: opens connections to a server address.
#[async_trait]
pub trait Connector: Send + Sync {
    type Connection: Connection + 'static;

    async fn connect(&self, address: &str) -> TransportResult<Self::Connection>;
}

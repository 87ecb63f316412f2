//! TCP implementation of the transport traits.

use crate::frame::{DEFAULT_MAX_FRAME_LEN, read_frame, write_frame};
use crate::{Connection, Connector, Listener, TransportResult};
use async_trait::async_trait;
use std::net::SocketAddr;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};
use tracing::debug;

pub struct TcpConnection {
    stream: TcpStream,
    peer: SocketAddr,
    max_frame_len: usize,
}

impl TcpConnection {
    pub fn new(stream: TcpStream, peer: SocketAddr, max_frame_len: usize) -> Self {
        Self {
            stream,
            peer,
            max_frame_len,
        }
    }
}

#[async_trait]
impl Connection for TcpConnection {
    fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    async fn send(&mut self, payload: &[u8]) -> TransportResult<()> {
        write_frame(&mut self.stream, payload, self.max_frame_len).await
    }

    async fn receive(&mut self) -> TransportResult<Vec<u8>> {
        read_frame(&mut self.stream, self.max_frame_len).await
    }

    async fn close(&mut self) -> TransportResult<()> {
        debug!("Closing connection to {}", self.peer);
        self.stream.shutdown().await?;
        Ok(())
    }
}

pub struct TcpTransportListener {
    listener: TcpListener,
    max_frame_len: usize,
}

impl TcpTransportListener {
    pub async fn bind<A: ToSocketAddrs>(address: A) -> TransportResult<Self> {
        let listener = TcpListener::bind(address).await?;
        Ok(Self {
            listener,
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
        })
    }

    pub fn with_max_frame_len(mut self, max_frame_len: usize) -> Self {
        self.max_frame_len = max_frame_len;
        self
    }
}

#[async_trait]
impl Listener for TcpTransportListener {
    type Connection = TcpConnection;

    fn local_addr(&self) -> TransportResult<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    async fn accept(&mut self) -> TransportResult<TcpConnection> {
        let (stream, peer) = self.listener.accept().await?;
        Ok(TcpConnection::new(stream, peer, self.max_frame_len))
    }
}

#[derive(Debug, Clone)]
pub struct TcpConnector {
    max_frame_len: usize,
}

impl TcpConnector {
    pub fn new() -> Self {
        Self {
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
        }
    }

    pub fn with_max_frame_len(mut self, max_frame_len: usize) -> Self {
        self.max_frame_len = max_frame_len;
        self
    }
}

impl Default for TcpConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Connector for TcpConnector {
    type Connection = TcpConnection;

    async fn connect(&self, address: &str) -> TransportResult<TcpConnection> {
        let stream = TcpStream::connect(address).await?;
        let peer = stream.peer_addr()?;
        Ok(TcpConnection::new(stream, peer, self.max_frame_len))
    }
}

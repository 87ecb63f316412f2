//! Handling of a single accepted connection.

use crate::dispatcher::RequestDispatcher;
use srpc_rpc_types::{Request, codec};
use srpc_transport::Connection;
use std::fmt;
use tracing::{debug, info, warn};

/// Lifecycle stages of a connection. A connection only moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connected,
    Received,
    Dispatched,
    Closed,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConnectionState::Connected => "connected",
            ConnectionState::Received => "received",
            ConnectionState::Dispatched => "dispatched",
            ConnectionState::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// How a connection ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionOutcome {
    /// A response was sent back
    Replied { is_error: bool },
    /// The connection was closed without a response
    Dropped {
        stage: ConnectionState,
        reason: String,
    },
}

/// Serves exactly one request on `connection`, then closes it.
///
/// Arguments are never logged; they may carry passwords.
pub async fn handle_connection<C: Connection>(
    mut connection: C,
    dispatcher: &RequestDispatcher,
) -> ConnectionOutcome {
    info!("Connection opened");

    let outcome = serve_one(&mut connection, dispatcher).await;

    if let Err(e) = connection.close().await {
        debug!("Error while closing connection: {}", e);
    }
    match &outcome {
        ConnectionOutcome::Replied { is_error } => {
            info!(is_error, state = %ConnectionState::Closed, "Connection closed")
        }
        ConnectionOutcome::Dropped { stage, reason } => {
            warn!(%stage, %reason, "Connection dropped without response")
        }
    }
    outcome
}

async fn serve_one<C: Connection>(
    connection: &mut C,
    dispatcher: &RequestDispatcher,
) -> ConnectionOutcome {
    let dropped = |stage: ConnectionState, reason: String| ConnectionOutcome::Dropped { stage, reason };

    let bytes = match connection.receive().await {
        Ok(bytes) => bytes,
        Err(e) => return dropped(ConnectionState::Connected, e.to_string()),
    };

    // An undecodable request gets no response.
    let request: Request = match codec::decode(&bytes) {
        Ok(request) => request,
        Err(e) => return dropped(ConnectionState::Received, e.to_string()),
    };
    debug!(
        method = %request.name,
        args = request.args.len(),
        has_token = request.metadata.is_some(),
        "Unmarshalled request"
    );

    let response = dispatcher.dispatch(request).await;

    let payload = match codec::encode(&response) {
        Ok(payload) => payload,
        Err(e) => return dropped(ConnectionState::Dispatched, e.to_string()),
    };
    debug!(bytes = payload.len(), "Marshalled response");

    if let Err(e) = connection.send(&payload).await {
        return dropped(ConnectionState::Dispatched, e.to_string());
    }

    ConnectionOutcome::Replied {
        is_error: response.is_error(),
    }
}

//! Serving side of the secure RPC layer.
//!
//! A [`RequestDispatcher`] authorizes each [`Request`](srpc_rpc_types::Request)
//! against an [`AuthorizationPolicy`], resolves the method in the registered
//! [`MethodTable`]s and turns the outcome into a
//! [`Response`](srpc_rpc_types::Response). [`RpcServer`] accepts connections
//! from any [`Listener`](srpc_transport::Listener) and serves one request on
//! each.

pub mod bootstrap;
pub mod config;
pub mod connection;
pub mod dispatcher;
pub mod error;
pub mod logging;
pub mod methods;
pub mod params;
pub mod policy;
pub mod router;
pub mod server;

pub use bootstrap::build_dispatcher;
pub use config::Config;
pub use connection::{ConnectionOutcome, ConnectionState, handle_connection};
pub use dispatcher::RequestDispatcher;
pub use error::{DispatchError, DispatchResult};
pub use logging::init_tracing;
pub use params::Params;
pub use policy::{AuthorizationPolicy, Denial};
pub use router::{MethodHandler, MethodTable};
pub use server::RpcServer;

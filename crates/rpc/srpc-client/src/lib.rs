//! Client side of the secure RPC layer.
//!
//! [`ClientStub`] performs one call per connection. [`RemoteUserDatabase`]
//! and [`RemoteAuthenticationService`] implement the identity traits on top
//! of it, so remote and local services can be used interchangeably.
//!
//! ```no_run
//! use srpc_client::{ClientConfig, RemoteAuthenticationService};
//! use srpc_identity_core::{AuthenticationService, Credentials, UserDatabase};
//!
//! # async fn example() -> Result<(), srpc_client::ClientError> {
//! let service = RemoteAuthenticationService::new(ClientConfig::new("127.0.0.1:8080"));
//! service.authenticate(&Credentials::new("admin", "secret"), None).await?;
//! let user = service.get_user("gciatto").await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod facade;
pub mod session;
pub mod stub;

pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use facade::{RemoteAuthenticationService, RemoteUserDatabase};
pub use session::{InMemorySession, TokenSession};
pub use stub::ClientStub;

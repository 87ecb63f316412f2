//! Configuration types for the RPC client

use bon::Builder;
use std::time::Duration;

/// Client configuration
#[derive(Debug, Clone, Builder)]
pub struct ClientConfig {
    /// Server address as `host:port`
    #[builder(into)]
    pub server_address: String,

    /// Limit on establishing a connection
    #[builder(default = Duration::from_secs(5))]
    pub connect_timeout: Duration,

    /// Limit on sending the request and receiving the response
    #[builder(default = Duration::from_secs(30))]
    pub request_timeout: Duration,
}

impl ClientConfig {
    /// Configuration with default timeouts
    pub fn new(server_address: impl Into<String>) -> Self {
        Self::builder().server_address(server_address).build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::new("127.0.0.1:8080");

        assert_eq!(config.server_address, "127.0.0.1:8080");
        assert_eq!(config.connect_timeout, Duration::from_secs(5));
        assert_eq!(config.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_builder_overrides() {
        let config = ClientConfig::builder()
            .server_address("localhost:9000")
            .request_timeout(Duration::from_millis(250))
            .build();

        assert_eq!(config.request_timeout, Duration::from_millis(250));
        assert_eq!(config.connect_timeout, Duration::from_secs(5));
    }
}

//! Server configuration.
//!
//! Values come from, in increasing precedence:
//! - built-in defaults
//! - a TOML file (`SRPC_CONFIG_FILE`, default `srpc.toml`, or `--config`)
//! - environment variables with the `SRPC__` prefix, e.g. `SRPC__SERVER__PORT`
//! - command line flags, applied by the binary

use crate::policy::AuthorizationPolicy;
use anyhow::{Context, Result};
use config::builder::{ConfigBuilder, DefaultState};
use config::{Environment, File, FileFormat};
use jsonwebtoken::Algorithm;
use serde::{Deserialize, Serialize};
use srpc_identity_core::{Role, User};
use srpc_identity_session::TokenConfig;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info, warn};

const DEFAULT_CONFIG_FILE: &str = "srpc.toml";
const DEFAULT_TOKEN_SECRET: &str = "dev-secret-change-in-production";

/// `SRPC__`-prefixed variables; list fields take comma-separated values.
fn environment() -> Environment {
    Environment::with_prefix("SRPC")
        .separator("__")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("auth.secure_methods")
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub logging: LoggingConfig,
    /// Users created at startup
    pub seed: SeedConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to (default: 127.0.0.1)
    pub host: IpAddr,

    /// Port to bind to (default: 8080)
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HMAC secret used to sign tokens
    pub token_secret: String,

    /// Token lifetime when the caller asks for none (default: 86400 = 24 hours)
    pub token_ttl_seconds: u64,

    /// HS256, HS384 or HS512
    pub algorithm: String,

    /// Methods that require an administrator token
    pub secure_methods: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level or full filter directive
    pub level: String,

    /// pretty or compact
    pub format: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedConfig {
    pub users: Vec<SeedUser>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedUser {
    pub id: String,
    pub password: String,
    #[serde(default = "default_seed_role")]
    pub role: Role,
}

impl SeedUser {
    pub fn to_user(&self) -> User {
        User::new(self.id.clone(), Some(self.password.clone()), self.role)
    }
}

fn default_seed_role() -> Role {
    Role::Admin
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 8080,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_secret: DEFAULT_TOKEN_SECRET.to_string(),
            token_ttl_seconds: 86400,
            algorithm: "HS256".to_string(),
            secure_methods: vec!["get_user".to_string()],
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from the environment and the default config file
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("SRPC_CONFIG_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE));

        if config_path.exists() {
            Self::load_from(Some(&config_path))
        } else {
            debug!("No config file found at {}, using defaults", config_path.display());
            Self::load_from(None)
        }
    }

    /// Load configuration from an explicit file, which must exist
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            info!("Loading configuration from {}", path.display());
            builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(true));
        }

        Self::build(builder.add_source(environment()))
    }

    fn build(builder: ConfigBuilder<DefaultState>) -> Result<Self> {
        let config = builder.build().context("Failed to build configuration")?;

        let mut settings: Config = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        settings.apply_env_overrides();
        settings.validate()?;

        Ok(settings)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(log_level) = std::env::var("RUST_LOG") {
            debug!("Using RUST_LOG environment variable");
            self.logging.level = log_level;
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            anyhow::bail!("Server port cannot be 0");
        }

        if self.auth.token_secret.is_empty() {
            anyhow::bail!("Token secret cannot be empty");
        }
        if self.auth.token_secret == DEFAULT_TOKEN_SECRET {
            warn!("Using default token secret - this is insecure for production!");
        }

        if self.auth.token_ttl_seconds == 0 {
            anyhow::bail!("Token TTL must be positive");
        }

        self.algorithm()?;

        let valid_formats = ["pretty", "compact"];
        let format_lower = self.logging.format.to_lowercase();
        if !valid_formats.contains(&format_lower.as_str()) {
            anyhow::bail!(
                "Invalid log format '{}'. Must be one of: {:?}",
                self.logging.format,
                valid_formats
            );
        }

        for user in &self.seed.users {
            if user.id.is_empty() {
                anyhow::bail!("Seed user ID cannot be empty");
            }
            if user.password.is_empty() {
                anyhow::bail!("Seed user '{}' needs a password", user.id);
            }
        }

        Ok(())
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::from((self.server.host, self.server.port))
    }

    fn algorithm(&self) -> Result<Algorithm> {
        let algorithm = Algorithm::from_str(&self.auth.algorithm)
            .with_context(|| format!("Unknown token algorithm '{}'", self.auth.algorithm))?;
        match algorithm {
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => Ok(algorithm),
            _ => anyhow::bail!(
                "Token algorithm '{}' is not an HMAC algorithm",
                self.auth.algorithm
            ),
        }
    }

    pub fn token_config(&self) -> Result<TokenConfig> {
        Ok(TokenConfig::new(self.auth.token_secret.clone())
            .with_default_ttl(Duration::from_secs(self.auth.token_ttl_seconds))
            .with_algorithm(self.algorithm()?))
    }

    pub fn policy(&self) -> AuthorizationPolicy {
        AuthorizationPolicy::new(self.auth.secure_methods.iter().cloned())
    }

    /// Get the log filter string for tracing
    pub fn log_filter(&self) -> String {
        if self.logging.level.contains('=') || self.logging.level.contains(',') {
            self.logging.level.clone()
        } else {
            format!("srpc_server={},{}", self.logging.level, self.logging.level)
        }
    }
}

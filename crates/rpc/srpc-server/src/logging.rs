use crate::config::Config;
use anyhow::Result;
use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber described by `config.logging`.
pub fn init_tracing(config: &Config) -> Result<()> {
    let filter = EnvFilter::try_new(config.log_filter())?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    let installed = match config.logging.format.to_lowercase().as_str() {
        "compact" => builder.compact().try_init(),
        _ => builder.pretty().try_init(),
    };
    installed.map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))
}

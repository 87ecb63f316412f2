use anyhow::{Context, Result};
use clap::Parser;
use srpc_server::{Config, RpcServer, build_dispatcher, init_tracing};
use srpc_transport::TcpTransportListener;
use std::net::IpAddr;
use std::path::PathBuf;
use tracing::info;

/// Secure RPC server exposing the user directory and authentication service
#[derive(Parser, Debug)]
#[command(name = "srpc-server")]
#[command(version = "0.1.0")]
struct Args {
    /// Port to listen on (overrides the configuration)
    port: Option<u16>,

    /// Configuration file (TOML)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Host to bind to (overrides the configuration)
    #[arg(long)]
    host: Option<IpAddr>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::load_from(Some(path.as_path()))?,
        None => Config::load()?,
    };
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(host) = args.host {
        config.server.host = host;
    }
    config.validate()?;

    init_tracing(&config)?;

    let dispatcher = build_dispatcher(&config).await?;
    let address = config.socket_addr();
    let listener = TcpTransportListener::bind(address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;

    RpcServer::new(listener, dispatcher)
        .serve_with_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await?;

    Ok(())
}

//! Demo TLS server.
//!
//! Serves a path/protocol echo handler over HTTP/1.1 (and HTTP/2 when
//! enabled) and over HTTP/0.9 for clients that negotiate `tls-0.9`.

use std::path::{Path, PathBuf};

use clap::Parser;

use nextproto::bindings::{Http09Binding, HTTP09_PROTOCOL};
use nextproto::config::{load_config, ServerConfig};
use nextproto::http::PathEcho;
use nextproto::lifecycle::signals::shutdown_signal;
use nextproto::net::{Listener, TlsIdentity};
use nextproto::observability::{logging, metrics};
use nextproto::{NextProtoRegistry, Shutdown, TlsServer};

#[derive(Parser)]
#[command(name = "nextproto-server")]
#[command(about = "TLS server routing connections by negotiated application protocol", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override listener.bind_address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServerConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }
    if !config.tls.next_protos.iter().any(|p| p == HTTP09_PROTOCOL) {
        config.tls.next_protos.push(HTTP09_PROTOCOL.to_string());
    }

    logging::init(&config.observability.log_level);

    tracing::info!("nextproto-server v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        max_connections = config.listener.max_connections,
        http2 = config.http2,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        metrics::init_metrics(config.observability.metrics_address.parse()?)?;
    }

    let identity = TlsIdentity::from_pem_files(
        Path::new(&config.tls.cert_path),
        Path::new(&config.tls.key_path),
    )?;

    let mut registry = NextProtoRegistry::new();
    registry.register(HTTP09_PROTOCOL, Http09Binding);

    let listener = Listener::bind(&config.listener).await?;
    let server = TlsServer::new(config, identity, registry, PathEcho)?;

    let shutdown = Shutdown::new();
    let server_task = tokio::spawn(server.run(listener, shutdown.subscribe()));

    shutdown_signal().await;
    shutdown.trigger();
    server_task.await??;

    tracing::info!("Shutdown complete");
    Ok(())
}

//! Wikipedia mirroring reverse proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌──────────────────────────────────────────────────┐
//!                        │                  WIKI MIRROR                     │
//!   Client Request       │  ┌─────────┐   ┌──────────┐   ┌──────────────┐   │
//!   ─────────────────────┼─▶│  http   │──▶│ routing  │──▶│    assets    │   │
//!                        │  │ server  │   │ dispatch │   │ (allow-list) │   │
//!                        │  └─────────┘   └────┬─────┘   └──────────────┘   │
//!                        │                     │                            │
//!                        │                     ▼                            │
//!                        │              ┌──────────────┐                    │
//!                        │              │   upstream   │◀───────────────────┼──── Origin
//!                        │              │   fetcher    │                    │
//!                        │              └──────┬───────┘                    │
//!                        │                     ▼                            │
//!   Client Response      │  ┌─────────┐   ┌──────────────┐                  │
//!   ◀────────────────────┼──│response │◀──│   rewrite    │ (HTML only)      │
//!                        │  └─────────┘   └──────────────┘                  │
//!                        │                                                  │
//!                        │  config · observability · lifecycle              │
//!                        └──────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use wiki_mirror::config::{load_config, MirrorConfig};
use wiki_mirror::lifecycle::{signals, Shutdown};
use wiki_mirror::observability::{logging, metrics};
use wiki_mirror::HttpServer;

#[derive(Parser)]
#[command(name = "wiki-mirror")]
#[command(about = "Mirroring reverse proxy for Wikipedia", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file; built-in defaults when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => MirrorConfig::default(),
    };

    logging::init(&config.observability);

    tracing::info!("wiki-mirror v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        origin = %config.upstream.origin_base_url,
        mirror = %config.upstream.mirror_base_url,
        upstream_timeout_secs = config.timeouts.upstream_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<std::net::SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let server = HttpServer::new(config)?;

    let shutdown = Shutdown::new();
    let signal = shutdown.subscribe();
    tokio::spawn(async move {
        signals::shutdown_signal().await;
        shutdown.trigger();
    });

    server.run(listener, signal).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

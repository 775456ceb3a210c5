//! typed-rpc server
//!
//! Serves the demo route table over HTTP.
//!
//! # Architecture Overview
//!
//! ```text
//!     HTTP request
//!     ──────────────▶ http::RpcServer (axum + tower-http layers)
//!                         │
//!                         ▼
//!                     dispatch::Dispatcher
//!                         │  match      routing::RouteTable
//!                         │  decode     codec (query / body)
//!                         │  validate   schema (input)
//!                         │  invoke     handler
//!                         │  validate   schema (output)
//!                         │  encode     codec (body)
//!                         ▼
//!     HTTP response ◀─────┘
//!
//!     client::ClientProxy ── same RouteManifest ──▶ typed calls from the other side
//! ```
//!
//! With `--no-listen` (or `server.listen = false`) nothing is bound; the
//! route manifest is printed and the process exits.

use std::path::PathBuf;

use clap::Parser;

use typed_rpc::config::{load_config, RpcConfig};
use typed_rpc::lifecycle::{launch, Launched, Shutdown};
use typed_rpc::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "typed-rpc")]
#[command(about = "Typed RPC demo server", long_about = None)]
struct Cli {
    /// TOML configuration file; defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Build the route table without binding a socket.
    #[arg(long)]
    no_listen: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => RpcConfig::default(),
    };
    if cli.no_listen {
        config.server.listen = false;
    }

    logging::init_logging(&config.observability.log_level);
    tracing::info!("typed-rpc v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.server.bind_address,
        listen = config.server.listen,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let table = typed_rpc::app::routes().build()?;
    let shutdown = Shutdown::new();

    match launch(config, table, &shutdown).await? {
        Launched::Listening { addr, task, .. } => {
            tracing::info!(address = %addr, "Listening for connections");
            task.await??;
        }
        Launched::InProcess { dispatcher } => {
            let manifest = dispatcher.table().manifest();
            println!("{}", serde_json::to_string_pretty(&manifest)?);
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

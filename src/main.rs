//! HTTP request inspector.
//!
//! A debugging endpoint built with Tokio and Axum that accepts any request,
//! reports exactly what arrived and optionally persists it to disk.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http::server ──▶ normalize middleware ──▶ handlers
//!                                          │                      │
//!                                          ▼                      ▼
//!                                   capture::model          capture::view / raw
//!                                   (RequestModel)          capture::sink ──▶ store
//!
//!     Cross-cutting: config, observability (logging, metrics), lifecycle
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use request_inspector::config::{self, InspectorConfig};
use request_inspector::observability::{logging, metrics};
use request_inspector::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "request-inspector")]
#[command(about = "Capture and inspect incoming HTTP requests", long_about = None)]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address
    #[arg(short, long)]
    bind: Option<String>,

    /// Override the capture directory
    #[arg(long)]
    capture_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => config::load_config(path)?,
        None => InspectorConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
    }
    if let Some(dir) = args.capture_dir {
        config.capture.directory = dir;
    }
    if let Err(errors) = config::validate_config(&config) {
        for e in &errors {
            eprintln!("Invalid configuration: {}", e);
        }
        return Err(config::ConfigError::Validation(errors).into());
    }

    logging::init_logging(&config.observability);

    tracing::info!("request-inspector v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        max_body_bytes = config.limits.max_body_bytes,
        request_timeout_secs = config.limits.request_timeout_secs,
        capture_enabled = config.capture.enabled,
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

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let local_addr = listener.local_addr()?;
    tracing::info!(address = %local_addr, "Listening for connections");
    if config.capture.enabled {
        tracing::info!(
            directory = %config.capture.directory.display(),
            "Captured requests will be saved"
        );
    }

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config);
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

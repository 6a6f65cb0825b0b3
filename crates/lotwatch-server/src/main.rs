//! # lotwatch-server
//!
//! HTTP server for campus parking lot status and shuttle schedules.
//!
//! This binary provides:
//! - REST API for parking periods, lot status and shuttle routes
//! - Live vehicle snapshot ingestion
//! - OpenAPI document at `/api/openapi.json`
//! - Structured logging to file and stdout
//!
//! ## Running
//!
//! ```bash
//! # Development
//! LOTWATCH_CONFIG=demos/config.toml cargo run --package lotwatch-server
//!
//! # Production
//! LOTWATCH_ENV=production ./lotwatch-server
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use lotwatch_core::default_config_path;
use lotwatch_server::api::create_router;
use lotwatch_server::logging::{self, LogMode};
use lotwatch_server::state::AppState;
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init(LogMode::from_env())?;

    info!(version = env!("CARGO_PKG_VERSION"), "Starting lotwatch-server");

    let config_path = std::env::var_os("LOTWATCH_CONFIG")
        .map_or_else(default_config_path, PathBuf::from);
    let state = AppState::load(&config_path)
        .with_context(|| format!("Failed to start from {}", config_path.display()))?;

    let addr: SocketAddr = format!("{}:{}", state.config.server.host, state.config.server.port)
        .parse()
        .context("Invalid server.host or server.port")?;

    let app = create_router(state.into_shared());
    let listener = TcpListener::bind(addr).await?;

    info!(%addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}

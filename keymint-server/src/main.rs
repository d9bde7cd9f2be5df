//! Keymint license key server.
//!
//! Issues, activates, and revokes license keys over an HTTP API, enforcing
//! the one-trial-per-identity rule against a shared key-value store.
//!
//! Usage:
//!   keymint-server --port 8080
//!
//! The administrator password comes from `--admin-password` or the
//! `ADMIN_PASSWORD` environment variable.

use anyhow::{Context, Result};
use clap::Parser;
use keymint_server::{build_router, AppState};
use keymint_store::MemoryStore;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "keymint-server")]
#[command(about = "License key issuance and activation service")]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "8080")]
    port: u16,

    /// Administrator password (falls back to the ADMIN_PASSWORD env var)
    #[arg(long)]
    admin_password: Option<String>,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .compact()
        .init();

    let admin_password = args
        .admin_password
        .or_else(|| std::env::var("ADMIN_PASSWORD").ok())
        .context("set --admin-password or the ADMIN_PASSWORD environment variable")?;

    info!("Keymint starting...");
    let store = Arc::new(MemoryStore::new());
    let state = AppState::new(store, admin_password);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", args.port))
        .await
        .with_context(|| format!("failed to bind port {}", args.port))?;
    info!("Listening on port {}", args.port);
    axum::serve(listener, app).await.context("HTTP server failed")?;
    Ok(())
}

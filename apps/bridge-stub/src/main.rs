//! Bridge Stub Server
//!
//! Serves a deterministic bridge until Ctrl+C.
//!
//! # Environment Variables
//!
//! - `BRIDGE_STUB_HOST`: bind address (default: 127.0.0.1)
//! - `BRIDGE_STUB_PORT`: bind port (default: 5000)
//! - `BRIDGE_STUB_SYMBOLS`: comma-separated symbols (default: BTCUSD,EURUSD)
//! - `BRIDGE_STUB_SEED`: data set seed (default: 42)
//! - `RUST_LOG`, `LOG_FORMAT`

use std::sync::Arc;

use anyhow::Context;
use bridge_client::infrastructure::telemetry;
use bridge_stub::{StubMarket, StubServerConfig, serve};
use chrono::Utc;
use tokio::signal;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();

    telemetry::init().context("failed to initialize logging")?;

    let config = StubServerConfig::from_env();
    tracing::info!(
        addr = %config.bind_addr(),
        symbols = ?config.symbols.iter().map(ToString::to_string).collect::<Vec<_>>(),
        seed = config.seed,
        "Configuration loaded"
    );

    let market = Arc::new(StubMarket::new(&config.symbols, config.seed, Utc::now()));

    serve(config.bind_addr(), market, await_shutdown()).await?;
    Ok(())
}

/// Wait for Ctrl+C.
async fn await_shutdown() {
    if let Err(e) = signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl+C, serving until killed");
        std::future::pending::<()>().await;
    }
    tracing::info!("Received Ctrl+C, shutting down");
}

/// Load .env file from current or ancestor directories.
fn load_dotenv() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    if let Ok(cwd) = std::env::current_dir() {
        let mut dir = cwd.as_path();
        while let Some(parent) = dir.parent() {
            let env_path = parent.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
                return;
            }
            dir = parent;
        }
    }
}

//! Bridge Probe
//!
//! Connects to the configured bridge, fetches an account snapshot, a quote
//! and recent bars for the probe symbol, and prints a JSON summary.
//!
//! # Environment Variables
//!
//! - `BRIDGE_HOST`, `BRIDGE_PORT`, `BRIDGE_TLS`, `BRIDGE_TIMEOUT_SECS`
//! - `BRIDGE_CONNECT_MAX_ATTEMPTS`, `BRIDGE_CONNECT_BACKOFF_STEP_MS`, `BRIDGE_CONNECT_JITTER`
//! - `BRIDGE_PROBE_SYMBOL`, `BRIDGE_PROBE_GRANULARITY`, `BRIDGE_PROBE_BARS`
//! - `BRIDGE_PROBE_METRICS`: render Prometheus metrics to stderr on exit
//! - `RUST_LOG`, `LOG_FORMAT`

use anyhow::Context;
use bridge_client::infrastructure::telemetry;
use bridge_client::{
    AccountSnapshot, Bar, BridgeClient, BridgeConfig, ClientError, HttpBridgeTransport, Quote,
    get_metrics_handle, init_metrics,
};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct ProbeReport {
    endpoint: String,
    state: String,
    account: AccountSnapshot,
    quote: Quote,
    bars: Vec<Bar>,
}

fn main() -> anyhow::Result<()> {
    load_dotenv();

    telemetry::init().context("failed to initialize logging")?;

    let config = BridgeConfig::from_env()?;
    log_config(&config);

    if config.probe.render_metrics {
        init_metrics().context("failed to install metrics recorder")?;
    }

    let result = run(&config);

    if let Some(handle) = get_metrics_handle() {
        eprintln!("{}", handle.render());
    }

    match result {
        Ok(report) => {
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Err(err) => {
            if err.is_connectivity_failure() {
                tracing::warn!(
                    error = %err,
                    "Bridge unavailable; downstream callers may fall back to demo data"
                );
            }
            Err(err.into())
        }
    }
}

fn run(config: &BridgeConfig) -> Result<ProbeReport, ClientError> {
    let endpoint = config.endpoint()?;
    let mut client = BridgeClient::with_retry(HttpBridgeTransport::new(), config.retry.clone());

    client.connect_endpoint(endpoint.clone(), config.endpoint.timeout)?;

    let account = client.account_info()?;
    tracing::info!(
        login = account.login,
        balance = %account.balance,
        currency = %account.currency,
        "Account snapshot"
    );

    let quote = client.quote(&config.probe.symbol)?;
    tracing::info!(
        symbol = %quote.symbol,
        bid = %quote.bid,
        ask = %quote.ask,
        "Quote"
    );

    let bars = client.historical_bars(
        &config.probe.symbol,
        config.probe.granularity,
        config.probe.bars,
    )?;
    tracing::info!(
        symbol = %quote.symbol,
        granularity = %config.probe.granularity,
        count = bars.len(),
        "Historical bars"
    );

    let state = client.state().to_string();
    client.disconnect();

    Ok(ProbeReport {
        endpoint: endpoint.to_string(),
        state,
        account,
        quote,
        bars,
    })
}

/// Log the parsed configuration.
fn log_config(config: &BridgeConfig) {
    tracing::info!(
        host = %config.endpoint.host,
        port = config.endpoint.port,
        tls = config.endpoint.tls,
        timeout_secs = config.endpoint.timeout.as_secs(),
        max_attempts = config.retry.max_attempts,
        backoff_step_ms = config.retry.backoff_step.as_millis(),
        "Configuration loaded"
    );
    tracing::debug!(
        symbol = %config.probe.symbol,
        granularity = %config.probe.granularity,
        bars = config.probe.bars,
        "Probe settings"
    );
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

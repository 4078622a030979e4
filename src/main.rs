//! BingX Gateway Entry Point
//!
//! 1. Loads `.env`, logging and the YAML configuration
//! 2. Initializes markets and applies margin mode / leverage
//! 3. Seeds the state store with REST snapshots
//! 4. Runs the user data stream and the reconciliation loops until Ctrl+C

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use bingx_gateway::adapters::{BingxClient, BingxConfig};
use bingx_gateway::config::{self, constants, logging};
use bingx_gateway::core::{Gateway, GatewaySettings, SharedState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file (if it exists)
    dotenvy::dotenv().ok();
    logging::init_logging();

    info!("BingX gateway starting");

    let config_path = std::env::var("CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.yaml"));
    let config = config::load_config(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;
    let coins: Vec<&str> = config.symbols.iter().map(|s| s.coin.as_str()).collect();
    info!(symbols = ?coins, production = config.exchange.production, "[CONFIG] Loaded");
    constants::log_configuration();

    let mut bingx_config = BingxConfig::from_env().context("reading BingX credentials")?;
    bingx_config.production = config.exchange.production;
    let client = Arc::new(BingxClient::new(bingx_config, &config.exchange.quote));

    let gateway = Gateway::init(
        Arc::clone(&client),
        &config.symbols,
        &config.exchange.quote,
        GatewaySettings::from(&config),
    )
    .await
    .context("initializing markets")?;

    let reports = gateway.update_exchange_config().await;
    let failed = reports.iter().filter(|r| !r.is_ok()).count();
    if failed > 0 {
        warn!(failed, total = reports.len(), "[CONFIG] Some symbols could not be configured");
    }

    let state = Arc::new(SharedState::new());
    if !gateway.load_initial_state(&state).await {
        warn!("[INIT] Initial state incomplete, relying on reconciliation");
    }

    let cancel = CancellationToken::new();
    let mut tasks = vec![client.spawn_user_stream(cancel.clone())];
    tasks.extend(gateway.spawn_reconciliation(Arc::clone(&state), cancel.clone()));

    info!("Gateway running. Press Ctrl+C to stop.");
    match signal::ctrl_c().await {
        Ok(()) => info!("[SHUTDOWN] Graceful shutdown initiated"),
        Err(e) => error!(error = %e, "[SHUTDOWN] Failed to listen for Ctrl+C, stopping"),
    }
    cancel.cancel();

    for task in tasks {
        if let Err(e) = task.await {
            error!(error = %e, "[SHUTDOWN] Task ended abnormally");
        }
    }

    let snapshot = state.snapshot().await;
    info!(
        balance = snapshot.balance,
        open_orders = snapshot.open_orders.len(),
        "[SHUTDOWN] Clean exit"
    );
    Ok(())
}

//! Startup exchange configuration (margin mode + leverage per symbol)
//!
//! Every request is its own task so one symbol's failure cannot hold up
//! another. "Already set" codes mean the desired state holds and are
//! reported as such, at info level.

use std::fmt;
use std::sync::Arc;

use tracing::{error, info};

use crate::adapters::errors::{ExchangeResult, VenueErrorKind};
use crate::adapters::traits::VenueClient;
use crate::adapters::types::PositionSide;
use crate::core::gateway::Gateway;

/// Result of one configuration request
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigOutcome {
    Applied,
    AlreadySet,
    Failed(String),
}

impl ConfigOutcome {
    /// Desired state holds on the venue
    pub fn is_ok(&self) -> bool {
        !matches!(self, ConfigOutcome::Failed(_))
    }
}

impl fmt::Display for ConfigOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigOutcome::Applied => write!(f, "applied"),
            ConfigOutcome::AlreadySet => write!(f, "already set"),
            ConfigOutcome::Failed(e) => write!(f, "failed: {}", e),
        }
    }
}

/// Per-symbol outcome of `update_exchange_config`
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolConfigReport {
    pub symbol: String,
    pub margin_mode: ConfigOutcome,
    pub leverage_long: ConfigOutcome,
    pub leverage_short: ConfigOutcome,
}

impl SymbolConfigReport {
    pub fn is_ok(&self) -> bool {
        self.margin_mode.is_ok() && self.leverage_long.is_ok() && self.leverage_short.is_ok()
    }
}

fn classify(result: ExchangeResult<()>, unchanged: VenueErrorKind) -> ConfigOutcome {
    match result {
        Ok(()) => ConfigOutcome::Applied,
        Err(e) if e.kind() == unchanged => ConfigOutcome::AlreadySet,
        Err(e) => ConfigOutcome::Failed(e.to_string()),
    }
}

async fn join_outcome(handle: tokio::task::JoinHandle<ConfigOutcome>) -> ConfigOutcome {
    handle
        .await
        .unwrap_or_else(|e| ConfigOutcome::Failed(format!("task aborted: {}", e)))
}

fn log_outcome(symbol: &str, setting: &str, outcome: &ConfigOutcome) {
    match outcome {
        ConfigOutcome::Failed(e) => {
            error!(symbol = %symbol, setting = %setting, error = %e, "[EXCHANGE-CONFIG] Setting failed")
        }
        ok => info!(symbol = %symbol, setting = %setting, outcome = %ok, "[EXCHANGE-CONFIG] Setting resolved"),
    }
}

impl<C: VenueClient + 'static> Gateway<C> {
    /// Apply margin mode and both-side leverage to every tracked symbol
    pub async fn update_exchange_config(&self) -> Vec<SymbolConfigReport> {
        let mode = self.settings.margin_mode;

        // launch everything first, then await in symbol order
        let mut pending = Vec::with_capacity(self.markets.len());
        for market in self.markets.iter() {
            let spawn_leverage = |side: PositionSide| {
                let venue = Arc::clone(&self.venue);
                let symbol_id = market.symbol_id.clone();
                let leverage = market.leverage;
                tokio::spawn(async move {
                    classify(
                        venue.set_leverage(&symbol_id, leverage, side).await,
                        VenueErrorKind::LeverageUnchanged,
                    )
                })
            };

            let venue = Arc::clone(&self.venue);
            let symbol_id = market.symbol_id.clone();
            let margin = tokio::spawn(async move {
                classify(
                    venue.set_margin_mode(&symbol_id, mode).await,
                    VenueErrorKind::MarginModeUnchanged,
                )
            });
            let long = spawn_leverage(PositionSide::Long);
            let short = spawn_leverage(PositionSide::Short);
            pending.push((market.symbol.clone(), margin, long, short));
        }

        let mut reports = Vec::with_capacity(pending.len());
        for (symbol, margin, long, short) in pending {
            let report = SymbolConfigReport {
                margin_mode: join_outcome(margin).await,
                leverage_long: join_outcome(long).await,
                leverage_short: join_outcome(short).await,
                symbol,
            };
            log_outcome(&report.symbol, "margin_mode", &report.margin_mode);
            log_outcome(&report.symbol, "leverage_long", &report.leverage_long);
            log_outcome(&report.symbol, "leverage_short", &report.leverage_short);
            reports.push(report);
        }
        reports
    }
}

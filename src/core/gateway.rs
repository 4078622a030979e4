//! Gateway: the bot-facing entry point
//!
//! Owns the venue client and the market registry. Execution, history,
//! reconciliation and exchange configuration live in their own modules as
//! further `impl Gateway` blocks; this file holds construction and the
//! point-in-time snapshot queries.
//!
//! No method here returns an error. Failures are logged and surface as
//! `None`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info};

use crate::adapters::errors::ExchangeResult;
use crate::adapters::traits::VenueClient;
use crate::adapters::types::MarginMode;
use crate::config::constants::ohlcv_limit;
use crate::config::{GatewayConfig, SymbolConfig};
use crate::core::markets::MarketRegistry;
use crate::core::normalize::{
    normalize_balance, normalize_candle, normalize_orders, normalize_positions, normalize_ticker,
    venue_id_from_symbol,
};
use crate::core::state::SharedState;
use crate::core::types::{Candle, Order, Position, Ticker};
use crate::error::AppError;

/// Runtime knobs derived from the YAML config
#[derive(Debug, Clone)]
pub struct GatewaySettings {
    pub max_creations_per_batch: usize,
    pub max_cancellations_per_batch: usize,
    pub margin_mode: MarginMode,
    pub ticker_poll_interval: Duration,
    pub page_limit: usize,
    pub max_lookback_ms: u64,
    pub ohlcv_limit: u32,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self::from(&GatewayConfig::default())
    }
}

impl From<&GatewayConfig> for GatewaySettings {
    fn from(config: &GatewayConfig) -> Self {
        Self {
            max_creations_per_batch: config.execution.max_creations_per_batch,
            max_cancellations_per_batch: config.execution.max_cancellations_per_batch,
            margin_mode: config.execution.margin_mode,
            ticker_poll_interval: config.reconciliation.ticker_poll_interval(),
            page_limit: config.history.page_limit,
            max_lookback_ms: config.history.max_lookback_ms,
            ohlcv_limit: ohlcv_limit(),
        }
    }
}

/// Execution gateway for one venue account
pub struct Gateway<C: VenueClient> {
    pub(crate) venue: Arc<C>,
    pub(crate) markets: Arc<MarketRegistry>,
    pub(crate) settings: GatewaySettings,
}

impl<C: VenueClient + 'static> Gateway<C> {
    /// Assemble a gateway from an already-built registry
    pub fn new(venue: Arc<C>, markets: MarketRegistry, settings: GatewaySettings) -> Self {
        Self {
            venue,
            markets: Arc::new(markets),
            settings,
        }
    }

    /// Load market metadata for the configured coins
    ///
    /// This is the one call that can fail: without listings nothing else works.
    pub async fn init(
        venue: Arc<C>,
        symbols: &[SymbolConfig],
        quote: &str,
        settings: GatewaySettings,
    ) -> Result<Self, AppError> {
        let listings = venue.fetch_markets().await?;
        let markets = MarketRegistry::from_listings(&listings, symbols, quote);
        if markets.is_empty() {
            return Err(AppError::Init(
                "None of the configured symbols has an active market".to_string(),
            ));
        }
        info!(
            exchange = venue.exchange_name(),
            listings = listings.len(),
            tracked = markets.len(),
            "[INIT] Markets initialized"
        );
        Ok(Self::new(venue, markets, settings))
    }

    pub fn markets(&self) -> &MarketRegistry {
        &self.markets
    }

    pub fn settings(&self) -> &GatewaySettings {
        &self.settings
    }

    pub fn venue(&self) -> &Arc<C> {
        &self.venue
    }

    /// Open orders across all symbols, oldest first
    pub async fn fetch_open_orders(&self) -> Option<Vec<Order>> {
        let raw = log_failure("fetch_open_orders", self.venue.fetch_open_orders().await)?;
        Some(normalize_orders(&raw))
    }

    /// Cross-margin positions and quote balance, fetched concurrently
    pub async fn fetch_positions_and_balance(&self) -> Option<(Vec<Position>, f64)> {
        let (positions, balance) =
            tokio::join!(self.venue.fetch_positions(), self.venue.fetch_balance());
        let positions = log_failure("fetch_positions", positions)?;
        let balance = log_failure("fetch_balance", balance)?;
        Some((normalize_positions(&positions), normalize_balance(&balance)))
    }

    /// Tickers for the tracked symbols, keyed by canonical symbol
    pub async fn fetch_tickers(&self) -> Option<HashMap<String, Ticker>> {
        let raw = log_failure("fetch_tickers", self.venue.fetch_tickers().await)?;
        Some(
            raw.iter()
                .map(normalize_ticker)
                .filter(|t| self.markets.contains(&t.symbol))
                .map(|t| (t.symbol.clone(), t))
                .collect(),
        )
    }

    /// One page of candles, oldest first
    pub async fn fetch_ohlcv(&self, symbol: &str, timeframe: &str) -> Option<Vec<Candle>> {
        let symbol_id = self
            .markets
            .get(symbol)
            .map(|m| m.symbol_id.clone())
            .unwrap_or_else(|| venue_id_from_symbol(symbol));
        let raw = log_failure(
            "fetch_ohlcv",
            self.venue
                .fetch_ohlcv(&symbol_id, timeframe, self.settings.ohlcv_limit)
                .await,
        )?;
        Some(raw.iter().map(normalize_candle).collect())
    }

    /// Populate the state store with initial snapshots
    ///
    /// Returns false if any snapshot could not be fetched; the rest are
    /// still applied.
    pub async fn load_initial_state(&self, state: &SharedState) -> bool {
        state.seed_symbols(&self.markets.symbols()).await;

        let (orders, positions_balance, tickers) = tokio::join!(
            self.fetch_open_orders(),
            self.fetch_positions_and_balance(),
            self.fetch_tickers()
        );

        let mut complete = true;
        match orders {
            Some(orders) => state.replace_open_orders(orders).await,
            None => complete = false,
        }
        match positions_balance {
            Some((positions, balance)) => {
                state.replace_positions(positions).await;
                state.set_balance(balance).await;
            }
            None => complete = false,
        }
        match tickers {
            Some(tickers) => state.replace_tickers(tickers.into_values().collect()).await,
            None => complete = false,
        }
        complete
    }
}

/// Log a failed snapshot call and reduce it to `None`
fn log_failure<T>(operation: &str, result: ExchangeResult<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            error!(operation = %operation, error = %e, "[SNAPSHOT] Venue query failed");
            None
        }
    }
}

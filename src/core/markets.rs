//! Market metadata registry
//!
//! Built once from the venue's contract listings. Everything is immutable
//! afterwards except `min_qty`. Raising it takes a `MinQtyWriter`, which
//! only `core::policy` can construct.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::{info, warn};

use crate::adapters::types::VenueMarket;
use crate::config::constants::default_min_cost;
use crate::config::SymbolConfig;
use crate::core::normalize::{coin_from_symbol, symbol_for_coin, symbol_from_venue_id};
use crate::core::policy::MinQtyWriter;

/// Per-symbol trading constraints
#[derive(Debug)]
pub struct MarketSpec {
    /// Canonical symbol (`BTC/USDT:USDT`)
    pub symbol: String,
    /// Venue symbol id (`BTC-USDT`)
    pub symbol_id: String,
    pub coin: String,
    pub price_step: f64,
    pub qty_step: f64,
    pub min_cost: f64,
    pub contract_multiplier: f64,
    /// Leverage requested for both sides
    pub leverage: u32,
    min_qty_bits: AtomicU64,
}

impl MarketSpec {
    pub fn new(
        symbol: &str,
        symbol_id: &str,
        price_step: f64,
        qty_step: f64,
        min_qty: f64,
        min_cost: f64,
        leverage: u32,
    ) -> Self {
        Self {
            symbol: symbol.to_string(),
            symbol_id: symbol_id.to_string(),
            coin: coin_from_symbol(symbol),
            price_step,
            qty_step,
            min_cost,
            contract_multiplier: 1.0,
            leverage,
            min_qty_bits: AtomicU64::new(min_qty.to_bits()),
        }
    }

    /// Build from a venue listing
    pub fn from_listing(listing: &VenueMarket, leverage: u32) -> Self {
        let min_qty = if listing.size > 0.0 {
            listing.size
        } else {
            listing.trade_min_quantity
        };
        Self::new(
            &symbol_from_venue_id(&listing.symbol),
            &listing.symbol,
            step_from_precision(listing.price_precision),
            step_from_precision(listing.quantity_precision),
            min_qty,
            listing.trade_min_usdt.unwrap_or_else(default_min_cost),
            leverage,
        )
    }

    /// Smallest order quantity currently believed valid
    pub fn min_qty(&self) -> f64 {
        f64::from_bits(self.min_qty_bits.load(Ordering::Acquire))
    }

    /// Overwrite the cached minimum; returns the previous value
    pub fn raise_min_qty(&self, new_min: f64, _writer: &MinQtyWriter) -> f64 {
        f64::from_bits(self.min_qty_bits.swap(new_min.to_bits(), Ordering::AcqRel))
    }
}

/// `10^-precision`, rounded to 12 decimals
pub fn step_from_precision(precision: u32) -> f64 {
    let step = 10f64.powi(-(precision as i32));
    (step * 1e12).round() / 1e12
}

/// Tracked markets keyed by canonical symbol
#[derive(Debug, Default)]
pub struct MarketRegistry {
    markets: HashMap<String, Arc<MarketSpec>>,
    /// Configuration order, used for deterministic iteration
    order: Vec<String>,
}

impl MarketRegistry {
    /// Resolve configured coins against the venue listings
    ///
    /// Coins without an active listing are skipped with a warning.
    pub fn from_listings(listings: &[VenueMarket], symbols: &[SymbolConfig], quote: &str) -> Self {
        let by_id: HashMap<&str, &VenueMarket> = listings
            .iter()
            .filter(|m| m.is_active())
            .map(|m| (m.symbol.as_str(), m))
            .collect();

        let mut registry = Self::default();
        for configured in symbols {
            let symbol = symbol_for_coin(&configured.coin, quote);
            let symbol_id = format!("{}-{}", configured.coin.to_uppercase(), quote);
            match by_id.get(symbol_id.as_str()) {
                Some(listing) => {
                    let spec = MarketSpec::from_listing(listing, configured.leverage);
                    info!(
                        symbol = %spec.symbol,
                        price_step = spec.price_step,
                        qty_step = spec.qty_step,
                        min_qty = spec.min_qty(),
                        min_cost = spec.min_cost,
                        "[INIT] Market initialized"
                    );
                    registry.insert(spec);
                }
                None => {
                    warn!(symbol = %symbol, symbol_id = %symbol_id, "[INIT] No active market listing, skipping");
                }
            }
        }
        registry
    }

    pub fn insert(&mut self, spec: MarketSpec) {
        if !self.markets.contains_key(&spec.symbol) {
            self.order.push(spec.symbol.clone());
        }
        self.markets.insert(spec.symbol.clone(), Arc::new(spec));
    }

    pub fn get(&self, symbol: &str) -> Option<&Arc<MarketSpec>> {
        self.markets.get(symbol)
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.markets.contains_key(symbol)
    }

    /// Markets in configuration order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<MarketSpec>> {
        self.order.iter().filter_map(|s| self.markets.get(s))
    }

    /// Canonical symbols in configuration order
    pub fn symbols(&self) -> Vec<String> {
        self.order.clone()
    }

    pub fn len(&self) -> usize {
        self.markets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markets.is_empty()
    }
}

//! Configuration types for gateway settings
//!
//! This module defines the configuration structs loaded from YAML.
//! Credentials are not part of the file; they come from the environment
//! (see `BingxConfig::from_env`).

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::adapters::types::MarginMode;
use crate::error::AppError;

/// 6.99 days, just under the venue's 7-day history window
pub const DEFAULT_MAX_LOOKBACK_MS: u64 = 603_936_000;

// ============================================================================
// Configuration Structs
// ============================================================================

/// Venue connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeSection {
    /// Settlement asset, also the symbol suffix (e.g. "USDT")
    #[serde(default = "default_quote")]
    pub quote: String,
    /// Production (true) or demo-trading (false) endpoints
    #[serde(default = "default_true")]
    pub production: bool,
}

impl Default for ExchangeSection {
    fn default() -> Self {
        Self {
            quote: default_quote(),
            production: true,
        }
    }
}

/// One traded coin
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SymbolConfig {
    /// Base asset (e.g. "BTC")
    pub coin: String,
    /// Leverage applied to both position sides at startup (1-150)
    #[serde(default = "default_leverage")]
    pub leverage: u32,
}

/// Batch caps and margin settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionConfig {
    #[serde(default = "default_max_creations")]
    pub max_creations_per_batch: usize,
    #[serde(default = "default_max_cancellations")]
    pub max_cancellations_per_batch: usize,
    #[serde(default)]
    pub margin_mode: MarginMode,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            max_creations_per_batch: default_max_creations(),
            max_cancellations_per_batch: default_max_cancellations(),
            margin_mode: MarginMode::default(),
        }
    }
}

/// Reconciliation loop timing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconciliationConfig {
    #[serde(default = "default_ticker_poll_secs")]
    pub ticker_poll_interval_secs: u64,
}

impl ReconciliationConfig {
    pub fn ticker_poll_interval(&self) -> Duration {
        Duration::from_secs(self.ticker_poll_interval_secs)
    }
}

impl Default for ReconciliationConfig {
    fn default() -> Self {
        Self {
            ticker_poll_interval_secs: default_ticker_poll_secs(),
        }
    }
}

/// History query limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Records per page
    #[serde(default = "default_page_limit")]
    pub page_limit: usize,
    /// Widest window a single query may span
    #[serde(default = "default_max_lookback_ms")]
    pub max_lookback_ms: u64,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            page_limit: default_page_limit(),
            max_lookback_ms: default_max_lookback_ms(),
        }
    }
}

/// Root gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GatewayConfig {
    #[serde(default)]
    pub exchange: ExchangeSection,
    /// Traded coins
    pub symbols: Vec<SymbolConfig>,
    #[serde(default)]
    pub execution: ExecutionConfig,
    #[serde(default)]
    pub reconciliation: ReconciliationConfig,
    #[serde(default)]
    pub history: HistoryConfig,
}

impl GatewayConfig {
    /// Validate all configuration rules
    pub fn validate(&self) -> Result<(), AppError> {
        if self.exchange.quote.trim().is_empty() {
            return Err(AppError::Config("exchange.quote cannot be empty".to_string()));
        }

        if self.symbols.is_empty() {
            return Err(AppError::Config(
                "Configuration must contain at least one symbol".to_string(),
            ));
        }

        let mut seen = std::collections::HashSet::new();
        for symbol in &self.symbols {
            if symbol.coin.trim().is_empty() {
                return Err(AppError::Config("Symbol coin cannot be empty".to_string()));
            }
            if !seen.insert(symbol.coin.to_uppercase()) {
                return Err(AppError::Config(format!(
                    "Duplicate symbol '{}'",
                    symbol.coin
                )));
            }
            if symbol.leverage < 1 || symbol.leverage > 150 {
                return Err(AppError::Config(format!(
                    "Symbol '{}': leverage must be 1-150, got {}",
                    symbol.coin, symbol.leverage
                )));
            }
        }

        if self.execution.max_creations_per_batch == 0
            || self.execution.max_cancellations_per_batch == 0
        {
            return Err(AppError::Config("Batch caps must be > 0".to_string()));
        }

        if self.reconciliation.ticker_poll_interval_secs == 0 {
            return Err(AppError::Config(
                "ticker_poll_interval_secs must be > 0".to_string(),
            ));
        }

        if self.history.page_limit == 0 || self.history.max_lookback_ms == 0 {
            return Err(AppError::Config(
                "history.page_limit and history.max_lookback_ms must be > 0".to_string(),
            ));
        }

        Ok(())
    }
}

fn default_quote() -> String {
    "USDT".to_string()
}

fn default_true() -> bool {
    true
}

fn default_leverage() -> u32 {
    10
}

fn default_max_creations() -> usize {
    3
}

fn default_max_cancellations() -> usize {
    6
}

fn default_ticker_poll_secs() -> u64 {
    10
}

fn default_page_limit() -> usize {
    1000
}

fn default_max_lookback_ms() -> u64 {
    DEFAULT_MAX_LOOKBACK_MS
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> GatewayConfig {
        GatewayConfig {
            symbols: vec![SymbolConfig {
                coin: "BTC".to_string(),
                leverage: 10,
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults() {
        let config = valid_config();
        assert_eq!(config.exchange.quote, "USDT");
        assert_eq!(config.execution.max_creations_per_batch, 3);
        assert_eq!(config.execution.max_cancellations_per_batch, 6);
        assert_eq!(config.execution.margin_mode, MarginMode::Cross);
        assert_eq!(config.reconciliation.ticker_poll_interval(), Duration::from_secs(10));
        assert_eq!(config.history.page_limit, 1000);
        assert_eq!(config.history.max_lookback_ms, 603_936_000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_no_symbols() {
        let config = GatewayConfig::default();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("at least one symbol"));
    }

    #[test]
    fn test_validation_duplicate_coin() {
        let mut config = valid_config();
        config.symbols.push(SymbolConfig {
            coin: "btc".to_string(),
            leverage: 5,
        });
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Duplicate symbol"));
    }

    #[test]
    fn test_validation_leverage_range() {
        let mut config = valid_config();
        config.symbols[0].leverage = 0;
        assert!(config.validate().is_err());
        config.symbols[0].leverage = 151;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_zero_batch_cap() {
        let mut config = valid_config();
        config.execution.max_cancellations_per_batch = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Batch caps"));
    }
}

//! Configuration module for gateway settings and YAML loading
//!
//! This module provides:
//! - Configuration types (`GatewayConfig`, `SymbolConfig`, ...)
//! - YAML loading functionality (`load_config`)
//! - Tuning constants with environment variable overrides
//! - Logging initialization

pub mod constants;
pub mod logging;
mod loader;
mod types;

// Re-export types
pub use types::{
    ExchangeSection, ExecutionConfig, GatewayConfig, HistoryConfig, ReconciliationConfig,
    SymbolConfig, DEFAULT_MAX_LOOKBACK_MS,
};

// Re-export loader functions
pub use loader::{load_config, load_config_from_str};

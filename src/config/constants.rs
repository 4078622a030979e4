//! Tuning constants with environment overrides
//!
//! Values that are not part of the YAML file but occasionally need
//! adjusting in the field. Each can be overridden via an environment variable.

use std::time::Duration;

// =============================================================================
// User Data Stream
// =============================================================================

/// Listen key keepalive interval (default: 30 minutes)
///
/// The venue expires listen keys after 60 minutes without a keepalive.
///
/// Environment variable: `LISTEN_KEY_KEEPALIVE_SECS`
pub fn listen_key_keepalive_interval() -> Duration {
    let secs = std::env::var("LISTEN_KEY_KEEPALIVE_SECS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(1800);
    Duration::from_secs(secs)
}

/// Upper bound for the stream reconnect backoff (default: 60 seconds)
///
/// Environment variable: `STREAM_RECONNECT_MAX_BACKOFF_SECS`
pub fn stream_reconnect_max_backoff() -> Duration {
    let secs = std::env::var("STREAM_RECONNECT_MAX_BACKOFF_SECS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(60);
    Duration::from_secs(secs)
}

// =============================================================================
// Market Data
// =============================================================================

/// Candles requested per OHLCV call (default: 1000)
///
/// Environment variable: `OHLCV_LIMIT`
pub fn ohlcv_limit() -> u32 {
    std::env::var("OHLCV_LIMIT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(1000)
}

/// Minimum order cost used when a listing publishes none (default: 2.2)
///
/// Environment variable: `DEFAULT_MIN_COST`
pub fn default_min_cost() -> f64 {
    std::env::var("DEFAULT_MIN_COST")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(2.2)
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Print all tuning values (for startup logs)
pub fn log_configuration() {
    tracing::info!("=== Gateway Tuning ===");
    tracing::info!("  - Listen key keepalive: {:?}", listen_key_keepalive_interval());
    tracing::info!("  - Stream reconnect max backoff: {:?}", stream_reconnect_max_backoff());
    tracing::info!("  - OHLCV limit: {}", ohlcv_limit());
    tracing::info!("  - Default min cost: {}", default_min_cost());
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial(env)]
    fn test_default_values() {
        assert_eq!(listen_key_keepalive_interval(), Duration::from_secs(1800));
        assert_eq!(stream_reconnect_max_backoff(), Duration::from_secs(60));
        assert_eq!(ohlcv_limit(), 1000);
        assert_eq!(default_min_cost(), 2.2);
    }

    #[test]
    #[serial(env)]
    fn test_env_override() {
        std::env::set_var("OHLCV_LIMIT", "250");
        assert_eq!(ohlcv_limit(), 250);
        std::env::remove_var("OHLCV_LIMIT");

        std::env::set_var("STREAM_RECONNECT_MAX_BACKOFF_SECS", "not-a-number");
        assert_eq!(stream_reconnect_max_backoff(), Duration::from_secs(60));
        std::env::remove_var("STREAM_RECONNECT_MAX_BACKOFF_SECS");
    }
}

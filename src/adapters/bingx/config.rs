//! BingX Configuration
//!
//! Credentials and endpoints for the BingX perpetual swap API.

use std::fmt;

use crate::adapters::errors::{ExchangeError, ExchangeResult};

const PROD_REST_URL: &str = "https://open-api.bingx.com";
const PROD_WS_URL: &str = "wss://open-api-swap.bingx.com/swap-market";
const DEMO_REST_URL: &str = "https://open-api-vst.bingx.com";
const DEMO_WS_URL: &str = "wss://vst-open-api-ws.bingx.com/swap-market";

/// Configuration for BingX connection
#[derive(Clone)]
pub struct BingxConfig {
    pub api_key: String,
    pub api_secret: String,
    /// Sent as `X-SOURCE-KEY` when present
    pub broker_code: Option<String>,
    /// Use production endpoints (true) or the demo-trading ones (false)
    pub production: bool,
    /// Explicit REST base URL, overrides `production`
    pub rest_url_override: Option<String>,
    /// Explicit WebSocket base URL, overrides `production`
    pub ws_url_override: Option<String>,
}

impl BingxConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> ExchangeResult<Self> {
        let api_key = std::env::var("BINGX_API_KEY")
            .map_err(|_| ExchangeError::AuthenticationFailed("BINGX_API_KEY not set".into()))?;
        if api_key.is_empty() {
            return Err(ExchangeError::AuthenticationFailed("BINGX_API_KEY is empty".into()));
        }

        let api_secret = std::env::var("BINGX_API_SECRET")
            .map_err(|_| ExchangeError::AuthenticationFailed("BINGX_API_SECRET not set".into()))?;
        if api_secret.is_empty() {
            return Err(ExchangeError::AuthenticationFailed("BINGX_API_SECRET is empty".into()));
        }

        let broker_code = std::env::var("BINGX_BROKER_CODE")
            .ok()
            .filter(|s| !s.is_empty());
        let production = std::env::var("BINGX_PRODUCTION")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(true);

        Ok(Self {
            api_key,
            api_secret,
            broker_code,
            production,
            rest_url_override: std::env::var("BINGX_REST_URL").ok().filter(|s| !s.is_empty()),
            ws_url_override: std::env::var("BINGX_WS_URL").ok().filter(|s| !s.is_empty()),
        })
    }

    /// Get REST API base URL
    pub fn rest_base_url(&self) -> &str {
        match &self.rest_url_override {
            Some(url) => url.trim_end_matches('/'),
            None if self.production => PROD_REST_URL,
            None => DEMO_REST_URL,
        }
    }

    /// Get WebSocket base URL
    pub fn ws_base_url(&self) -> &str {
        match &self.ws_url_override {
            Some(url) => url.trim_end_matches('/'),
            None if self.production => PROD_WS_URL,
            None => DEMO_WS_URL,
        }
    }
}

impl Default for BingxConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_secret: String::new(),
            broker_code: None,
            production: true,
            rest_url_override: None,
            ws_url_override: None,
        }
    }
}

// Keep the secret out of logs
impl fmt::Debug for BingxConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BingxConfig")
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .field("broker_code", &self.broker_code)
            .field("rest_base_url", &self.rest_base_url())
            .field("ws_base_url", &self.ws_base_url())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_bingx_config_urls() {
        let config = BingxConfig { production: true, ..Default::default() };
        assert_eq!(config.rest_base_url(), PROD_REST_URL);
        assert_eq!(config.ws_base_url(), PROD_WS_URL);

        let config = BingxConfig { production: false, ..Default::default() };
        assert!(config.rest_base_url().contains("vst"));
        assert!(config.ws_base_url().contains("vst"));
    }

    #[test]
    fn test_bingx_config_override_strips_trailing_slash() {
        let config = BingxConfig {
            rest_url_override: Some("http://127.0.0.1:1234/".to_string()),
            ..Default::default()
        };
        assert_eq!(config.rest_base_url(), "http://127.0.0.1:1234");
    }

    #[test]
    fn test_debug_redacts_secret() {
        let config = BingxConfig {
            api_key: "key".to_string(),
            api_secret: "super-secret".to_string(),
            ..Default::default()
        };
        let debug_str = format!("{:?}", config);
        assert!(!debug_str.contains("super-secret"), "Got: {}", debug_str);
        assert!(debug_str.contains("<redacted>"));
    }

    #[test]
    #[serial(env)]
    fn test_from_env_missing_key() {
        std::env::remove_var("BINGX_API_KEY");
        let result = BingxConfig::from_env();
        assert!(matches!(result, Err(ExchangeError::AuthenticationFailed(_))));
    }

    #[test]
    #[serial(env)]
    fn test_from_env_reads_broker_code() {
        std::env::set_var("BINGX_API_KEY", "k");
        std::env::set_var("BINGX_API_SECRET", "s");
        std::env::set_var("BINGX_BROKER_CODE", "broker-1");
        let config = BingxConfig::from_env().unwrap();
        assert_eq!(config.broker_code.as_deref(), Some("broker-1"));
        std::env::remove_var("BINGX_API_KEY");
        std::env::remove_var("BINGX_API_SECRET");
        std::env::remove_var("BINGX_BROKER_CODE");
    }
}

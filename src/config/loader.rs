//! Configuration loader for YAML files
//!
//! This module handles loading and validating configuration from YAML files.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::error::AppError;

use super::types::GatewayConfig;

/// Load configuration from a YAML file
///
/// This function:
/// 1. Checks if the file exists
/// 2. Parses the YAML content
/// 3. Validates the configuration rules
///
/// # Example
/// ```ignore
/// use std::path::Path;
/// use bingx_gateway::config::load_config;
///
/// let config = load_config(Path::new("config.yaml"))?;
/// ```
pub fn load_config(path: &Path) -> Result<GatewayConfig, AppError> {
    if !path.exists() {
        return Err(AppError::Config(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let file = File::open(path)?;
    let reader = BufReader::new(file);

    let config: GatewayConfig = serde_yaml::from_reader(reader).map_err(|e| {
        AppError::Config(format!("YAML parse error in '{}': {}", path.display(), e))
    })?;

    config.validate()?;

    Ok(config)
}

/// Load configuration from a YAML string (useful for testing)
pub fn load_config_from_str(yaml_content: &str) -> Result<GatewayConfig, AppError> {
    let config: GatewayConfig = serde_yaml::from_str(yaml_content)
        .map_err(|e| AppError::Config(format!("YAML parse error: {}", e)))?;

    config.validate()?;

    Ok(config)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::types::MarginMode;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const VALID_CONFIG_YAML: &str = r#"
exchange:
  quote: USDT
  production: false
symbols:
  - coin: BTC
    leverage: 10
  - coin: ETH
    leverage: 5
execution:
  max_creations_per_batch: 4
  max_cancellations_per_batch: 8
  margin_mode: cross
reconciliation:
  ticker_poll_interval_secs: 15
history:
  page_limit: 500
"#;

    #[test]
    fn test_load_config_from_str_valid() {
        let config = load_config_from_str(VALID_CONFIG_YAML).unwrap();
        assert_eq!(config.symbols.len(), 2);
        assert_eq!(config.symbols[1].coin, "ETH");
        assert!(!config.exchange.production);
        assert_eq!(config.execution.max_cancellations_per_batch, 8);
        assert_eq!(config.execution.margin_mode, MarginMode::Cross);
        assert_eq!(config.reconciliation.ticker_poll_interval_secs, 15);
        assert_eq!(config.history.page_limit, 500);
        // unspecified fields keep their defaults
        assert_eq!(config.history.max_lookback_ms, 603_936_000);
    }

    #[test]
    fn test_load_config_minimal() {
        let config = load_config_from_str("symbols:\n  - coin: SOL\n").unwrap();
        assert_eq!(config.symbols[0].leverage, 10);
        assert_eq!(config.execution.max_creations_per_batch, 3);
        assert!(config.exchange.production);
    }

    #[test]
    fn test_load_config_from_str_invalid_yaml() {
        let result = load_config_from_str("invalid: yaml: content: [");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("YAML parse error"));
    }

    #[test]
    fn test_load_config_from_str_validation_failure() {
        let yaml = r#"
symbols:
  - coin: BTC
    leverage: 500
"#;
        let result = load_config_from_str(yaml);
        assert!(result.unwrap_err().to_string().contains("leverage must be 1-150"));
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config(Path::new("/nonexistent/path/config.yaml"));
        assert!(result.unwrap_err().to_string().contains("Configuration file not found"));
    }

    #[test]
    fn test_load_config_from_file_valid() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(VALID_CONFIG_YAML.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.symbols.len(), 2);
        assert_eq!(config.symbols[0].coin, "BTC");
    }

    #[test]
    fn test_load_config_from_file_invalid_yaml() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"invalid: [yaml: content").unwrap();
        temp_file.flush().unwrap();

        let result = load_config(temp_file.path());
        assert!(result.unwrap_err().to_string().contains("YAML parse error"));
    }
}

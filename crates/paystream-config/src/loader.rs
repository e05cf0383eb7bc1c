//! Configuration loading and validation.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::PaystreamConfig;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Load full paystream configuration from a YAML file.
pub fn load_config(path: &Path) -> Result<PaystreamConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: PaystreamConfig = serde_yaml::from_str(&content)?;
    validate_config(&config)?;
    Ok(config)
}

fn validate_config(config: &PaystreamConfig) -> Result<(), ConfigError> {
    if config.version == 0 {
        return Err(ConfigError::Invalid(
            "version must be greater than 0".to_string(),
        ));
    }

    if config.accrual.tick_interval_ms == 0 {
        return Err(ConfigError::Invalid(
            "accrual.tick_interval_ms must be > 0".to_string(),
        ));
    }

    if config.accrual.batch_tick_interval_ms < config.accrual.tick_interval_ms {
        return Err(ConfigError::Invalid(
            "accrual.batch_tick_interval_ms must not be below tick_interval_ms".to_string(),
        ));
    }

    if config.periods.default_period_seconds == 0 {
        return Err(ConfigError::Invalid(
            "periods.default_period_seconds must be > 0".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(yaml: &str) -> Result<PaystreamConfig, ConfigError> {
        let config: PaystreamConfig = serde_yaml::from_str(yaml)?;
        validate_config(&config)?;
        Ok(config)
    }

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = parse("{}").unwrap();
        assert_eq!(config.version, 1);
        assert_eq!(config.accrual.tick_interval_ms, 1_000);
        assert_eq!(config.accrual.batch_tick_interval_ms, 2_000);
        assert_eq!(config.saga.finalize_settle_ms, 1_000);
        assert_eq!(config.periods.default_period_seconds, 2_592_000);
    }

    #[test]
    fn test_partial_document_overrides_one_section() {
        let config = parse(
            r#"
accrual:
  tick_interval_ms: 500
  batch_tick_interval_ms: 3000
"#,
        )
        .unwrap();
        assert_eq!(config.accrual.tick_interval_ms, 500);
        assert_eq!(config.accrual.batch_tick_interval_ms, 3_000);
        assert_eq!(config.saga.finalize_settle_ms, 1_000);
    }

    #[test]
    fn test_zero_tick_interval_is_rejected() {
        let err = parse(
            r#"
accrual:
  tick_interval_ms: 0
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_batch_interval_below_tick_interval_is_rejected() {
        let err = parse(
            r#"
accrual:
  tick_interval_ms: 2000
  batch_tick_interval_ms: 1000
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_zero_version_is_rejected() {
        let err = parse("version: 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }
}

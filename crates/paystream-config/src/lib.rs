//! # Paystream Config
//!
//! Unified single-file configuration management for paystream.
//! A single `paystream.yaml` configures the accrual ticker, the
//! saga runner, and the period presets.

mod loader;

pub use loader::{load_config, ConfigError};

use serde::Deserialize;

/// Top-level configuration schema for paystream.
#[derive(Debug, Clone, Deserialize)]
pub struct PaystreamConfig {
    /// Config schema version.
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub accrual: AccrualConfig,
    #[serde(default)]
    pub saga: SagaConfig,
    #[serde(default)]
    pub periods: PeriodsConfig,
}

fn default_version() -> u32 {
    1
}

impl Default for PaystreamConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            accrual: AccrualConfig::default(),
            saga: SagaConfig::default(),
            periods: PeriodsConfig::default(),
        }
    }
}

/// Accrual ticker settings.
#[derive(Debug, Clone, Deserialize)]
pub struct AccrualConfig {
    /// Re-derivation interval for a single entity, milliseconds.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// Re-derivation interval when evaluating many entities.
    #[serde(default = "default_batch_tick_interval_ms")]
    pub batch_tick_interval_ms: u64,
}

fn default_tick_interval_ms() -> u64 {
    1_000
}

fn default_batch_tick_interval_ms() -> u64 {
    2_000
}

impl Default for AccrualConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            batch_tick_interval_ms: default_batch_tick_interval_ms(),
        }
    }
}

/// Saga runner settings.
#[derive(Debug, Clone, Deserialize)]
pub struct SagaConfig {
    /// How long the trailing finalize step waits before settling,
    /// milliseconds.
    #[serde(default = "default_finalize_settle_ms")]
    pub finalize_settle_ms: u64,
}

fn default_finalize_settle_ms() -> u64 {
    1_000
}

impl Default for SagaConfig {
    fn default() -> Self {
        Self {
            finalize_settle_ms: default_finalize_settle_ms(),
        }
    }
}

/// Period presets for organizations that do not supply one.
#[derive(Debug, Clone, Deserialize)]
pub struct PeriodsConfig {
    /// Default period length in seconds (monthly).
    #[serde(default = "default_period_seconds")]
    pub default_period_seconds: u64,
}

fn default_period_seconds() -> u64 {
    2_592_000
}

impl Default for PeriodsConfig {
    fn default() -> Self {
        Self {
            default_period_seconds: default_period_seconds(),
        }
    }
}

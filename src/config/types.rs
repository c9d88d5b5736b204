//! Configuration types for the monitoring engine
//!
//! Loaded once from YAML at process start and immutable thereafter.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Sleep intervals used by the monitoring loops, derived from `EngineConfig`
#[derive(Debug, Clone, Copy)]
pub struct LoopTiming {
    /// Sleep between successful iterations
    pub update_interval: Duration,
    /// Sleep after a failed iteration
    pub error_backoff: Duration,
    /// Sleep after a view round with no eligible quotes
    pub view_retry: Duration,
    /// Minimum gap between error notices to one subscription's sink
    pub error_notify_throttle: Duration,
}

/// Engine settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Spread threshold used when a subscribe request omits one (%)
    #[serde(default = "default_threshold_pct")]
    pub default_threshold_pct: f64,
    /// Seconds between successful loop iterations
    #[serde(default = "default_update_interval")]
    pub update_interval_secs: u64,
    /// Seconds to back off after a failed iteration
    #[serde(default = "default_error_backoff")]
    pub error_backoff_secs: u64,
    /// Seconds before a view retries after an empty round
    #[serde(default = "default_view_retry")]
    pub view_retry_secs: u64,
    /// Minimum seconds between error notices per subscription
    #[serde(default = "default_error_notify_throttle")]
    pub error_notify_throttle_secs: u64,
    /// Maximum spread samples kept per symbol pair
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
    /// Exchanges subscribe requests may reference
    #[serde(default = "default_exchanges")]
    pub supported_exchanges: Vec<String>,
    /// Market types subscribe requests may reference
    #[serde(default = "default_market_types")]
    pub supported_market_types: Vec<String>,
    /// Base URL of the GoMarket price API (env override: GOMARKET_BASE)
    #[serde(default = "default_gomarket_base")]
    pub gomarket_base: String,
}

fn default_threshold_pct() -> f64 {
    0.5
}

fn default_update_interval() -> u64 {
    15
}

fn default_error_backoff() -> u64 {
    30
}

fn default_view_retry() -> u64 {
    10
}

fn default_error_notify_throttle() -> u64 {
    60
}

fn default_history_capacity() -> usize {
    100
}

fn default_exchanges() -> Vec<String> {
    ["binance", "okx", "bybit", "deribit"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_market_types() -> Vec<String> {
    ["spot", "swap", "future", "option"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_gomarket_base() -> String {
    "https://gomarket-api.goquant.io/api".to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_threshold_pct: default_threshold_pct(),
            update_interval_secs: default_update_interval(),
            error_backoff_secs: default_error_backoff(),
            view_retry_secs: default_view_retry(),
            error_notify_throttle_secs: default_error_notify_throttle(),
            history_capacity: default_history_capacity(),
            supported_exchanges: default_exchanges(),
            supported_market_types: default_market_types(),
            gomarket_base: default_gomarket_base(),
        }
    }
}

impl EngineConfig {
    /// Validate engine configuration rules
    pub fn validate(&self) -> Result<(), AppError> {
        if !self.default_threshold_pct.is_finite()
            || self.default_threshold_pct <= 0.0
            || self.default_threshold_pct >= 100.0
        {
            return Err(AppError::Config(format!(
                "default_threshold_pct must be > 0 and < 100 (got {})",
                self.default_threshold_pct
            )));
        }

        if self.update_interval_secs == 0 || self.error_backoff_secs == 0 || self.view_retry_secs == 0
        {
            return Err(AppError::Config(
                "update/backoff/retry intervals must be > 0 seconds".to_string(),
            ));
        }

        if self.history_capacity == 0 {
            return Err(AppError::Config(
                "history_capacity must be > 0".to_string(),
            ));
        }

        if self.supported_exchanges.is_empty() {
            return Err(AppError::Config(
                "supported_exchanges cannot be empty".to_string(),
            ));
        }

        if self.supported_market_types.is_empty() {
            return Err(AppError::Config(
                "supported_market_types cannot be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Loop sleep intervals derived from the configured seconds
    pub fn timing(&self) -> LoopTiming {
        LoopTiming {
            update_interval: Duration::from_secs(self.update_interval_secs),
            error_backoff: Duration::from_secs(self.error_backoff_secs),
            view_retry: Duration::from_secs(self.view_retry_secs),
            error_notify_throttle: Duration::from_secs(self.error_notify_throttle_secs),
        }
    }
}

/// Arbitrage monitor started at process launch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorEntry {
    /// First leg as "symbol@exchange" (e.g. "btc-usdt@binance")
    pub asset1: String,
    /// Second leg as "symbol@exchange"
    pub asset2: String,
    /// Alert threshold in percent; engine default when omitted
    #[serde(default)]
    pub threshold_pct: Option<f64>,
}

/// Consolidated market view started at process launch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewEntry {
    pub symbol: String,
    pub exchanges: Vec<String>,
}

/// Root application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub engine: EngineConfig,
    /// Monitors to start at launch (the chat surface adds more at runtime)
    #[serde(default)]
    pub monitors: Vec<MonitorEntry>,
    /// Views to start at launch
    #[serde(default)]
    pub views: Vec<ViewEntry>,
}

impl AppConfig {
    /// Validate all configuration rules
    pub fn validate(&self) -> Result<(), AppError> {
        self.engine.validate()?;

        for entry in &self.monitors {
            for asset in [&entry.asset1, &entry.asset2] {
                if !asset.contains('@') {
                    return Err(AppError::Config(format!(
                        "monitor asset '{}' must be symbol@exchange",
                        asset
                    )));
                }
            }
            if let Some(threshold) = entry.threshold_pct {
                if !threshold.is_finite() || threshold <= 0.0 || threshold >= 100.0 {
                    return Err(AppError::Config(format!(
                        "monitor '{} / {}': threshold_pct must be > 0 and < 100 (got {})",
                        entry.asset1, entry.asset2, threshold
                    )));
                }
            }
        }

        for entry in &self.views {
            if entry.exchanges.is_empty() {
                return Err(AppError::Config(format!(
                    "view '{}' must name at least one exchange",
                    entry.symbol
                )));
            }
        }

        Ok(())
    }
}

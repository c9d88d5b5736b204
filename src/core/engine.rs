//! Engine facade: subscribe/stop commands, validation, and task spawning
//!
//! The engine owns the registry, the history store, and the shared
//! provider/sink handles. Subscribe commands validate their request
//! against the engine configuration, register the subscription, and spawn
//! its loop; stop commands flip the cooperative flag and return
//! immediately.

use std::sync::Arc;

use tracing::info;

use crate::config::{EngineConfig, LoopTiming, MonitorEntry, ViewEntry};
use crate::core::history::{HistoryStore, PairStats};
use crate::core::monitor::monitor_loop;
use crate::core::registry::{
    MonitorKey, MonitorParams, StopOutcome, Subscribe, SubscriptionRegistry, ViewKey, ViewParams,
};
use crate::core::view::view_loop;
use crate::error::{AppError, Result};
use crate::provider::QuoteProvider;
use crate::sink::{NotificationSink, SinkTarget};

/// Outcome of an engine subscribe command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscribeOutcome {
    /// A fresh loop was spawned
    Created,
    /// An identical subscription is already running; no new loop
    AlreadyActive,
}

/// Arbitrage monitoring engine
pub struct Engine {
    config: EngineConfig,
    timing: LoopTiming,
    registry: Arc<SubscriptionRegistry>,
    history: Arc<HistoryStore>,
    provider: Arc<dyn QuoteProvider>,
    sink: Arc<dyn NotificationSink>,
}

impl Engine {
    pub fn new(
        config: EngineConfig,
        provider: Arc<dyn QuoteProvider>,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        let timing = config.timing();
        let history = Arc::new(HistoryStore::new(config.history_capacity));
        Self {
            config,
            timing,
            registry: Arc::new(SubscriptionRegistry::new()),
            history,
            provider,
            sink,
        }
    }

    pub fn registry(&self) -> &Arc<SubscriptionRegistry> {
        &self.registry
    }

    pub fn history(&self) -> &Arc<HistoryStore> {
        &self.history
    }

    /// Subscribe an arbitrage monitor and spawn its loop
    pub async fn subscribe_monitor(&self, params: MonitorParams) -> Result<SubscribeOutcome> {
        self.validate_monitor(&params)?;

        match self.registry.subscribe_monitor(params).await {
            Subscribe::Created(sub) => {
                info!(monitor = %sub.params.label(), "Spawning monitor loop");
                tokio::spawn(monitor_loop(
                    Arc::clone(&self.provider),
                    Arc::clone(&self.sink),
                    Arc::clone(&self.history),
                    sub,
                    self.timing,
                ));
                Ok(SubscribeOutcome::Created)
            }
            Subscribe::AlreadyActive(_) => Ok(SubscribeOutcome::AlreadyActive),
        }
    }

    /// Subscribe from "symbol@exchange" leg specs, using the engine default
    /// threshold when none is given
    pub async fn subscribe_monitor_spec(
        &self,
        asset1: &str,
        asset2: &str,
        threshold_pct: Option<f64>,
        market_type: &str,
        sink_target: SinkTarget,
    ) -> Result<SubscribeOutcome> {
        let (symbol1, exchange1) = parse_asset_spec(asset1)?;
        let (symbol2, exchange2) = parse_asset_spec(asset2)?;

        self.subscribe_monitor(MonitorParams {
            symbol1,
            exchange1,
            symbol2,
            exchange2,
            market_type: market_type.to_string(),
            threshold_pct: threshold_pct.unwrap_or(self.config.default_threshold_pct),
            sink_target,
        })
        .await
    }

    /// Subscribe a consolidated market view and spawn its loop
    pub async fn subscribe_view(&self, params: ViewParams) -> Result<SubscribeOutcome> {
        self.validate_view(&params)?;

        match self.registry.subscribe_view(params).await {
            Subscribe::Created(sub) => {
                info!(view = %sub.params.label(), "Spawning view loop");
                tokio::spawn(view_loop(
                    Arc::clone(&self.provider),
                    Arc::clone(&self.sink),
                    sub,
                    self.timing,
                ));
                Ok(SubscribeOutcome::Created)
            }
            Subscribe::AlreadyActive(_) => Ok(SubscribeOutcome::AlreadyActive),
        }
    }

    /// Request a monitor stop; the loop exits at its next iteration boundary
    pub async fn stop_monitor(&self, key: &MonitorKey) -> StopOutcome {
        self.registry.stop_monitor(key).await
    }

    /// Request a view stop
    pub async fn stop_view(&self, key: &ViewKey) -> StopOutcome {
        self.registry.stop_view(key).await
    }

    /// Stop every subscription owned by a sink target; returns the count
    pub async fn stop_all_for_sink(&self, target: SinkTarget) -> usize {
        self.registry.stop_all_for_sink(target).await
    }

    /// Restart a previously stopped monitor under the same identity
    pub async fn restart_monitor(&self, key: &MonitorKey) -> Result<SubscribeOutcome> {
        match self.registry.lookup_monitor(key).await {
            Some(sub) => self.subscribe_monitor(sub.params.clone()).await,
            None => Err(AppError::Validation(format!(
                "no monitor registered for {}@{} vs {}@{}",
                key.symbol1, key.exchange1, key.symbol2, key.exchange2
            ))),
        }
    }

    /// History statistics for every tracked pair containing the symbol
    pub async fn pair_stats(&self, symbol: &str) -> Vec<PairStats> {
        self.history.stats_for_symbol(symbol).await
    }

    /// Symbols listed by the provider for one exchange and market type
    pub async fn list_symbols(&self, exchange: &str, market_type: &str) -> Result<Vec<String>> {
        self.validate_exchange(exchange)?;
        self.validate_market_type(market_type)?;
        Ok(self.provider.list_symbols(exchange, market_type).await?)
    }

    /// Start the monitors and views named in the configuration file
    pub async fn start_configured(
        &self,
        monitors: &[MonitorEntry],
        views: &[ViewEntry],
        sink_target: SinkTarget,
    ) -> Result<()> {
        for entry in monitors {
            self.subscribe_monitor_spec(
                &entry.asset1,
                &entry.asset2,
                entry.threshold_pct,
                "spot",
                sink_target,
            )
            .await?;
        }

        for entry in views {
            self.subscribe_view(ViewParams {
                symbol: entry.symbol.clone(),
                exchanges: entry.exchanges.clone(),
                market_type: "spot".to_string(),
                sink_target,
            })
            .await?;
        }

        Ok(())
    }

    fn validate_monitor(&self, params: &MonitorParams) -> Result<()> {
        if !params.threshold_pct.is_finite()
            || params.threshold_pct <= 0.0
            || params.threshold_pct >= 100.0
        {
            return Err(AppError::Validation(format!(
                "threshold must be > 0 and < 100 percent (got {})",
                params.threshold_pct
            )));
        }
        self.validate_exchange(&params.exchange1)?;
        self.validate_exchange(&params.exchange2)?;
        self.validate_market_type(&params.market_type)?;
        Ok(())
    }

    fn validate_view(&self, params: &ViewParams) -> Result<()> {
        if params.exchanges.is_empty() {
            return Err(AppError::Validation(
                "a view needs at least one exchange".to_string(),
            ));
        }
        for exchange in &params.exchanges {
            self.validate_exchange(exchange)?;
        }
        self.validate_market_type(&params.market_type)?;
        Ok(())
    }

    fn validate_exchange(&self, exchange: &str) -> Result<()> {
        if !self.config.supported_exchanges.iter().any(|e| e == exchange) {
            return Err(AppError::Validation(format!(
                "unsupported exchange '{}' (supported: {})",
                exchange,
                self.config.supported_exchanges.join(", ")
            )));
        }
        Ok(())
    }

    fn validate_market_type(&self, market_type: &str) -> Result<()> {
        if !self
            .config
            .supported_market_types
            .iter()
            .any(|m| m == market_type)
        {
            return Err(AppError::Validation(format!(
                "unsupported market type '{}' (supported: {})",
                market_type,
                self.config.supported_market_types.join(", ")
            )));
        }
        Ok(())
    }
}

/// Split "symbol@exchange" into its parts
pub fn parse_asset_spec(spec: &str) -> Result<(String, String)> {
    match spec.split_once('@') {
        Some((symbol, exchange)) if !symbol.is_empty() && !exchange.is_empty() => {
            Ok((symbol.to_string(), exchange.to_string()))
        }
        _ => Err(AppError::Validation(format!(
            "asset '{}' must be symbol@exchange, e.g. btc-usdt@binance",
            spec
        ))),
    }
}

//! GoMarket arbitrage monitoring bot entrypoint
//!
//! # Environment Variables
//! - `CONFIG_PATH`: YAML configuration file (default: `config.yaml`)
//! - `QUOTE_SOURCE`: `gomarket` (default) or `mock` for synthetic quotes
//! - `GOMARKET_BASE`: override for the price API base URL
//! - `LOG_FORMAT`: `json` (default) or `pretty`
//! - `RUST_LOG`: log level filter (default: `info`)

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use gomarket_bot::config::{load_config, logging, AppConfig};
use gomarket_bot::core::Engine;
use gomarket_bot::provider::{GoMarketClient, MockQuoteProvider, QuoteProvider};
use gomarket_bot::sink::{LogSink, NotificationSink, SinkTarget};

/// Sink target for subscriptions started from the configuration file
const CONFIG_TARGET: SinkTarget = SinkTarget(0);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    logging::init_logging();

    let config_path =
        std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.yaml".to_string());
    let config = if Path::new(&config_path).exists() {
        load_config(Path::new(&config_path))
            .with_context(|| format!("loading configuration from {}", config_path))?
    } else {
        warn!(path = %config_path, "Configuration file not found, using defaults");
        AppConfig::default()
    };

    let provider: Arc<dyn QuoteProvider> = match std::env::var("QUOTE_SOURCE").as_deref() {
        Ok("mock") => {
            info!("Using synthetic quote provider");
            Arc::new(MockQuoteProvider::new())
        }
        _ => {
            info!(base = %config.engine.gomarket_base, "Using GoMarket quote provider");
            Arc::new(
                GoMarketClient::new(config.engine.gomarket_base.clone())
                    .context("building GoMarket client")?,
            )
        }
    };

    let sink: Arc<dyn NotificationSink> = Arc::new(LogSink::new());
    let engine = Engine::new(config.engine.clone(), provider, sink);

    engine
        .start_configured(&config.monitors, &config.views, CONFIG_TARGET)
        .await
        .context("starting configured subscriptions")?;
    info!(
        monitors = config.monitors.len(),
        views = config.views.len(),
        "Engine started"
    );

    tokio::signal::ctrl_c()
        .await
        .context("waiting for shutdown signal")?;
    info!("Shutdown signal received");

    let stopped = engine.stop_all_for_sink(CONFIG_TARGET).await;
    info!(stopped, "Stopped subscriptions, exiting");

    Ok(())
}

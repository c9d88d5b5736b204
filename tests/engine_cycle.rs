//! End-to-end engine cycle tests
//!
//! Drives the engine facade with a scripted quote provider and a capturing
//! sink: subscribe, observe status/alert renders, stop, observe the
//! stopped notice.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::{sleep, timeout};

use gomarket_bot::config::EngineConfig;
use gomarket_bot::core::engine::SubscribeOutcome;
use gomarket_bot::core::{Engine, MonitorKey, PairKey, Quote, StopOutcome, ViewParams};
use gomarket_bot::provider::{FetchError, FetchResult, QuoteProvider};
use gomarket_bot::sink::{NotificationSink, RenderError, SinkAction, SinkTarget};

/// Provider answering from a fixed quote table; unknown routes fail
struct ScriptedProvider {
    quotes: HashMap<(String, String), Quote>,
    fetches: AtomicUsize,
}

impl ScriptedProvider {
    fn new(entries: &[(&str, &str, f64, f64)]) -> Self {
        let quotes = entries
            .iter()
            .map(|(exchange, symbol, bid, ask)| {
                (
                    (exchange.to_string(), symbol.to_string()),
                    Quote {
                        bid: *bid,
                        ask: *ask,
                        last: (*bid + *ask) / 2.0,
                        timestamp_ms: 1706000000000,
                    },
                )
            })
            .collect();
        Self {
            quotes,
            fetches: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl QuoteProvider for ScriptedProvider {
    async fn fetch_quote(&self, exchange: &str, _: &str, symbol: &str) -> FetchResult<Quote> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.quotes
            .get(&(exchange.to_string(), symbol.to_string()))
            .copied()
            .ok_or_else(|| FetchError::Network("no route".to_string()))
    }

    async fn list_symbols(&self, _: &str, _: &str) -> FetchResult<Vec<String>> {
        Ok(vec!["btc-usdt".to_string()])
    }
}

/// Sink capturing every render per target
#[derive(Default)]
struct CaptureSink {
    statuses: Mutex<Vec<(SinkTarget, String)>>,
    alerts: Mutex<Vec<(SinkTarget, String)>>,
}

impl CaptureSink {
    async fn statuses_matching(&self, needle: &str) -> usize {
        self.statuses
            .lock()
            .await
            .iter()
            .filter(|(_, text)| text.contains(needle))
            .count()
    }
}

#[async_trait]
impl NotificationSink for CaptureSink {
    async fn render_status(
        &self,
        target: SinkTarget,
        text: &str,
        _actions: &[SinkAction],
    ) -> Result<(), RenderError> {
        self.statuses.lock().await.push((target, text.to_string()));
        Ok(())
    }

    async fn render_alert(&self, target: SinkTarget, text: &str) -> Result<(), RenderError> {
        self.alerts.lock().await.push((target, text.to_string()));
        Ok(())
    }
}

fn fast_config() -> EngineConfig {
    let mut config = EngineConfig::default();
    config.update_interval_secs = 1;
    config.error_backoff_secs = 1;
    config.view_retry_secs = 1;
    config
}

fn setup(
    entries: &[(&str, &str, f64, f64)],
) -> (Engine, Arc<ScriptedProvider>, Arc<CaptureSink>) {
    let provider = Arc::new(ScriptedProvider::new(entries));
    let sink = Arc::new(CaptureSink::default());
    let engine = Engine::new(
        fast_config(),
        Arc::clone(&provider) as Arc<dyn QuoteProvider>,
        Arc::clone(&sink) as Arc<dyn NotificationSink>,
    );
    (engine, provider, sink)
}

fn monitor_key(threshold_bps: i64) -> MonitorKey {
    MonitorKey {
        symbol1: "btc-usdt".to_string(),
        exchange1: "binance".to_string(),
        symbol2: "btc-usdt".to_string(),
        exchange2: "okx".to_string(),
        threshold_bps,
    }
}

#[tokio::test]
async fn test_monitor_full_cycle_alerts_then_stops() {
    // 2.98% spread, well over the 1% threshold
    let (engine, _provider, sink) = setup(&[
        ("binance", "btc-usdt", 100.0, 101.0),
        ("okx", "btc-usdt", 103.0, 104.0),
    ]);

    let outcome = engine
        .subscribe_monitor_spec(
            "btc-usdt@binance",
            "btc-usdt@okx",
            Some(1.0),
            "spot",
            SinkTarget(42),
        )
        .await
        .unwrap();
    assert_eq!(outcome, SubscribeOutcome::Created);

    timeout(Duration::from_secs(5), async {
        loop {
            if !sink.alerts.lock().await.is_empty() {
                break;
            }
            sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("alert should arrive");

    {
        let alerts = sink.alerts.lock().await;
        let (target, text) = &alerts[0];
        assert_eq!(*target, SinkTarget(42));
        assert!(text.contains("ARBITRAGE OPPORTUNITY"));
        assert!(text.contains("Buy on: binance @ 100.50000000"));
        assert!(text.contains("Sell on: okx @ 103.50000000"));
        assert!(text.contains("Potential profit: 3.00000000 per unit"));
    }

    // History was recorded for the pair
    let stats = engine.pair_stats("btc-usdt").await;
    assert_eq!(stats.len(), 1);
    assert!(stats[0].opportunities >= 1);
    assert!((stats[0].max_spread_pct - 2.9851).abs() < 0.01);
    let pair = PairKey::new("btc-usdt", "btc-usdt");
    assert!(engine.history().len(&pair).await >= 1);

    let key = monitor_key(100);
    assert_eq!(engine.stop_monitor(&key).await, StopOutcome::Stopped);

    timeout(Duration::from_secs(5), async {
        loop {
            if sink.statuses_matching("has been stopped").await >= 1 {
                break;
            }
            sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("stopped notice should render");

    // Stopping again finds nothing active
    assert_eq!(engine.stop_monitor(&key).await, StopOutcome::NotFound);
}

#[tokio::test]
async fn test_duplicate_subscription_runs_one_loop() {
    let (engine, provider, _sink) = setup(&[
        ("binance", "btc-usdt", 100.0, 101.0),
        ("okx", "btc-usdt", 100.0, 101.0),
    ]);

    let first = engine
        .subscribe_monitor_spec("btc-usdt@binance", "btc-usdt@okx", None, "spot", SinkTarget(1))
        .await
        .unwrap();
    let second = engine
        .subscribe_monitor_spec("btc-usdt@binance", "btc-usdt@okx", None, "spot", SinkTarget(1))
        .await
        .unwrap();

    assert_eq!(first, SubscribeOutcome::Created);
    assert_eq!(second, SubscribeOutcome::AlreadyActive);
    assert_eq!(engine.registry().active_monitors().await, 1);

    // One loop, first iteration only: two leg fetches, not four
    sleep(Duration::from_millis(200)).await;
    assert_eq!(provider.fetches.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_view_snapshot_with_partial_failure() {
    // bybit is not scripted and will fail; the view carries on without it
    let (engine, _provider, sink) = setup(&[
        ("binance", "btc-usdt", 100.0, 101.0),
        ("okx", "btc-usdt", 100.2, 100.9),
    ]);

    engine
        .subscribe_view(ViewParams {
            symbol: "btc-usdt".to_string(),
            exchanges: vec![
                "binance".to_string(),
                "okx".to_string(),
                "bybit".to_string(),
            ],
            market_type: "spot".to_string(),
            sink_target: SinkTarget(7),
        })
        .await
        .unwrap();

    timeout(Duration::from_secs(5), async {
        loop {
            if sink.statuses_matching("Consolidated market view").await >= 1 {
                break;
            }
            sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("snapshot should render");

    let statuses = sink.statuses.lock().await;
    let (target, snapshot) = statuses
        .iter()
        .find(|(_, text)| text.contains("Consolidated market view"))
        .unwrap();
    assert_eq!(*target, SinkTarget(7));
    assert!(snapshot.contains("Best bid: 100.20000000 (okx)"));
    assert!(snapshot.contains("Best ask: 100.90000000 (okx)"));
    assert!(snapshot.contains("bybit: Data unavailable"));
}

#[tokio::test]
async fn test_stop_all_for_sink_stops_both_loop_kinds() {
    let (engine, _provider, sink) = setup(&[
        ("binance", "btc-usdt", 100.0, 101.0),
        ("okx", "btc-usdt", 100.0, 101.0),
    ]);

    engine
        .subscribe_monitor_spec("btc-usdt@binance", "btc-usdt@okx", None, "spot", SinkTarget(9))
        .await
        .unwrap();
    engine
        .subscribe_view(ViewParams {
            symbol: "btc-usdt".to_string(),
            exchanges: vec!["binance".to_string(), "okx".to_string()],
            market_type: "spot".to_string(),
            sink_target: SinkTarget(9),
        })
        .await
        .unwrap();

    assert_eq!(engine.stop_all_for_sink(SinkTarget(9)).await, 2);

    timeout(Duration::from_secs(5), async {
        loop {
            if sink.statuses_matching("has been stopped").await >= 2 {
                break;
            }
            sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("both loops should report stopped");

    assert_eq!(engine.registry().active_monitors().await, 0);
    assert_eq!(engine.registry().active_views().await, 0);
}

#[tokio::test]
async fn test_restart_monitor_spawns_fresh_loop() {
    let (engine, _provider, sink) = setup(&[
        ("binance", "btc-usdt", 100.0, 101.0),
        ("okx", "btc-usdt", 100.0, 101.0),
    ]);

    engine
        .subscribe_monitor_spec("btc-usdt@binance", "btc-usdt@okx", None, "spot", SinkTarget(3))
        .await
        .unwrap();
    let key = monitor_key(50); // default 0.5% threshold

    engine.stop_monitor(&key).await;
    timeout(Duration::from_secs(5), async {
        loop {
            if sink.statuses_matching("has been stopped").await >= 1 {
                break;
            }
            sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("stopped notice should render");

    let outcome = engine.restart_monitor(&key).await.unwrap();
    assert_eq!(outcome, SubscribeOutcome::Created);

    let before = sink.statuses_matching("Status: Active").await;
    timeout(Duration::from_secs(5), async {
        loop {
            if sink.statuses_matching("Status: Active").await > before {
                break;
            }
            sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("restarted loop should render a fresh status");
}

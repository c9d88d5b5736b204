//! Arbitrage monitor loop
//!
//! One long-running task per monitor subscription. Each iteration fetches
//! both legs, computes the spread, records a history sample, pushes a
//! status update and (on opportunity) an alert, then sleeps. Fetch
//! failures back off with a throttled error notice and never terminate
//! the subscription; only the cooperative `active` flag does, observed at
//! iteration boundaries.

use std::sync::Arc;

use chrono::Utc;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::LoopTiming;
use crate::core::history::{HistoryStore, PairKey, SpreadSample};
use crate::core::quote::{current_time_ms, Quote};
use crate::core::registry::MonitorSubscription;
use crate::core::spread::{compute_spread, SpreadResult};
use crate::provider::{FetchError, QuoteProvider};
use crate::sink::{NotificationSink, SinkAction};

/// Run one monitor subscription until its `active` flag is cleared
///
/// The first iteration runs without delay. A restart after stop spawns a
/// new call of this function over the same subscription object.
pub async fn monitor_loop(
    provider: Arc<dyn QuoteProvider>,
    sink: Arc<dyn NotificationSink>,
    history: Arc<HistoryStore>,
    sub: Arc<MonitorSubscription>,
    timing: LoopTiming,
) {
    let label = sub.params.label();
    info!(monitor = %label, threshold = sub.params.threshold_pct, "Arbitrage monitor started");

    let pair_key = PairKey::new(&sub.params.symbol1, &sub.params.symbol2);
    let target = sub.params.sink_target;

    loop {
        if !sub.is_active() {
            break;
        }

        match fetch_legs(provider.as_ref(), &sub).await {
            Ok((quote1, quote2)) => {
                let result = compute_spread(&quote1, &quote2, sub.params.threshold_pct);

                let (max_spread, alerts_sent) = {
                    let mut stats = sub.stats.write().await;
                    stats.max_spread_pct = stats.max_spread_pct.max(result.spread_pct);
                    stats.last_updated_ms = current_time_ms();
                    (stats.max_spread_pct, stats.alerts_sent)
                };

                history
                    .append(
                        pair_key.clone(),
                        SpreadSample {
                            timestamp_ms: current_time_ms(),
                            exchange_a: sub.params.exchange1.clone(),
                            price_a: result.mid_a,
                            exchange_b: sub.params.exchange2.clone(),
                            price_b: result.mid_b,
                            spread_pct: result.spread_pct,
                            is_opportunity: result.is_opportunity,
                        },
                    )
                    .await;

                let status = format_status(&sub, &result, max_spread, alerts_sent);
                if let Err(e) = sink
                    .render_status(target, &status, &[SinkAction::StopMonitor])
                    .await
                {
                    // Unchanged or transport trouble is non-fatal
                    debug!(monitor = %label, error = %e, "Status render skipped");
                }

                if result.is_opportunity {
                    {
                        let mut stats = sub.stats.write().await;
                        stats.alerts_sent += 1;
                    }
                    info!(
                        monitor = %label,
                        spread = %format!("{:.4}%", result.spread_pct),
                        "Arbitrage opportunity detected"
                    );
                    let alert = format_alert(&sub, &result);
                    if let Err(e) = sink.render_alert(target, &alert).await {
                        warn!(monitor = %label, error = %e, "Alert render failed");
                    }
                }

                sleep(timing.update_interval).await;
            }
            Err(e) => {
                log_fetch_failure(&label, &e);

                let now = current_time_ms();
                let should_notify = {
                    let mut stats = sub.stats.write().await;
                    let elapsed = now.saturating_sub(stats.last_error_notified_ms);
                    if elapsed >= timing.error_notify_throttle.as_millis() as u64 {
                        stats.last_error_notified_ms = now;
                        true
                    } else {
                        false
                    }
                };

                if should_notify {
                    let notice = format!(
                        "Error in arbitrage monitor ({}): {}\nMonitoring will continue.",
                        label, e
                    );
                    if let Err(e) = sink.render_alert(target, &notice).await {
                        debug!(monitor = %label, error = %e, "Error notice render failed");
                    }
                }

                sleep(timing.error_backoff).await;
            }
        }
    }

    let stopped = format!(
        "Arbitrage monitoring for {} and {} has been stopped.",
        format_leg(&sub.params.symbol1, &sub.params.exchange1),
        format_leg(&sub.params.symbol2, &sub.params.exchange2),
    );
    if let Err(e) = sink
        .render_status(target, &stopped, &[SinkAction::RestartMonitor])
        .await
    {
        debug!(monitor = %label, error = %e, "Stopped render skipped");
    }

    info!(monitor = %label, "Arbitrage monitor stopped");
}

/// Fetch both legs; either failure fails the iteration
async fn fetch_legs(
    provider: &dyn QuoteProvider,
    sub: &MonitorSubscription,
) -> Result<(Quote, Quote), FetchError> {
    let p = &sub.params;
    tokio::try_join!(
        provider.fetch_quote(&p.exchange1, &p.market_type, &p.symbol1),
        provider.fetch_quote(&p.exchange2, &p.market_type, &p.symbol2),
    )
}

/// The engine treats all fetch failures alike, but the log keeps the taxonomy
fn log_fetch_failure(label: &str, error: &FetchError) {
    match error {
        FetchError::Network(msg) => {
            warn!(monitor = %label, kind = "network", error = %msg, "Quote fetch failed")
        }
        FetchError::Upstream { status, body } => {
            warn!(monitor = %label, kind = "upstream", status, body = %body, "Quote fetch failed")
        }
        FetchError::Malformed(msg) => {
            warn!(monitor = %label, kind = "malformed", error = %msg, "Quote fetch failed")
        }
    }
}

fn format_leg(symbol: &str, exchange: &str) -> String {
    format!("{}@{}", symbol, exchange)
}

fn format_status(
    sub: &MonitorSubscription,
    result: &SpreadResult,
    max_spread: f64,
    alerts_sent: u64,
) -> String {
    let p = &sub.params;
    format!(
        "Monitoring arbitrage between {} and {}\n\
         Threshold: {}%\n\
         Status: Active\n\
         Last check: {}\n\
         Price {}: {:.8}\n\
         Price {}: {:.8}\n\
         Current spread: {:.2}%\n\
         Max spread: {:.2}%\n\
         Alerts sent: {}",
        format_leg(&p.symbol1, &p.exchange1),
        format_leg(&p.symbol2, &p.exchange2),
        p.threshold_pct,
        Utc::now().format("%Y-%m-%d %H:%M:%S"),
        format_leg(&p.symbol1, &p.exchange1),
        result.mid_a,
        format_leg(&p.symbol2, &p.exchange2),
        result.mid_b,
        result.spread_pct,
        max_spread,
        alerts_sent,
    )
}

fn format_alert(sub: &MonitorSubscription, result: &SpreadResult) -> String {
    let p = &sub.params;
    let (cheap_exchange, expensive_exchange) = if result.cheaper_is_a() {
        (&p.exchange1, &p.exchange2)
    } else {
        (&p.exchange2, &p.exchange1)
    };

    format!(
        "🚨 ARBITRAGE OPPORTUNITY 🚨\n\n\
         Symbol: {}\n\
         Buy on: {} @ {:.8}\n\
         Sell on: {} @ {:.8}\n\
         Spread: {:.2}% (Threshold: {}%)\n\
         Potential profit: {:.8} per unit\n\
         Time: {}",
        p.symbol1,
        cheap_exchange,
        result.cheap_price(),
        expensive_exchange,
        result.expensive_price(),
        result.spread_pct,
        p.threshold_pct,
        result.profit_per_unit(),
        Utc::now().format("%Y-%m-%d %H:%M:%S"),
    )
}

//! Consolidated market view loop
//!
//! Polls one symbol across a set of exchanges, computes the CBBO over the
//! two-sided quotes, and renders a snapshot per round. Exchanges that fail
//! to answer are shown as unavailable rather than failing the round; only
//! a round with no usable quote at all is skipped.

use std::sync::Arc;

use chrono::Utc;
use futures_util::future::join_all;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::LoopTiming;
use crate::core::cbbo::{compute_cbbo, Cbbo};
use crate::core::quote::Quote;
use crate::core::registry::ViewSubscription;
use crate::provider::QuoteProvider;
use crate::sink::{NotificationSink, SinkAction};

/// Run one view subscription until its `active` flag is cleared
pub async fn view_loop(
    provider: Arc<dyn QuoteProvider>,
    sink: Arc<dyn NotificationSink>,
    sub: Arc<ViewSubscription>,
    timing: LoopTiming,
) {
    let label = sub.params.label();
    info!(view = %label, "Market view started");

    let target = sub.params.sink_target;

    loop {
        if !sub.is_active() {
            break;
        }

        let rows = fetch_round(provider.as_ref(), &sub).await;

        if rows.iter().all(|(_, quote)| quote.is_none()) {
            warn!(view = %label, "All exchanges failed this round");
            sleep(timing.error_backoff).await;
            continue;
        }

        let quoted: Vec<(String, Quote)> = rows
            .iter()
            .filter_map(|(exchange, quote)| quote.map(|q| (exchange.clone(), q)))
            .collect();

        match compute_cbbo(&quoted) {
            Some(cbbo) => {
                let text = format_snapshot(&sub.params.symbol, &cbbo, &rows);
                if let Err(e) = sink
                    .render_status(target, &text, &[SinkAction::StopView])
                    .await
                {
                    debug!(view = %label, error = %e, "Snapshot render skipped");
                }
                sleep(timing.update_interval).await;
            }
            None => {
                // Quotes came back but none was two-sided; retry sooner
                debug!(view = %label, "No two-sided quote this round");
                sleep(timing.view_retry).await;
            }
        }
    }

    let stopped = format!(
        "Market view for {} has been stopped.",
        sub.params.symbol
    );
    if let Err(e) = sink.render_status(target, &stopped, &[]).await {
        debug!(view = %label, error = %e, "Stopped render skipped");
    }

    info!(view = %label, "Market view stopped");
}

/// Fetch the symbol on every exchange concurrently; failures become `None`
async fn fetch_round(
    provider: &dyn QuoteProvider,
    sub: &ViewSubscription,
) -> Vec<(String, Option<Quote>)> {
    let p = &sub.params;
    let fetches = p
        .exchanges
        .iter()
        .map(|exchange| provider.fetch_quote(exchange, &p.market_type, &p.symbol));
    let results = join_all(fetches).await;

    p.exchanges
        .iter()
        .zip(results)
        .map(|(exchange, result)| match result {
            Ok(quote) => (exchange.clone(), Some(quote)),
            Err(e) => {
                warn!(view = %p.label(), exchange = %exchange, error = %e, "Exchange fetch failed");
                (exchange.clone(), None)
            }
        })
        .collect()
}

fn format_snapshot(symbol: &str, cbbo: &Cbbo, rows: &[(String, Option<Quote>)]) -> String {
    let mut text = format!(
        "Consolidated market view: {}\n\
         Time: {}\n\n\
         Best bid: {:.8} ({})\n\
         Best ask: {:.8} ({})\n",
        symbol,
        Utc::now().format("%Y-%m-%d %H:%M:%S"),
        cbbo.best_bid,
        cbbo.best_bid_exchange,
        cbbo.best_ask,
        cbbo.best_ask_exchange,
    );

    text.push_str(&format!("CBBO mid: {:.8}\n", cbbo.mid()));
    match cbbo.spread_pct() {
        Some(spread) => text.push_str(&format!("CBBO spread: {:.4}%\n", spread)),
        None => text.push_str("CBBO spread: n/a\n"),
    }

    text.push_str("\nPer exchange:\n");
    for (exchange, quote) in rows {
        match quote {
            Some(q) => {
                let mid = q.mid_price();
                let mut line = format!(
                    "{}: bid {:.8} / ask {:.8} / mid {:.8}",
                    exchange, q.bid, q.ask, mid
                );
                if q.is_two_sided() && mid > 0.0 {
                    line.push_str(&format!(" / spread {:.4}%", (q.ask - q.bid) / mid * 100.0));
                }
                let mut tags = Vec::new();
                if *exchange == cbbo.best_bid_exchange {
                    tags.push("best bid");
                }
                if *exchange == cbbo.best_ask_exchange {
                    tags.push("best ask");
                }
                if !tags.is_empty() {
                    line.push_str(&format!(" ({})", tags.join(", ")));
                }
                line.push('\n');
                text.push_str(&line);
            }
            None => text.push_str(&format!("{}: Data unavailable\n", exchange)),
        }
    }

    text
}

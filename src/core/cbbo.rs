//! Consolidated best bid/offer across a set of exchanges
//!
//! Only two-sided quotes (bid > 0 and ask > 0) are eligible. With an empty
//! eligible set there is no consolidated price: the calculator returns
//! `None` rather than zeros or NaN, and the caller must render "no active
//! consolidated price".

use crate::core::quote::Quote;

/// Consolidated best bid and offer for one symbol
#[derive(Debug, Clone, PartialEq)]
pub struct Cbbo {
    /// Highest bid among eligible quotes
    pub best_bid: f64,
    /// Exchange holding the best bid
    pub best_bid_exchange: String,
    /// Lowest ask among eligible quotes
    pub best_ask: f64,
    /// Exchange holding the best ask
    pub best_ask_exchange: String,
}

impl Cbbo {
    /// Consolidated mid price
    pub fn mid(&self) -> f64 {
        (self.best_bid + self.best_ask) / 2.0
    }

    /// Consolidated spread percentage, undefined when the mid is non-positive
    pub fn spread_pct(&self) -> Option<f64> {
        let mid = self.mid();
        if mid > 0.0 {
            Some((self.best_ask - self.best_bid) / mid * 100.0)
        } else {
            None
        }
    }
}

/// Compute the CBBO over `(exchange, quote)` pairs in caller-supplied order
///
/// Ties break to the first exchange encountered, so the result is
/// deterministic and stable for a fixed input order.
pub fn compute_cbbo(quotes: &[(String, Quote)]) -> Option<Cbbo> {
    let mut best_bid: Option<(f64, &str)> = None;
    let mut best_ask: Option<(f64, &str)> = None;

    for (exchange, quote) in quotes {
        if !quote.is_two_sided() {
            continue;
        }
        // Strict comparisons keep the first exchange on ties
        match best_bid {
            Some((bid, _)) if quote.bid <= bid => {}
            _ => best_bid = Some((quote.bid, exchange)),
        }
        match best_ask {
            Some((ask, _)) if quote.ask >= ask => {}
            _ => best_ask = Some((quote.ask, exchange)),
        }
    }

    let (best_bid, best_bid_exchange) = best_bid?;
    let (best_ask, best_ask_exchange) = best_ask?;

    Some(Cbbo {
        best_bid,
        best_bid_exchange: best_bid_exchange.to_string(),
        best_ask,
        best_ask_exchange: best_ask_exchange.to_string(),
    })
}

//! Quote snapshot type shared by the calculators and loops

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Top-of-book snapshot for one symbol on one exchange
///
/// A quote with `bid <= 0` or `ask <= 0` is "one-sided": the exchange did
/// not report a full book, and `last` is used for mid-price derivation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub bid: f64,
    pub ask: f64,
    pub last: f64,
    pub timestamp_ms: u64,
}

impl Quote {
    /// Mid price: (bid+ask)/2 when both sides are present, else `last`
    pub fn mid_price(&self) -> f64 {
        if self.is_two_sided() {
            (self.bid + self.ask) / 2.0
        } else {
            self.last
        }
    }

    /// Whether both bid and ask are positive (eligible for CBBO)
    pub fn is_two_sided(&self) -> bool {
        self.bid > 0.0 && self.ask > 0.0
    }
}

/// Current Unix time in milliseconds
pub fn current_time_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

//! Spread calculation between two exchange quotes
//!
//! Pure, infallible numeric function: every input produces a result, and
//! degenerate prices (non-positive mids) clamp the spread to zero instead
//! of dividing by a non-positive number.

use crate::core::quote::Quote;

/// Result of a spread calculation between two legs
///
/// Leg A is (symbol1, exchange1), leg B is (symbol2, exchange2). The
/// spread is symmetric: swapping the legs yields the same `spread_pct`
/// and `is_opportunity`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpreadResult {
    /// Mid price of leg A
    pub mid_a: f64,
    /// Mid price of leg B
    pub mid_b: f64,
    /// |mid_a - mid_b| / min(mid_a, mid_b) * 100, or 0.0 when either mid <= 0
    pub spread_pct: f64,
    /// spread_pct >= threshold
    pub is_opportunity: bool,
}

impl SpreadResult {
    /// Whether leg A holds the cheaper mid price
    pub fn cheaper_is_a(&self) -> bool {
        self.mid_a <= self.mid_b
    }

    /// Cheaper of the two mids
    pub fn cheap_price(&self) -> f64 {
        self.mid_a.min(self.mid_b)
    }

    /// More expensive of the two mids
    pub fn expensive_price(&self) -> f64 {
        self.mid_a.max(self.mid_b)
    }

    /// Per-unit profit estimate: buy at the cheap mid, sell at the expensive one
    pub fn profit_per_unit(&self) -> f64 {
        self.expensive_price() - self.cheap_price()
    }
}

/// Compute the spread between two quotes against an alert threshold
///
/// Mid prices follow `Quote::mid_price` (one-sided quotes use `last`).
/// When either mid is non-positive the spread is 0.0 and no opportunity
/// is flagged.
pub fn compute_spread(quote_a: &Quote, quote_b: &Quote, threshold_pct: f64) -> SpreadResult {
    let mid_a = quote_a.mid_price();
    let mid_b = quote_b.mid_price();

    // Spread is only defined when both mids are positive
    let defined = mid_a > 0.0 && mid_b > 0.0;
    let spread_pct = if defined {
        (mid_a - mid_b).abs() / mid_a.min(mid_b) * 100.0
    } else {
        0.0
    };
    let is_opportunity = defined && spread_pct >= threshold_pct;

    SpreadResult {
        mid_a,
        mid_b,
        spread_pct,
        is_opportunity,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quote(bid: f64, ask: f64, last: f64) -> Quote {
        Quote {
            bid,
            ask,
            last,
            timestamp_ms: 1706000000000,
        }
    }

    #[test]
    fn test_reference_scenario() {
        // {bid=100, ask=101} vs {bid=103, ask=104}, threshold 1.0
        let a = quote(100.0, 101.0, 100.5);
        let b = quote(103.0, 104.0, 103.5);

        let result = compute_spread(&a, &b, 1.0);
        assert_eq!(result.mid_a, 100.5);
        assert_eq!(result.mid_b, 103.5);
        assert!((result.spread_pct - 2.9851).abs() < 0.001);
        assert!(result.is_opportunity);
        assert!(result.cheaper_is_a());
        assert!((result.profit_per_unit() - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_symmetric_in_leg_order() {
        let a = quote(100.0, 101.0, 100.5);
        let b = quote(103.0, 104.0, 103.5);

        let ab = compute_spread(&a, &b, 1.0);
        let ba = compute_spread(&b, &a, 1.0);
        assert_eq!(ab.spread_pct, ba.spread_pct);
        assert_eq!(ab.is_opportunity, ba.is_opportunity);
        assert_eq!(ab.profit_per_unit(), ba.profit_per_unit());
    }

    #[test]
    fn test_one_sided_quote_uses_last() {
        let a = quote(0.0, 101.0, 100.0);
        let b = quote(103.0, 104.0, 103.5);

        let result = compute_spread(&a, &b, 1.0);
        assert_eq!(result.mid_a, 100.0);
        assert!((result.spread_pct - 3.5).abs() < 1e-9);
        assert!(result.is_opportunity);
    }

    #[test]
    fn test_non_positive_mids_clamp_to_zero() {
        // Both one-sided with last = 0: no usable mid, spread clamps to 0
        let a = quote(0.0, 0.0, 0.0);
        let b = quote(103.0, 104.0, 103.5);

        let result = compute_spread(&a, &b, 0.5);
        assert_eq!(result.spread_pct, 0.0);
        assert!(!result.is_opportunity);

        let result = compute_spread(&a, &a, 0.5);
        assert_eq!(result.spread_pct, 0.0);
        assert!(!result.is_opportunity);
    }

    #[test]
    fn test_opportunity_iff_spread_at_or_above_threshold() {
        let a = quote(100.0, 100.0, 0.0);
        let b = quote(101.0, 101.0, 0.0);
        // spread = 1/100 * 100 = 1.0%

        assert!(compute_spread(&a, &b, 1.0).is_opportunity);
        assert!(compute_spread(&a, &b, 0.5).is_opportunity);
        assert!(!compute_spread(&a, &b, 1.01).is_opportunity);
    }

    #[test]
    fn test_zero_threshold_flags_equal_prices() {
        let a = quote(100.0, 101.0, 0.0);
        let result = compute_spread(&a, &a, 0.0);
        assert_eq!(result.spread_pct, 0.0);
        assert!(result.is_opportunity, "spread 0 >= threshold 0");
    }

    #[test]
    fn test_identical_prices_below_positive_threshold() {
        let a = quote(100.0, 101.0, 0.0);
        let result = compute_spread(&a, &a, 0.5);
        assert_eq!(result.spread_pct, 0.0);
        assert!(!result.is_opportunity);
    }
}

//! Bounded spread history, keyed by unordered symbol pair
//!
//! Append-only ring buffers shared between the monitor loops (writers) and
//! the command surface's stats reads. One store instance is constructed at
//! startup and threaded through the engine.

use std::collections::{HashMap, VecDeque};

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// Identity of an unordered symbol pair
///
/// The two symbols are sorted on construction so `{a,b}` and `{b,a}`
/// collide to the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PairKey(String, String);

impl PairKey {
    pub fn new(symbol1: &str, symbol2: &str) -> Self {
        if symbol1 <= symbol2 {
            Self(symbol1.to_string(), symbol2.to_string())
        } else {
            Self(symbol2.to_string(), symbol1.to_string())
        }
    }

    pub fn first(&self) -> &str {
        &self.0
    }

    pub fn second(&self) -> &str {
        &self.1
    }

    /// Whether either side of the pair matches the given symbol
    pub fn contains(&self, symbol: &str) -> bool {
        self.0 == symbol || self.1 == symbol
    }
}

impl std::fmt::Display for PairKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} vs {}", self.0, self.1)
    }
}

/// One computed spread observation, immutable once appended
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpreadSample {
    pub timestamp_ms: u64,
    pub exchange_a: String,
    pub price_a: f64,
    pub exchange_b: String,
    pub price_b: f64,
    pub spread_pct: f64,
    pub is_opportunity: bool,
}

/// Aggregated statistics for one pair's history
#[derive(Debug, Clone, PartialEq)]
pub struct PairStats {
    pub pair: PairKey,
    pub samples: usize,
    pub opportunities: usize,
    pub max_spread_pct: f64,
    pub avg_spread_pct: f64,
    pub last: Option<SpreadSample>,
}

/// Capacity-bounded spread sample log
///
/// Pair histories are created lazily on first append and live for the
/// process lifetime. When a history is full the oldest sample is evicted
/// (FIFO).
#[derive(Debug)]
pub struct HistoryStore {
    capacity: usize,
    pairs: RwLock<HashMap<PairKey, VecDeque<SpreadSample>>>,
}

impl HistoryStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            pairs: RwLock::new(HashMap::new()),
        }
    }

    /// Append a sample to the pair's history, evicting the oldest when full
    pub async fn append(&self, key: PairKey, sample: SpreadSample) {
        let mut pairs = self.pairs.write().await;
        let history = pairs.entry(key).or_default();
        if history.len() == self.capacity {
            history.pop_front();
        }
        history.push_back(sample);
    }

    /// Snapshot of one pair's samples, oldest first
    pub async fn samples(&self, key: &PairKey) -> Vec<SpreadSample> {
        let pairs = self.pairs.read().await;
        pairs
            .get(key)
            .map(|h| h.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of samples currently held for a pair
    pub async fn len(&self, key: &PairKey) -> usize {
        let pairs = self.pairs.read().await;
        pairs.get(key).map(VecDeque::len).unwrap_or(0)
    }

    /// Statistics for every tracked pair containing the given symbol
    pub async fn stats_for_symbol(&self, symbol: &str) -> Vec<PairStats> {
        let pairs = self.pairs.read().await;
        let mut stats: Vec<PairStats> = pairs
            .iter()
            .filter(|(key, history)| key.contains(symbol) && !history.is_empty())
            .map(|(key, history)| {
                let max = history
                    .iter()
                    .map(|s| s.spread_pct)
                    .fold(0.0_f64, f64::max);
                let sum: f64 = history.iter().map(|s| s.spread_pct).sum();
                let opportunities = history.iter().filter(|s| s.is_opportunity).count();
                PairStats {
                    pair: key.clone(),
                    samples: history.len(),
                    opportunities,
                    max_spread_pct: max,
                    avg_spread_pct: sum / history.len() as f64,
                    last: history.back().cloned(),
                }
            })
            .collect();
        // Deterministic order for rendering
        stats.sort_by(|a, b| (a.pair.first(), a.pair.second()).cmp(&(b.pair.first(), b.pair.second())));
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(ts: u64, spread_pct: f64, is_opportunity: bool) -> SpreadSample {
        SpreadSample {
            timestamp_ms: ts,
            exchange_a: "binance".to_string(),
            price_a: 100.0,
            exchange_b: "okx".to_string(),
            price_b: 101.0,
            spread_pct,
            is_opportunity,
        }
    }

    #[test]
    fn test_pair_key_is_order_independent() {
        assert_eq!(
            PairKey::new("btc-usdt", "eth-usdt"),
            PairKey::new("eth-usdt", "btc-usdt")
        );
        assert_eq!(PairKey::new("eth-usdt", "btc-usdt").first(), "btc-usdt");
    }

    #[tokio::test]
    async fn test_fifo_eviction_preserves_order() {
        let store = HistoryStore::new(3);
        let key = PairKey::new("btc-usdt", "btc-usdt");

        for ts in 0..4u64 {
            store.append(key.clone(), sample(ts, ts as f64, false)).await;
        }

        let samples = store.samples(&key).await;
        assert_eq!(samples.len(), 3, "store never exceeds capacity");
        let timestamps: Vec<u64> = samples.iter().map(|s| s.timestamp_ms).collect();
        assert_eq!(timestamps, vec![1, 2, 3], "oldest evicted, order kept");
    }

    #[tokio::test]
    async fn test_lazy_creation() {
        let store = HistoryStore::new(10);
        let key = PairKey::new("btc-usdt", "eth-usdt");
        assert_eq!(store.len(&key).await, 0);

        store.append(key.clone(), sample(1, 0.5, false)).await;
        assert_eq!(store.len(&key).await, 1);
    }

    #[tokio::test]
    async fn test_stats_for_symbol() {
        let store = HistoryStore::new(10);
        let key = PairKey::new("btc-usdt", "btc-usdt");
        store.append(key.clone(), sample(1, 1.0, true)).await;
        store.append(key.clone(), sample(2, 3.0, true)).await;
        store.append(key.clone(), sample(3, 2.0, false)).await;

        let other = PairKey::new("eth-usdt", "eth-usdt");
        store.append(other, sample(4, 9.0, true)).await;

        let stats = store.stats_for_symbol("btc-usdt").await;
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].samples, 3);
        assert_eq!(stats[0].opportunities, 2);
        assert_eq!(stats[0].max_spread_pct, 3.0);
        assert!((stats[0].avg_spread_pct - 2.0).abs() < 1e-9);
        assert_eq!(stats[0].last.as_ref().unwrap().timestamp_ms, 3);
    }

    #[tokio::test]
    async fn test_stats_for_unknown_symbol_is_empty() {
        let store = HistoryStore::new(10);
        assert!(store.stats_for_symbol("sol-usdt").await.is_empty());
    }
}

//! Subscription registry and subscription state
//!
//! Process-wide mapping of subscription identity to running monitor/view
//! state, enforcing at-most-one-active-per-identity. Stopping is
//! cooperative: operations here only flip the `active` flag; the running
//! loop observes it at its next iteration boundary and exits on its own.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::sink::SinkTarget;

// =============================================================================
// Monitor subscriptions
// =============================================================================

/// Immutable parameters of an arbitrage monitor subscription
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorParams {
    pub symbol1: String,
    pub exchange1: String,
    pub symbol2: String,
    pub exchange2: String,
    pub market_type: String,
    pub threshold_pct: f64,
    pub sink_target: SinkTarget,
}

impl MonitorParams {
    /// Human-readable label, e.g. "btc-usdt@binance vs btc-usdt@okx"
    pub fn label(&self) -> String {
        format!(
            "{}@{} vs {}@{}",
            self.symbol1, self.exchange1, self.symbol2, self.exchange2
        )
    }
}

/// Identity of a monitor subscription
///
/// The threshold is keyed in integer basis points so the key is `Eq + Hash`
/// without comparing floats.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MonitorKey {
    pub symbol1: String,
    pub exchange1: String,
    pub symbol2: String,
    pub exchange2: String,
    pub threshold_bps: i64,
}

impl MonitorKey {
    pub fn of(params: &MonitorParams) -> Self {
        Self {
            symbol1: params.symbol1.clone(),
            exchange1: params.exchange1.clone(),
            symbol2: params.symbol2.clone(),
            exchange2: params.exchange2.clone(),
            threshold_bps: (params.threshold_pct * 100.0).round() as i64,
        }
    }
}

/// Mutable per-monitor statistics, updated by the loop and read by the
/// command surface
#[derive(Debug, Clone, Default)]
pub struct MonitorStats {
    pub last_updated_ms: u64,
    pub alerts_sent: u64,
    pub max_spread_pct: f64,
    pub last_error_notified_ms: u64,
}

/// One arbitrage monitor subscription
///
/// The `active` flag is the cooperative cancellation signal shared between
/// the registry and the loop task.
#[derive(Debug)]
pub struct MonitorSubscription {
    pub params: MonitorParams,
    active: AtomicBool,
    pub stats: RwLock<MonitorStats>,
}

impl MonitorSubscription {
    fn new(params: MonitorParams) -> Self {
        Self {
            params,
            active: AtomicBool::new(true),
            stats: RwLock::new(MonitorStats::default()),
        }
    }

    pub fn key(&self) -> MonitorKey {
        MonitorKey::of(&self.params)
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    pub fn activate(&self) {
        self.active.store(true, Ordering::SeqCst);
    }

    pub fn deactivate(&self) {
        self.active.store(false, Ordering::SeqCst);
    }
}

// =============================================================================
// View subscriptions
// =============================================================================

/// Immutable parameters of a consolidated market view subscription
#[derive(Debug, Clone, PartialEq)]
pub struct ViewParams {
    pub symbol: String,
    pub exchanges: Vec<String>,
    pub market_type: String,
    pub sink_target: SinkTarget,
}

impl ViewParams {
    pub fn label(&self) -> String {
        format!("{} on {}", self.symbol, self.exchanges.join(", "))
    }
}

/// Identity of a view subscription: symbol plus the ordered exchange list
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ViewKey {
    pub symbol: String,
    pub exchanges: Vec<String>,
}

impl ViewKey {
    pub fn of(params: &ViewParams) -> Self {
        Self {
            symbol: params.symbol.clone(),
            exchanges: params.exchanges.clone(),
        }
    }
}

/// One market view subscription
#[derive(Debug)]
pub struct ViewSubscription {
    pub params: ViewParams,
    active: AtomicBool,
}

impl ViewSubscription {
    fn new(params: ViewParams) -> Self {
        Self {
            params,
            active: AtomicBool::new(true),
        }
    }

    pub fn key(&self) -> ViewKey {
        ViewKey::of(&self.params)
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    pub fn activate(&self) {
        self.active.store(true, Ordering::SeqCst);
    }

    pub fn deactivate(&self) {
        self.active.store(false, Ordering::SeqCst);
    }
}

// =============================================================================
// Registry
// =============================================================================

/// Outcome of a subscribe request
#[derive(Debug, Clone)]
pub enum Subscribe<T> {
    /// A fresh loop must be spawned for this subscription
    Created(Arc<T>),
    /// An identical subscription is already running; nothing was changed
    AlreadyActive(Arc<T>),
}

impl<T> Subscribe<T> {
    pub fn is_created(&self) -> bool {
        matches!(self, Subscribe::Created(_))
    }

    pub fn subscription(&self) -> &Arc<T> {
        match self {
            Subscribe::Created(sub) | Subscribe::AlreadyActive(sub) => sub,
        }
    }
}

/// Outcome of a stop request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    Stopped,
    NotFound,
}

/// Process-wide registry of monitor and view subscriptions
#[derive(Debug, Default)]
pub struct SubscriptionRegistry {
    monitors: RwLock<HashMap<MonitorKey, Arc<MonitorSubscription>>>,
    views: RwLock<HashMap<ViewKey, Arc<ViewSubscription>>>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a monitor subscription
    ///
    /// Re-subscribing an identity whose previous loop was stopped reuses
    /// the same subscription object, reactivated for a fresh loop.
    pub async fn subscribe_monitor(&self, params: MonitorParams) -> Subscribe<MonitorSubscription> {
        let key = MonitorKey::of(&params);
        let mut monitors = self.monitors.write().await;

        if let Some(existing) = monitors.get(&key) {
            if existing.is_active() {
                return Subscribe::AlreadyActive(Arc::clone(existing));
            }
            existing.activate();
            return Subscribe::Created(Arc::clone(existing));
        }

        let sub = Arc::new(MonitorSubscription::new(params));
        monitors.insert(key, Arc::clone(&sub));
        Subscribe::Created(sub)
    }

    /// Register a view subscription, same lifecycle as monitors
    pub async fn subscribe_view(&self, params: ViewParams) -> Subscribe<ViewSubscription> {
        let key = ViewKey::of(&params);
        let mut views = self.views.write().await;

        if let Some(existing) = views.get(&key) {
            if existing.is_active() {
                return Subscribe::AlreadyActive(Arc::clone(existing));
            }
            existing.activate();
            return Subscribe::Created(Arc::clone(existing));
        }

        let sub = Arc::new(ViewSubscription::new(params));
        views.insert(key, Arc::clone(&sub));
        Subscribe::Created(sub)
    }

    /// Request a monitor stop (flag flip only, does not wait for the loop)
    pub async fn stop_monitor(&self, key: &MonitorKey) -> StopOutcome {
        let monitors = self.monitors.read().await;
        match monitors.get(key) {
            Some(sub) if sub.is_active() => {
                sub.deactivate();
                StopOutcome::Stopped
            }
            _ => StopOutcome::NotFound,
        }
    }

    /// Request a view stop
    pub async fn stop_view(&self, key: &ViewKey) -> StopOutcome {
        let views = self.views.read().await;
        match views.get(key) {
            Some(sub) if sub.is_active() => {
                sub.deactivate();
                StopOutcome::Stopped
            }
            _ => StopOutcome::NotFound,
        }
    }

    /// Flip every active subscription owned by the sink target; returns the
    /// number of flags flipped. Does not wait for the loops to observe it.
    pub async fn stop_all_for_sink(&self, target: SinkTarget) -> usize {
        let mut count = 0;

        let monitors = self.monitors.read().await;
        for sub in monitors.values() {
            if sub.params.sink_target == target && sub.is_active() {
                sub.deactivate();
                count += 1;
            }
        }
        drop(monitors);

        let views = self.views.read().await;
        for sub in views.values() {
            if sub.params.sink_target == target && sub.is_active() {
                sub.deactivate();
                count += 1;
            }
        }

        count
    }

    pub async fn lookup_monitor(&self, key: &MonitorKey) -> Option<Arc<MonitorSubscription>> {
        self.monitors.read().await.get(key).cloned()
    }

    pub async fn lookup_view(&self, key: &ViewKey) -> Option<Arc<ViewSubscription>> {
        self.views.read().await.get(key).cloned()
    }

    /// Number of currently active monitor subscriptions
    pub async fn active_monitors(&self) -> usize {
        self.monitors
            .read()
            .await
            .values()
            .filter(|s| s.is_active())
            .count()
    }

    /// Number of currently active view subscriptions
    pub async fn active_views(&self) -> usize {
        self.views
            .read()
            .await
            .values()
            .filter(|s| s.is_active())
            .count()
    }
}

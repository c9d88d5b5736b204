//! Monitoring engine core: calculators, subscription state, and loops

pub mod cbbo;
pub mod engine;
pub mod history;
pub mod monitor;
pub mod quote;
pub mod registry;
pub mod spread;
pub mod view;

pub use engine::{Engine, SubscribeOutcome};
pub use history::{HistoryStore, PairKey, PairStats, SpreadSample};
pub use quote::{current_time_ms, Quote};
pub use registry::{
    MonitorKey, MonitorParams, MonitorSubscription, StopOutcome, SubscriptionRegistry, ViewKey,
    ViewParams, ViewSubscription,
};

//! GoMarket arbitrage monitoring bot - core engine
//!
//! Per-subscription polling loops that:
//! - Fetch quotes from exchanges via a pluggable provider
//! - Compute cross-exchange spreads and consolidated BBO (CBBO)
//! - Keep bounded spread history per symbol pair
//! - Push status updates and alerts to a notification sink

pub mod config;
pub mod core;
pub mod error;
pub mod provider;
pub mod sink;

pub use error::AppError;

//! Quote provider boundary
//!
//! The engine consumes quotes through this trait; the production
//! implementation talks to the GoMarket REST API, and a synthetic provider
//! exists for demo/test environments.

pub mod gomarket;
pub mod mock;

use async_trait::async_trait;
use thiserror::Error;

use crate::core::quote::Quote;

pub use gomarket::GoMarketClient;
pub use mock::MockQuoteProvider;

/// Failure classes of a quote fetch
///
/// The monitoring loops treat all variants identically for backoff
/// purposes but log the distinction.
#[derive(Error, Debug)]
pub enum FetchError {
    /// Transport-level failure (DNS, connect, timeout)
    #[error("network error: {0}")]
    Network(String),

    /// Non-2xx response from the price API
    #[error("upstream error {status}: {body}")]
    Upstream { status: u16, body: String },

    /// Response body missing required fields or not parseable
    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Result type alias for provider operations
pub type FetchResult<T> = Result<T, FetchError>;

/// Source of quote snapshots and symbol listings
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Fetch the current quote for a symbol on one exchange
    async fn fetch_quote(
        &self,
        exchange: &str,
        market_type: &str,
        symbol: &str,
    ) -> FetchResult<Quote>;

    /// List available symbols for an exchange and market type
    async fn list_symbols(&self, exchange: &str, market_type: &str) -> FetchResult<Vec<String>>;
}

//! GoMarket REST API client
//!
//! Endpoints:
//! - `GET {base}/ticker/{exchange}/{market_type}/{symbol}` -> quote snapshot
//! - `GET {base}/symbols/{exchange}/{market_type}` -> symbol listing
//!
//! The ticker payload is parsed leniently: missing `bid`/`ask`/`last`
//! default to 0.0 (the mid-price rule handles one-sided quotes) and a
//! missing `timestamp` defaults to the local clock. A body that is not a
//! JSON object at all is malformed.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use super::{FetchError, FetchResult, QuoteProvider};
use crate::core::quote::{current_time_ms, Quote};

/// Request timeout for the price API
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// HTTP client for the GoMarket price API
#[derive(Debug, Clone)]
pub struct GoMarketClient {
    base: String,
    client: reqwest::Client,
}

impl GoMarketClient {
    /// Create a client against the given API base URL (no trailing slash)
    pub fn new(base: impl Into<String>) -> FetchResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;

        Ok(Self {
            base: base.into(),
            client,
        })
    }

    async fn get_json(&self, url: &str) -> FetchResult<Value> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|_| "<no body>".to_string());
            return Err(FetchError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| FetchError::Malformed(e.to_string()))
    }
}

#[async_trait]
impl QuoteProvider for GoMarketClient {
    async fn fetch_quote(
        &self,
        exchange: &str,
        market_type: &str,
        symbol: &str,
    ) -> FetchResult<Quote> {
        let url = format!("{}/ticker/{}/{}/{}", self.base, exchange, market_type, symbol);
        let data = self.get_json(&url).await?;

        let obj = data
            .as_object()
            .ok_or_else(|| FetchError::Malformed("ticker response is not a JSON object".to_string()))?;

        let field = |name: &str| obj.get(name).and_then(Value::as_f64).unwrap_or(0.0);
        let quote = Quote {
            bid: field("bid"),
            ask: field("ask"),
            last: field("last"),
            timestamp_ms: obj
                .get("timestamp")
                .and_then(Value::as_u64)
                .unwrap_or_else(current_time_ms),
        };

        debug!(exchange, symbol, bid = quote.bid, ask = quote.ask, "Quote fetched");
        Ok(quote)
    }

    async fn list_symbols(&self, exchange: &str, market_type: &str) -> FetchResult<Vec<String>> {
        let url = format!("{}/symbols/{}/{}", self.base, exchange, market_type);
        let data = self.get_json(&url).await?;

        // Either {"symbols": [{name} | {base, quote}]} or a bare string array
        if let Some(entries) = data.get("symbols").and_then(Value::as_array) {
            let names = entries
                .iter()
                .filter_map(|item| {
                    if let Some(name) = item.get("name").and_then(Value::as_str) {
                        return Some(name.to_string());
                    }
                    let base = item.get("base").and_then(Value::as_str)?;
                    let quote = item.get("quote").and_then(Value::as_str)?;
                    Some(format!("{}/{}", base, quote))
                })
                .collect();
            return Ok(names);
        }

        if let Some(entries) = data.as_array() {
            return Ok(entries
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect());
        }

        Err(FetchError::Malformed(
            "symbols response has neither a 'symbols' array nor a bare array".to_string(),
        ))
    }
}

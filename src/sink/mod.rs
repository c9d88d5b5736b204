//! Notification sink boundary
//!
//! The engine renders fully formatted human-readable text; the sink owns
//! the delivery transport (a chat message edit in the original interface).
//! A sink may drop an update whose rendered content is byte-identical to
//! the previous one - that is the `Unchanged` contract, which loops must
//! tolerate but never rely on.

pub mod log;

use async_trait::async_trait;
use thiserror::Error;

pub use log::LogSink;

/// Opaque delivery target (chat id in the Telegram transport)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SinkTarget(pub i64);

impl std::fmt::Display for SinkTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Affordances a transport may render alongside a status (e.g. inline buttons)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkAction {
    StopMonitor,
    RestartMonitor,
    StopView,
}

/// Errors a sink may report; all are non-fatal to the calling loop
#[derive(Error, Debug)]
pub enum RenderError {
    /// Rendered content was byte-identical to the previous update
    #[error("rendered content unchanged")]
    Unchanged,

    /// Delivery transport failure
    #[error("sink transport error: {0}")]
    Transport(String),
}

/// Rendering surface the monitoring loops push updates to
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Replace the subscription's status display
    async fn render_status(
        &self,
        target: SinkTarget,
        text: &str,
        actions: &[SinkAction],
    ) -> Result<(), RenderError>;

    /// Push a one-off alert notification
    async fn render_alert(&self, target: SinkTarget, text: &str) -> Result<(), RenderError>;
}

//! Tracing-backed notification sink for headless runs

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::info;

use super::{NotificationSink, RenderError, SinkAction, SinkTarget};

/// Sink that writes updates to the tracing log
///
/// Implements the idempotent-render optimization: a status identical to
/// the previous one for the same target is reported as `Unchanged` and not
/// logged again.
#[derive(Debug, Default)]
pub struct LogSink {
    last_status: Mutex<HashMap<SinkTarget, String>>,
}

impl LogSink {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl NotificationSink for LogSink {
    async fn render_status(
        &self,
        target: SinkTarget,
        text: &str,
        actions: &[SinkAction],
    ) -> Result<(), RenderError> {
        let mut last = self.last_status.lock().await;
        if last.get(&target).map(String::as_str) == Some(text) {
            return Err(RenderError::Unchanged);
        }
        last.insert(target, text.to_string());
        drop(last);

        info!(target_id = %target, actions = ?actions, "Status update\n{}", text);
        Ok(())
    }

    async fn render_alert(&self, target: SinkTarget, text: &str) -> Result<(), RenderError> {
        info!(target_id = %target, "Alert\n{}", text);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_identical_status_reports_unchanged() {
        let sink = LogSink::new();
        let target = SinkTarget(7);

        assert!(sink.render_status(target, "state A", &[]).await.is_ok());
        let second = sink.render_status(target, "state A", &[]).await;
        assert!(matches!(second, Err(RenderError::Unchanged)));

        // A different target is tracked independently
        assert!(sink.render_status(SinkTarget(8), "state A", &[]).await.is_ok());
        // New content goes through again
        assert!(sink.render_status(target, "state B", &[]).await.is_ok());
    }

    #[tokio::test]
    async fn test_alerts_are_never_deduplicated() {
        let sink = LogSink::new();
        let target = SinkTarget(7);
        assert!(sink.render_alert(target, "alert").await.is_ok());
        assert!(sink.render_alert(target, "alert").await.is_ok());
    }
}

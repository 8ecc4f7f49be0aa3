//! Publisher that writes events to the log.

use async_trait::async_trait;

use super::{EventPublisher, PublishError};

/// Default publisher: every event becomes a structured `info` line
#[derive(Debug, Clone, Default)]
pub struct TracingEventPublisher;

impl TracingEventPublisher {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EventPublisher for TracingEventPublisher {
    async fn publish(&self, topic: &str, payload: serde_json::Value) -> Result<(), PublishError> {
        tracing::info!(target: "sales_api::events", topic, payload = %payload, "Domain event");
        Ok(())
    }
}

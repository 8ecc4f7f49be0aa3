//! Event publisher module
//!
//! Domain events leave the process through an [`EventPublisher`] after the
//! unit of work committed. Publication is best effort: a failure is logged
//! and never turns a committed change into an error.

mod channel;
mod log;

#[cfg(test)]
pub(crate) mod mock;

pub use channel::{ChannelEventPublisher, PublishedEvent};
pub use log::TracingEventPublisher;

use async_trait::async_trait;

use crate::domain::DomainEvent;

/// Errors raised by publishers
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Publisher unavailable: {0}")]
    Unavailable(String),
}

/// Outbound channel for integration events
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, topic: &str, payload: serde_json::Value) -> Result<(), PublishError>;
}

/// Publish `event` on its topic, logging and swallowing any failure.
///
/// Returns whether the event went out.
pub async fn publish_best_effort<E>(publisher: &dyn EventPublisher, event: &E) -> bool
where
    E: DomainEvent + Sync,
{
    let topic = event.topic();
    let payload = match serde_json::to_value(event) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::warn!(topic, sale_id = %event.sale_id(), error = %e, "Failed to serialize event");
            return false;
        }
    };

    match publisher.publish(topic, payload).await {
        Ok(()) => {
            tracing::debug!(topic, sale_id = %event.sale_id(), "Event published");
            true
        }
        Err(e) => {
            tracing::warn!(topic, sale_id = %event.sale_id(), error = %e, "Failed to publish event");
            false
        }
    }
}

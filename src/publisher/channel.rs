//! In-process publisher using a tokio broadcast channel.
//!
//! Every subscriber receives every event; events published while nobody is
//! subscribed are dropped.

use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::{debug, info};

use super::{EventPublisher, PublishError};

/// Channel capacity for broadcast.
const CHANNEL_CAPACITY: usize = 1024;

/// An event as seen by subscribers
#[derive(Debug, Clone, PartialEq)]
pub struct PublishedEvent {
    pub topic: String,
    pub payload: serde_json::Value,
}

#[derive(Debug, Clone)]
pub struct ChannelEventPublisher {
    sender: broadcast::Sender<PublishedEvent>,
}

impl ChannelEventPublisher {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        info!(capacity = CHANNEL_CAPACITY, "Channel event publisher initialized");
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PublishedEvent> {
        self.sender.subscribe()
    }

    /// Log every event received by a fresh subscriber until the channel closes
    pub fn spawn_logger(&self) -> tokio::task::JoinHandle<()> {
        let mut receiver = self.subscribe();
        tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(event) => {
                        info!(topic = %event.topic, payload = %event.payload, "Event received");
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Event logger lagged behind");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }
}

impl Default for ChannelEventPublisher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventPublisher for ChannelEventPublisher {
    async fn publish(&self, topic: &str, payload: serde_json::Value) -> Result<(), PublishError> {
        let event = PublishedEvent {
            topic: topic.to_string(),
            payload,
        };
        match self.sender.send(event) {
            Ok(receivers) => debug!(topic, receivers, "Event broadcast"),
            Err(_) => debug!(topic, "Event dropped, no subscribers"),
        }
        Ok(())
    }
}

//! Mock publisher for testing.

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{EventPublisher, PublishError};

#[derive(Default)]
pub struct MockEventPublisher {
    published: RwLock<Vec<(String, serde_json::Value)>>,
    fail_on_publish: RwLock<bool>,
}

impl MockEventPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_fail_on_publish(&self, fail: bool) {
        *self.fail_on_publish.write().await = fail;
    }

    pub async fn published_count(&self) -> usize {
        self.published.read().await.len()
    }

    pub async fn topics(&self) -> Vec<String> {
        self.published
            .read()
            .await
            .iter()
            .map(|(topic, _)| topic.clone())
            .collect()
    }

    pub async fn take_published(&self) -> Vec<(String, serde_json::Value)> {
        std::mem::take(&mut *self.published.write().await)
    }
}

#[async_trait]
impl EventPublisher for MockEventPublisher {
    async fn publish(&self, topic: &str, payload: serde_json::Value) -> Result<(), PublishError> {
        if *self.fail_on_publish.read().await {
            return Err(PublishError::Unavailable("Mock publish failure".to_string()));
        }
        self.published.write().await.push((topic.to_string(), payload));
        Ok(())
    }
}

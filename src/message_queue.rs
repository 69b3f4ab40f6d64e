/*!
 * Publish/subscribe boundary used for chat broadcast fan-out across
 * server processes. Single-process deployments run without a broker;
 * the in-memory implementation exists for tests and local development.
 */

use async_trait::async_trait;
use dashmap::DashMap;
use futures::StreamExt;
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::warn;
use uuid::Uuid;

/// Message queue errors
#[derive(Error, Debug)]
pub enum MessageQueueError {
    #[error("Serialization error: {0}")]
    SerializationError(String),
    #[error("Connection error: {0}")]
    ConnectionError(String),
}

/// Envelope for published messages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub topic: String,
    pub payload: serde_json::Value,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl Message {
    pub fn new(topic: String, payload: serde_json::Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            topic,
            payload,
            timestamp: chrono::Utc::now(),
        }
    }
}

/// Named-channel publish/subscribe primitive. Every subscriber to a
/// topic receives every message published to it.
#[async_trait]
pub trait MessageQueue: Send + Sync {
    async fn publish(&self, message: Message) -> Result<(), MessageQueueError>;
    async fn subscribe(&self, topic: &str) -> Result<mpsc::Receiver<Message>, MessageQueueError>;
}

/// In-memory fan-out implementation
#[derive(Debug, Default)]
pub struct InMemoryMessageQueue {
    subscribers: DashMap<String, Vec<mpsc::Sender<Message>>>,
}

impl InMemoryMessageQueue {
    pub fn new() -> Self {
        Self {
            subscribers: DashMap::new(),
        }
    }
}

#[async_trait]
impl MessageQueue for InMemoryMessageQueue {
    async fn publish(&self, message: Message) -> Result<(), MessageQueueError> {
        if let Some(mut entry) = self.subscribers.get_mut(&message.topic) {
            entry.retain(|tx| tx.try_send(message.clone()).is_ok() || !tx.is_closed());
        }
        Ok(())
    }

    async fn subscribe(&self, topic: &str) -> Result<mpsc::Receiver<Message>, MessageQueueError> {
        let (tx, rx) = mpsc::channel(256);
        self.subscribers
            .entry(topic.to_string())
            .or_default()
            .push(tx);
        Ok(rx)
    }
}

/// Redis pub/sub implementation for multi-process deployments.
pub struct RedisMessageQueue {
    client: redis::Client,
    manager: redis::aio::ConnectionManager,
    namespace: String,
}

impl RedisMessageQueue {
    pub async fn new(client: redis::Client, namespace: String) -> Result<Self, MessageQueueError> {
        let manager = redis::aio::ConnectionManager::new(client.clone())
            .await
            .map_err(|e| MessageQueueError::ConnectionError(e.to_string()))?;
        Ok(Self {
            client,
            manager,
            namespace,
        })
    }

    fn channel(&self, topic: &str) -> String {
        format!("{}:{}", self.namespace, topic)
    }
}

#[async_trait]
impl MessageQueue for RedisMessageQueue {
    async fn publish(&self, message: Message) -> Result<(), MessageQueueError> {
        let payload = serde_json::to_string(&message)
            .map_err(|e| MessageQueueError::SerializationError(e.to_string()))?;
        let channel = self.channel(&message.topic);
        let mut conn = self.manager.clone();
        let _: () = conn
            .publish(channel, payload)
            .await
            .map_err(|e| MessageQueueError::ConnectionError(e.to_string()))?;
        Ok(())
    }

    async fn subscribe(&self, topic: &str) -> Result<mpsc::Receiver<Message>, MessageQueueError> {
        let channel = self.channel(topic);
        let mut pubsub = self
            .client
            .get_async_pubsub()
            .await
            .map_err(|e| MessageQueueError::ConnectionError(e.to_string()))?;
        pubsub
            .subscribe(&channel)
            .await
            .map_err(|e| MessageQueueError::ConnectionError(e.to_string()))?;

        let (tx, rx) = mpsc::channel(256);
        tokio::spawn(async move {
            let mut stream = pubsub.on_message();
            while let Some(msg) = stream.next().await {
                let payload: String = match msg.get_payload() {
                    Ok(p) => p,
                    Err(e) => {
                        warn!("Dropping unreadable pub/sub payload: {}", e);
                        continue;
                    }
                };
                match serde_json::from_str::<Message>(&payload) {
                    Ok(message) => {
                        if tx.send(message).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => warn!("Dropping malformed pub/sub message: {}", e),
                }
            }
        });

        Ok(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn in_memory_queue_delivers_to_all_subscribers() {
        let queue = InMemoryMessageQueue::new();
        let mut rx_a = queue.subscribe("chat.events").await.unwrap();
        let mut rx_b = queue.subscribe("chat.events").await.unwrap();

        let message = Message::new(
            "chat.events".to_string(),
            serde_json::json!({"room": "abc"}),
        );
        queue.publish(message.clone()).await.unwrap();

        assert_eq!(rx_a.recv().await.unwrap().id, message.id);
        assert_eq!(rx_b.recv().await.unwrap().id, message.id);
    }

    #[tokio::test]
    async fn publish_without_subscribers_is_a_no_op() {
        let queue = InMemoryMessageQueue::new();
        let message = Message::new("empty".to_string(), serde_json::json!({}));
        assert!(queue.publish(message).await.is_ok());
    }

    #[tokio::test]
    async fn topics_are_isolated() {
        let queue = InMemoryMessageQueue::new();
        let mut rx = queue.subscribe("topic-a").await.unwrap();

        queue
            .publish(Message::new("topic-b".to_string(), serde_json::json!({})))
            .await
            .unwrap();

        assert!(rx.try_recv().is_err());
    }
}

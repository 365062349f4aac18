//! In-memory broker
//!
//! Backs the test suites and single-process lab runs: topics are broadcast
//! channels, delivery order per topic matches publish order. Implements the
//! same traits as the Redis adapter.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::{broadcast, mpsc, watch};
use tracing::{debug, warn};

use crate::broker::{Delivery, EventHandler, EventPublisher};
use crate::envelope::EventEnvelope;
use crate::error::TransportError;
use crate::redis_broker::dispatch;

const TOPIC_CAPACITY: usize = 256;

/// Shared in-process topic registry
#[derive(Clone, Default)]
pub struct MemoryBus {
    topics: Arc<Mutex<HashMap<String, broadcast::Sender<Delivery>>>>,
}

impl MemoryBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn sender(&self, topic: &str) -> broadcast::Sender<Delivery> {
        let mut topics = self.topics.lock().expect("topic registry poisoned");
        topics
            .entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(TOPIC_CAPACITY).0)
            .clone()
    }

    /// Opens a raw receiver on a topic; used by tests to observe traffic.
    pub fn subscribe_topic(&self, topic: &str) -> broadcast::Receiver<Delivery> {
        self.sender(topic).subscribe()
    }
}

#[async_trait]
impl EventPublisher for MemoryBus {
    async fn publish(&self, topic: &str, envelope: &EventEnvelope) -> Result<(), TransportError> {
        let delivery = Delivery {
            topic: topic.to_string(),
            envelope: envelope.clone(),
        };

        // A send error only means nobody is listening yet; publishing is
        // fire-and-forget either way.
        if self.sender(topic).send(delivery).is_err() {
            debug!(topic, "No subscribers for topic");
        }

        Ok(())
    }
}

/// Dispatch loop over in-memory topics
pub struct MemorySubscriber {
    bus: MemoryBus,
    handlers: HashMap<String, Arc<dyn EventHandler>>,
}

impl MemorySubscriber {
    pub fn new(bus: MemoryBus) -> Self {
        Self {
            bus,
            handlers: HashMap::new(),
        }
    }

    /// Registers a handler for a topic.
    pub fn on(mut self, topic: impl Into<String>, handler: Arc<dyn EventHandler>) -> Self {
        self.handlers.insert(topic.into(), handler);
        self
    }

    /// Runs the dispatch loop until the shutdown signal fires.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> Result<(), TransportError> {
        let (tx, mut rx) = mpsc::channel::<Delivery>(TOPIC_CAPACITY);

        // One forwarding task per topic funnels into a single queue so the
        // dispatch below stays strictly sequential.
        for topic in self.handlers.keys() {
            let mut topic_rx = self.bus.subscribe_topic(topic);
            let tx = tx.clone();
            let topic = topic.clone();

            tokio::spawn(async move {
                loop {
                    match topic_rx.recv().await {
                        Ok(delivery) => {
                            if tx.send(delivery).await.is_err() {
                                break;
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            warn!(topic, skipped, "Subscriber lagged, events dropped");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }
            });
        }
        drop(tx);

        loop {
            tokio::select! {
                maybe_delivery = rx.recv() => {
                    let Some(delivery) = maybe_delivery else { break };
                    dispatch(&self.handlers, delivery).await;
                }
                _ = shutdown.changed() => break,
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_publish_reaches_subscriber() {
        let bus = MemoryBus::new();
        let mut rx = bus.subscribe_topic("lab.test");

        let envelope = EventEnvelope::new("Test", "lab", &json!({"id": "X-1"})).unwrap();
        bus.publish("lab.test", &envelope).await.unwrap();

        let delivery = rx.recv().await.unwrap();
        assert_eq!(delivery.topic, "lab.test");
        assert_eq!(delivery.envelope.event_type, "Test");
        assert_eq!(delivery.key(), Some("X-1"));
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_ok() {
        let bus = MemoryBus::new();
        let envelope = EventEnvelope::new("Test", "lab", &json!({})).unwrap();
        assert!(bus.publish("lab.silent", &envelope).await.is_ok());
    }
}

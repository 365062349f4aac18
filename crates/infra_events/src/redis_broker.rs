//! Redis-backed broker adapter
//!
//! Topics are Redis pub/sub channels. The publisher reuses a
//! `ConnectionManager` (which reconnects under the hood); the subscriber
//! holds a dedicated pub/sub connection and dispatches messages one at a
//! time in arrival order.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::broker::{Delivery, EventHandler, EventPublisher};
use crate::envelope::EventEnvelope;
use crate::error::TransportError;

/// Publishes envelopes to Redis channels
#[derive(Clone)]
pub struct RedisPublisher {
    conn: ConnectionManager,
}

impl RedisPublisher {
    /// Connects to the broker at the given URL (e.g. "redis://localhost:6379").
    pub async fn connect(url: &str) -> Result<Self, TransportError> {
        info!(%url, "Connecting event publisher to broker");

        let client = redis::Client::open(url)
            .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;
        let conn = ConnectionManager::new(client)
            .await
            .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;

        Ok(Self { conn })
    }
}

#[async_trait]
impl EventPublisher for RedisPublisher {
    async fn publish(&self, topic: &str, envelope: &EventEnvelope) -> Result<(), TransportError> {
        let bytes = envelope.to_bytes()?;
        let mut conn = self.conn.clone();

        let receivers: i64 = conn
            .publish(topic, bytes)
            .await
            .map_err(|e| TransportError::publish_failed(topic, e))?;

        debug!(
            topic,
            event_type = %envelope.event_type,
            key = envelope.partition_key().unwrap_or("-"),
            receivers,
            "Event published"
        );

        Ok(())
    }
}

/// Consumes Redis channels and dispatches to per-topic handlers
pub struct RedisSubscriber {
    client: redis::Client,
    handlers: HashMap<String, Arc<dyn EventHandler>>,
}

impl RedisSubscriber {
    pub fn new(url: &str) -> Result<Self, TransportError> {
        let client = redis::Client::open(url)
            .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;

        Ok(Self {
            client,
            handlers: HashMap::new(),
        })
    }

    /// Registers a handler for a topic.
    pub fn on(mut self, topic: impl Into<String>, handler: Arc<dyn EventHandler>) -> Self {
        self.handlers.insert(topic.into(), handler);
        self
    }

    /// Runs the dispatch loop until the shutdown signal fires.
    ///
    /// One handler invocation is in flight at a time; handler errors are
    /// logged and consumption continues with the next message.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> Result<(), TransportError> {
        let mut pubsub = self
            .client
            .get_async_pubsub()
            .await
            .map_err(|e| TransportError::SubscribeFailed(e.to_string()))?;

        for topic in self.handlers.keys() {
            pubsub
                .subscribe(topic)
                .await
                .map_err(|e| TransportError::SubscribeFailed(e.to_string()))?;
        }

        let topics: Vec<&String> = self.handlers.keys().collect();
        info!(?topics, "Subscriber listening");

        let mut stream = pubsub.on_message();

        loop {
            tokio::select! {
                maybe_msg = stream.next() => {
                    let Some(msg) = maybe_msg else {
                        warn!("Broker connection closed, stopping subscriber");
                        break;
                    };

                    let topic = msg.get_channel_name().to_string();
                    let envelope = match EventEnvelope::from_bytes(msg.get_payload_bytes()) {
                        Ok(envelope) => envelope,
                        Err(e) => {
                            error!(topic, error = %e, "Dropping unparseable event");
                            continue;
                        }
                    };

                    dispatch(&self.handlers, Delivery { topic, envelope }).await;
                }
                _ = shutdown.changed() => {
                    info!("Shutdown signal received, stopping subscriber");
                    break;
                }
            }
        }

        Ok(())
    }
}

pub(crate) async fn dispatch(
    handlers: &HashMap<String, Arc<dyn EventHandler>>,
    delivery: Delivery,
) {
    let topic = delivery.topic.clone();

    let Some(handler) = handlers.get(&topic) else {
        warn!(topic, "No handler registered for topic");
        return;
    };

    debug!(
        topic,
        event_type = %delivery.envelope.event_type,
        key = delivery.key().unwrap_or("-"),
        "Event received"
    );

    if let Err(e) = handler.handle(delivery).await {
        error!(topic, error = %e, "Event handler failed");
    }
}

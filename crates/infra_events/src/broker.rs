//! Publisher and handler abstractions
//!
//! Domain services depend on these traits, never on a concrete client, so
//! the same service code runs against Redis in the lab and the in-memory
//! bus in tests.

use async_trait::async_trait;

use crate::envelope::EventEnvelope;
use crate::error::TransportError;

/// An inbound message as seen by a handler
#[derive(Debug, Clone)]
pub struct Delivery {
    pub topic: String,
    pub envelope: EventEnvelope,
}

impl Delivery {
    /// The partition key derived from the payload.
    pub fn key(&self) -> Option<&str> {
        self.envelope.partition_key()
    }
}

/// Publishes envelopes to named topics
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publishes one envelope. Failures are reported but the caller decides
    /// whether to care; lifecycle operations log and continue.
    async fn publish(&self, topic: &str, envelope: &EventEnvelope) -> Result<(), TransportError>;
}

/// Handles inbound deliveries for one topic
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, delivery: Delivery) -> Result<(), TransportError>;
}

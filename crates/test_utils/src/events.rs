//! Event capture helpers
//!
//! Wraps the in-memory bus so tests can assert on published traffic
//! without spinning up a subscriber loop.

use std::sync::Arc;

use tokio::sync::broadcast;

use infra_events::{Delivery, EventPublisher, MemoryBus};

/// A memory bus plus raw receivers on the topics a test cares about.
pub struct EventCapture {
    pub bus: MemoryBus,
    receivers: Vec<(String, broadcast::Receiver<Delivery>)>,
}

impl EventCapture {
    /// Opens receivers on each given topic before any publishing happens.
    pub fn on_topics(topics: &[&str]) -> Self {
        let bus = MemoryBus::new();
        let receivers = topics
            .iter()
            .map(|t| (t.to_string(), bus.subscribe_topic(t)))
            .collect();
        Self { bus, receivers }
    }

    /// The bus as a publisher handle for wiring into services.
    pub fn publisher(&self) -> Arc<dyn EventPublisher> {
        Arc::new(self.bus.clone())
    }

    /// Drains everything published so far on one topic.
    pub fn drain(&mut self, topic: &str) -> Vec<Delivery> {
        let mut out = Vec::new();
        for (name, rx) in &mut self.receivers {
            if name == topic {
                while let Ok(delivery) = rx.try_recv() {
                    out.push(delivery);
                }
            }
        }
        out
    }
}

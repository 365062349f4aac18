//! Event Transport Adapter
//!
//! A thin publish/subscribe layer between the three services and the broker.
//! Broker topics map to Redis pub/sub channels; the adapter only knows how
//! to serialize envelopes, publish them and dispatch inbound messages to a
//! per-topic handler.
//!
//! Delivery semantics are deliberately modest, matching the lab's design:
//! publishes are best effort (callers log failures and move on, local state
//! is never rolled back), and each subscriber runs one dispatch loop that
//! invokes at most one handler at a time, preserving arrival order.
//!
//! An in-memory implementation of the same traits backs the test suites, so
//! the event flow can be exercised without a running broker.

pub mod broker;
pub mod envelope;
pub mod error;
pub mod memory;
pub mod redis_broker;
pub mod topics;

pub use broker::{Delivery, EventHandler, EventPublisher};
pub use envelope::EventEnvelope;
pub use error::TransportError;
pub use memory::{MemoryBus, MemorySubscriber};
pub use redis_broker::{RedisPublisher, RedisSubscriber};

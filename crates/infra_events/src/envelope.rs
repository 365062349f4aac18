//! Event envelope
//!
//! Every notification travels as the same JSON envelope:
//! `{id, type, source, timestamp, data}`. The partition key is not carried
//! separately; it is derived from a well-known id field inside the payload,
//! so producer and consumer always agree on it.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use core_kernel::EventId;

use crate::error::TransportError;

/// Generic event envelope with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub id: EventId,
    #[serde(rename = "type")]
    pub event_type: String,
    pub source: String,
    pub timestamp: DateTime<Utc>,
    pub data: Value,
}

/// Payload fields recognised as partition keys, in precedence order.
const KEY_FIELDS: [&str; 4] = ["quoteId", "contractId", "claimId", "id"];

impl EventEnvelope {
    /// Wraps a typed payload into an envelope.
    pub fn new(
        event_type: impl Into<String>,
        source: impl Into<String>,
        data: &impl Serialize,
    ) -> Result<Self, TransportError> {
        Ok(Self {
            id: EventId::new(),
            event_type: event_type.into(),
            source: source.into(),
            timestamp: Utc::now(),
            data: serde_json::to_value(data)?,
        })
    }

    /// Deserializes the payload into a typed event.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, TransportError> {
        Ok(serde_json::from_value(self.data.clone())?)
    }

    /// Extracts the partition key from the payload, if any.
    pub fn partition_key(&self) -> Option<&str> {
        let obj = self.data.as_object()?;
        KEY_FIELDS
            .iter()
            .find_map(|field| obj.get(*field).and_then(Value::as_str))
    }

    /// Serializes the envelope to its wire form.
    pub fn to_bytes(&self) -> Result<Vec<u8>, TransportError> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Parses an envelope from its wire form.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TransportError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

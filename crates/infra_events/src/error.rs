//! Transport error types

use thiserror::Error;

/// Errors surfaced by the event transport adapter
#[derive(Debug, Error)]
pub enum TransportError {
    /// Could not reach the broker
    #[error("Failed to connect to broker: {0}")]
    ConnectionFailed(String),

    /// Publish failed after a successful local state change; callers log
    /// this and treat the operation as successful
    #[error("Publish failed on topic '{topic}': {message}")]
    PublishFailed { topic: String, message: String },

    /// Subscription setup failed
    #[error("Subscribe failed: {0}")]
    SubscribeFailed(String),

    /// Envelope could not be serialized or parsed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A registered handler returned an error; the dispatch loop logs it
    /// and keeps consuming
    #[error("Handler failed for topic '{topic}': {message}")]
    HandlerFailed { topic: String, message: String },
}

impl TransportError {
    pub fn publish_failed(topic: impl Into<String>, message: impl std::fmt::Display) -> Self {
        TransportError::PublishFailed {
            topic: topic.into(),
            message: message.to_string(),
        }
    }

    pub fn handler_failed(topic: impl Into<String>, message: impl std::fmt::Display) -> Self {
        TransportError::HandlerFailed {
            topic: topic.into(),
            message: message.to_string(),
        }
    }
}

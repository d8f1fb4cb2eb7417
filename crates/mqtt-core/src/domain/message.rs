//! Application message value object.

use serde::{Deserialize, Serialize};

use crate::domain::qos::QoS;

/// An application message: what a PUBLISH carries and what a will declares.
///
/// Instances are immutable.  The `with_*` methods return a modified copy and
/// leave the original untouched, so a message handed to a flow can never be
/// changed underneath it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    topic: String,
    payload: Vec<u8>,
    qos: QoS,
    retained: bool,
    duplicate: bool,
}

impl Message {
    /// Creates a QoS 0, non-retained, non-duplicate message.
    pub fn new(topic: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
            qos: QoS::AtMostOnce,
            retained: false,
            duplicate: false,
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn qos(&self) -> QoS {
        self.qos
    }

    pub fn is_retained(&self) -> bool {
        self.retained
    }

    pub fn is_duplicate(&self) -> bool {
        self.duplicate
    }

    pub fn with_topic(&self, topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            ..self.clone()
        }
    }

    pub fn with_payload(&self, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            payload: payload.into(),
            ..self.clone()
        }
    }

    pub fn with_qos(&self, qos: QoS) -> Self {
        Self { qos, ..self.clone() }
    }

    pub fn retained(&self) -> Self {
        Self {
            retained: true,
            ..self.clone()
        }
    }

    pub fn release(&self) -> Self {
        Self {
            retained: false,
            ..self.clone()
        }
    }

    pub fn duplicate(&self) -> Self {
        Self {
            duplicate: true,
            ..self.clone()
        }
    }

    pub fn original(&self) -> Self {
        Self {
            duplicate: false,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_message_defaults() {
        let message = Message::new("a/b", b"hello".to_vec());
        assert_eq!(message.topic(), "a/b");
        assert_eq!(message.payload(), b"hello");
        assert_eq!(message.qos(), QoS::AtMostOnce);
        assert!(!message.is_retained());
        assert!(!message.is_duplicate());
    }

    #[test]
    fn test_with_methods_leave_original_untouched() {
        // Arrange
        let original = Message::new("a/b", "x");

        // Act
        let changed = original
            .with_qos(QoS::ExactlyOnce)
            .retained()
            .duplicate()
            .with_topic("c/d");

        // Assert
        assert_eq!(original.qos(), QoS::AtMostOnce);
        assert_eq!(original.topic(), "a/b");
        assert_eq!(changed.qos(), QoS::ExactlyOnce);
        assert!(changed.is_retained());
        assert!(changed.is_duplicate());
        assert_eq!(changed.topic(), "c/d");
    }

    #[test]
    fn test_release_and_original_clear_flags() {
        let message = Message::new("t", "p").retained().duplicate();
        let cleared = message.release().original();
        assert!(!cleared.is_retained());
        assert!(!cleared.is_duplicate());
    }
}

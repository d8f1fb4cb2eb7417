//! Subscription value object.

use serde::{Deserialize, Serialize};

use crate::domain::qos::QoS;

/// A topic filter together with the QoS level requested for it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Subscription {
    filter: String,
    qos: QoS,
}

impl Subscription {
    pub fn new(filter: impl Into<String>, qos: QoS) -> Self {
        Self {
            filter: filter.into(),
            qos,
        }
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn qos(&self) -> QoS {
        self.qos
    }

    pub fn with_filter(&self, filter: impl Into<String>) -> Self {
        Self {
            filter: filter.into(),
            qos: self.qos,
        }
    }

    pub fn with_qos(&self, qos: QoS) -> Self {
        Self {
            filter: self.filter.clone(),
            qos,
        }
    }
}

//! Connection parameters value object.

use serde::{Deserialize, Serialize};

use crate::domain::message::Message;
use crate::protocol::ProtocolError;

/// MQTT 3.1 protocol level (`MQIsdp`).
pub const PROTOCOL_LEVEL_3_1: u8 = 3;

/// MQTT 3.1.1 protocol level (`MQTT`).
pub const PROTOCOL_LEVEL_3_1_1: u8 = 4;

/// Default keep-alive interval in seconds.
pub const DEFAULT_KEEP_ALIVE: u16 = 60;

/// Everything a client declares when it opens an MQTT session.
///
/// The record is immutable; every `with_*` method produces a new instance.
/// An empty client id means "let the flow generate one".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    protocol_level: u8,
    client_id: String,
    clean_session: bool,
    username: String,
    password: String,
    will: Option<Message>,
    keep_alive: u16,
}

impl Default for Connection {
    fn default() -> Self {
        Self {
            protocol_level: PROTOCOL_LEVEL_3_1_1,
            client_id: String::new(),
            clean_session: true,
            username: String::new(),
            password: String::new(),
            will: None,
            keep_alive: DEFAULT_KEEP_ALIVE,
        }
    }
}

impl Connection {
    /// Creates a 3.1.1 clean-session connection for `client_id`.
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            ..Self::default()
        }
    }

    pub fn protocol_level(&self) -> u8 {
        self.protocol_level
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn is_clean_session(&self) -> bool {
        self.clean_session
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn will(&self) -> Option<&Message> {
        self.will.as_ref()
    }

    pub fn keep_alive(&self) -> u16 {
        self.keep_alive
    }

    /// Returns a copy using protocol level 3 or 4.
    ///
    /// # Errors
    ///
    /// [`ProtocolError::InvalidArgument`] for any other level.
    pub fn with_protocol_level(&self, level: u8) -> Result<Self, ProtocolError> {
        if level != PROTOCOL_LEVEL_3_1 && level != PROTOCOL_LEVEL_3_1_1 {
            return Err(ProtocolError::InvalidArgument(format!(
                "unknown protocol level {level}"
            )));
        }
        Ok(Self {
            protocol_level: level,
            ..self.clone()
        })
    }

    pub fn with_client_id(&self, client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            ..self.clone()
        }
    }

    pub fn with_clean_session(&self, clean_session: bool) -> Self {
        Self {
            clean_session,
            ..self.clone()
        }
    }

    pub fn with_credentials(&self, username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            ..self.clone()
        }
    }

    pub fn with_will(&self, will: Option<Message>) -> Self {
        Self {
            will,
            ..self.clone()
        }
    }

    pub fn with_keep_alive(&self, keep_alive: u16) -> Self {
        Self {
            keep_alive,
            ..self.clone()
        }
    }
}

//! Decoder configuration.
//!
//! The defaults accept everything MQTT 3.1.1 allows.  A server that wants
//! the stricter client-id rule from MQTT 3.1 turns on `strict_client_id`;
//! a constrained device can lower `max_remaining_length` so that a peer
//! cannot make the stream parser buffer hundreds of megabytes.
//!
//! The struct derives `Deserialize` so it can be embedded in whatever
//! configuration file the host application already loads.

use serde::{Deserialize, Serialize};

use crate::protocol::cursor::MAX_REMAINING_LENGTH;

/// Options applied when decoding packets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Require CONNECT client ids of 1–23 ASCII alphanumeric characters.
    pub strict_client_id: bool,
    /// Largest remaining length accepted from a peer.
    pub max_remaining_length: u32,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            strict_client_id: false,
            max_remaining_length: MAX_REMAINING_LENGTH,
        }
    }
}

impl CodecConfig {
    /// Configuration with the strict client-id rule enabled.
    pub fn strict() -> Self {
        Self {
            strict_client_id: true,
            ..Self::default()
        }
    }

    /// `max_remaining_length`, capped at what the wire format can express.
    pub fn effective_max_remaining_length(&self) -> u32 {
        self.max_remaining_length.min(MAX_REMAINING_LENGTH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_lenient() {
        let config = CodecConfig::default();
        assert!(!config.strict_client_id);
        assert_eq!(config.effective_max_remaining_length(), MAX_REMAINING_LENGTH);
    }

    #[test]
    fn test_effective_max_is_capped() {
        let config = CodecConfig {
            max_remaining_length: u32::MAX,
            ..CodecConfig::default()
        };
        assert_eq!(config.effective_max_remaining_length(), MAX_REMAINING_LENGTH);
    }

    #[test]
    fn test_strict_constructor() {
        assert!(CodecConfig::strict().strict_client_id);
    }
}

//! Quality of Service levels.

use serde::{Deserialize, Serialize};

use crate::protocol::ProtocolError;

/// MQTT delivery guarantee for a single message.
///
/// The numeric value is exactly what appears on the wire (PUBLISH header
/// bits 1-2, SUBSCRIBE requested QoS byte, SUBACK granted QoS byte).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum QoS {
    /// Fire and forget; no acknowledgement.
    #[default]
    AtMostOnce = 0,
    /// Acknowledged with a single PUBACK.
    AtLeastOnce = 1,
    /// Four-way PUBLISH/PUBREC/PUBREL/PUBCOMP handshake.
    ExactlyOnce = 2,
}

impl QoS {
    /// Returns the wire value of this level.
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for QoS {
    type Error = ProtocolError;

    /// Converts a raw level into a [`QoS`].
    ///
    /// Callers decoding bytes should map the error to
    /// [`ProtocolError::MalformedPacket`]; callers configuring values get
    /// [`ProtocolError::InvalidArgument`] directly.
    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(QoS::AtMostOnce),
            1 => Ok(QoS::AtLeastOnce),
            2 => Ok(QoS::ExactlyOnce),
            _ => Err(ProtocolError::InvalidArgument(format!(
                "QoS level must be 0, 1 or 2, got {value}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qos_from_valid_levels() {
        assert_eq!(QoS::try_from(0), Ok(QoS::AtMostOnce));
        assert_eq!(QoS::try_from(1), Ok(QoS::AtLeastOnce));
        assert_eq!(QoS::try_from(2), Ok(QoS::ExactlyOnce));
    }

    #[test]
    fn test_qos_three_is_invalid_argument() {
        assert!(matches!(
            QoS::try_from(3),
            Err(ProtocolError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_qos_levels_are_ordered() {
        assert!(QoS::AtMostOnce < QoS::AtLeastOnce);
        assert!(QoS::AtLeastOnce < QoS::ExactlyOnce);
        assert_eq!(QoS::ExactlyOnce.as_u8(), 2);
    }
}

//! All MQTT 3.1/3.1.1 control packet types.
//!
//! Packets follow the wire format of MQTT 3.1.1 section 2: a fixed header
//! byte (4-bit type, 4-bit flags), a variable-length remaining length, then a
//! type-specific body.  The codec lives in [`crate::protocol::codec`]; this
//! module only defines the data each packet carries and the setters that
//! validate it.
//!
//! Setters fail fast with [`ProtocolError::InvalidArgument`].  The codec runs
//! the same checks again when writing, so a packet built by hand can never be
//! put on the wire in an invalid state.

use std::fmt;

use crate::domain::{Connection, Message, QoS, Subscription, PROTOCOL_LEVEL_3_1, PROTOCOL_LEVEL_3_1_1};
use crate::protocol::codec::{
    validate_strict_client_id, validate_string, validate_topic_filter, validate_topic_name,
    ProtocolError,
};

// ── Protocol constants ────────────────────────────────────────────────────────

/// Protocol name sent with protocol level 3 (MQTT 3.1).
pub const PROTOCOL_NAME_3_1: &str = "MQIsdp";

/// Protocol name sent with protocol level 4 (MQTT 3.1.1).
pub const PROTOCOL_NAME_3_1_1: &str = "MQTT";

/// SUBACK return code signalling a rejected subscription.
pub const SUBACK_FAILURE: u8 = 0x80;

/// Header flags required by PUBREL, SUBSCRIBE and UNSUBSCRIBE.
const RESERVED_FLAGS_0010: u8 = 0x02;

// ── Packet type codes ─────────────────────────────────────────────────────────

/// Control packet type, the high nibble of the fixed header byte.
///
/// Nibbles 0 and 15 are reserved and have no variant: they are reported as
/// [`ProtocolError::UnknownPacketType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PacketType {
    Connect = 1,
    ConnAck = 2,
    Publish = 3,
    PubAck = 4,
    PubRec = 5,
    PubRel = 6,
    PubComp = 7,
    Subscribe = 8,
    SubAck = 9,
    Unsubscribe = 10,
    UnsubAck = 11,
    PingReq = 12,
    PingResp = 13,
    Disconnect = 14,
}

impl PacketType {
    /// Extracts the packet type from a fixed header byte.
    pub fn from_header(header: u8) -> Result<Self, ProtocolError> {
        Self::try_from(header >> 4).map_err(|_| ProtocolError::UnknownPacketType(header))
    }

    /// Header flags this type must carry, or `None` for PUBLISH whose flags
    /// encode dup/qos/retain.
    pub const fn expected_flags(self) -> Option<u8> {
        match self {
            PacketType::Publish => None,
            PacketType::PubRel | PacketType::Subscribe | PacketType::Unsubscribe => {
                Some(RESERVED_FLAGS_0010)
            }
            _ => Some(0),
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            PacketType::Connect => "CONNECT",
            PacketType::ConnAck => "CONNACK",
            PacketType::Publish => "PUBLISH",
            PacketType::PubAck => "PUBACK",
            PacketType::PubRec => "PUBREC",
            PacketType::PubRel => "PUBREL",
            PacketType::PubComp => "PUBCOMP",
            PacketType::Subscribe => "SUBSCRIBE",
            PacketType::SubAck => "SUBACK",
            PacketType::Unsubscribe => "UNSUBSCRIBE",
            PacketType::UnsubAck => "UNSUBACK",
            PacketType::PingReq => "PINGREQ",
            PacketType::PingResp => "PINGRESP",
            PacketType::Disconnect => "DISCONNECT",
        }
    }
}

impl TryFrom<u8> for PacketType {
    type Error = ();

    /// Converts a type nibble (0–15) into a [`PacketType`].
    fn try_from(value: u8) -> Result<Self, ()> {
        match value {
            1 => Ok(PacketType::Connect),
            2 => Ok(PacketType::ConnAck),
            3 => Ok(PacketType::Publish),
            4 => Ok(PacketType::PubAck),
            5 => Ok(PacketType::PubRec),
            6 => Ok(PacketType::PubRel),
            7 => Ok(PacketType::PubComp),
            8 => Ok(PacketType::Subscribe),
            9 => Ok(PacketType::SubAck),
            10 => Ok(PacketType::Unsubscribe),
            11 => Ok(PacketType::UnsubAck),
            12 => Ok(PacketType::PingReq),
            13 => Ok(PacketType::PingResp),
            14 => Ok(PacketType::Disconnect),
            _ => Err(()),
        }
    }
}

impl fmt::Display for PacketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ── CONNECT ───────────────────────────────────────────────────────────────────

/// CONNECT (1): first packet a client sends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectPacket {
    pub(crate) protocol_level: u8,
    pub(crate) client_id: String,
    pub(crate) clean_session: bool,
    pub(crate) keep_alive: u16,
    pub(crate) username: Option<String>,
    pub(crate) password: Option<String>,
    pub(crate) will: Option<Message>,
}

impl Default for ConnectPacket {
    fn default() -> Self {
        Self {
            protocol_level: PROTOCOL_LEVEL_3_1_1,
            client_id: String::new(),
            clean_session: true,
            keep_alive: crate::domain::connection::DEFAULT_KEEP_ALIVE,
            username: None,
            password: None,
            will: None,
        }
    }
}

impl ConnectPacket {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a CONNECT carrying every field of `connection`.
    ///
    /// Empty username and password are treated as absent.
    pub fn from_connection(connection: &Connection) -> Result<Self, ProtocolError> {
        let mut packet = Self::new();
        packet.set_protocol_level(connection.protocol_level())?;
        packet.set_client_id(connection.client_id())?;
        packet.set_clean_session(connection.is_clean_session());
        packet.set_keep_alive(connection.keep_alive());
        packet.set_username(non_empty(connection.username()))?;
        packet.set_password(non_empty(connection.password()))?;
        packet.set_will(connection.will().cloned())?;
        Ok(packet)
    }

    pub fn protocol_level(&self) -> u8 {
        self.protocol_level
    }

    /// `MQIsdp` for level 3, `MQTT` for level 4.
    pub fn protocol_name(&self) -> &'static str {
        protocol_name_for(self.protocol_level)
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn is_clean_session(&self) -> bool {
        self.clean_session
    }

    pub fn keep_alive(&self) -> u16 {
        self.keep_alive
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    pub fn will(&self) -> Option<&Message> {
        self.will.as_ref()
    }

    pub fn set_protocol_level(&mut self, level: u8) -> Result<(), ProtocolError> {
        if level != PROTOCOL_LEVEL_3_1 && level != PROTOCOL_LEVEL_3_1_1 {
            return Err(ProtocolError::InvalidArgument(format!(
                "unknown protocol level {level}"
            )));
        }
        self.protocol_level = level;
        Ok(())
    }

    /// Sets the client id.  An empty id is replaced by a generated one when
    /// the packet is written.
    pub fn set_client_id(&mut self, client_id: impl Into<String>) -> Result<(), ProtocolError> {
        let client_id = client_id.into();
        validate_string(&client_id, "client id")?;
        self.client_id = client_id;
        Ok(())
    }

    /// Sets the client id, requiring 1–23 ASCII alphanumeric characters.
    pub fn set_strict_client_id(&mut self, client_id: impl Into<String>) -> Result<(), ProtocolError> {
        let client_id = client_id.into();
        validate_strict_client_id(&client_id)?;
        self.client_id = client_id;
        Ok(())
    }

    pub fn set_clean_session(&mut self, clean_session: bool) {
        self.clean_session = clean_session;
    }

    pub fn set_keep_alive(&mut self, keep_alive: u16) {
        self.keep_alive = keep_alive;
    }

    pub fn set_username(&mut self, username: Option<String>) -> Result<(), ProtocolError> {
        if let Some(username) = &username {
            validate_string(username, "username")?;
        }
        self.username = username;
        Ok(())
    }

    pub fn set_password(&mut self, password: Option<String>) -> Result<(), ProtocolError> {
        if let Some(password) = &password {
            validate_string(password, "password")?;
        }
        self.password = password;
        Ok(())
    }

    /// Declares (or clears) the will message.  Its duplicate flag has no
    /// place on the wire and is cleared.
    pub fn set_will(&mut self, will: Option<Message>) -> Result<(), ProtocolError> {
        if let Some(will) = &will {
            validate_topic_name(will.topic())?;
            if will.payload().len() > u16::MAX as usize {
                return Err(ProtocolError::InvalidArgument(format!(
                    "will payload of {} bytes exceeds {}",
                    will.payload().len(),
                    u16::MAX
                )));
            }
        }
        self.will = will.map(|will| will.original());
        Ok(())
    }
}

pub(crate) fn protocol_name_for(level: u8) -> &'static str {
    if level == PROTOCOL_LEVEL_3_1 {
        PROTOCOL_NAME_3_1
    } else {
        PROTOCOL_NAME_3_1_1
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

// ── CONNACK ───────────────────────────────────────────────────────────────────

/// CONNACK (2): the server's answer to CONNECT.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnAckPacket {
    pub session_present: bool,
    pub return_code: u8,
}

impl ConnAckPacket {
    pub fn new(return_code: u8, session_present: bool) -> Self {
        Self {
            session_present,
            return_code,
        }
    }

    pub fn is_success(&self) -> bool {
        self.return_code == 0
    }

    /// Human-readable meaning of the return code.
    pub fn error_name(&self) -> String {
        connect_return_code_name(self.return_code)
    }
}

/// Names the CONNACK return codes of MQTT 3.1.1 table 3.1.
pub fn connect_return_code_name(code: u8) -> String {
    match code {
        0 => "Connection accepted".to_string(),
        1 => "Unacceptable protocol version".to_string(),
        2 => "Identifier rejected".to_string(),
        3 => "Server unavailable".to_string(),
        4 => "Bad user name or password".to_string(),
        5 => "Not authorized".to_string(),
        other => format!("Unknown {other}"),
    }
}

// ── PUBLISH ───────────────────────────────────────────────────────────────────

/// PUBLISH (3): carries an application message.
///
/// A packet identifier is only present on the wire for QoS 1 and 2.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishPacket {
    pub(crate) topic: String,
    pub(crate) payload: Vec<u8>,
    pub(crate) qos: QoS,
    pub(crate) retain: bool,
    pub(crate) duplicate: bool,
    pub(crate) identifier: Option<u16>,
}

impl PublishPacket {
    /// Creates a QoS 0 PUBLISH.
    pub fn new(topic: impl Into<String>, payload: impl Into<Vec<u8>>) -> Result<Self, ProtocolError> {
        let mut packet = Self {
            topic: String::new(),
            payload: payload.into(),
            qos: QoS::AtMostOnce,
            retain: false,
            duplicate: false,
            identifier: None,
        };
        packet.set_topic(topic)?;
        Ok(packet)
    }

    /// Builds a PUBLISH from a message's topic, payload and flags.
    pub fn from_message(message: &Message) -> Result<Self, ProtocolError> {
        let mut packet = Self::new(message.topic(), message.payload())?;
        packet.qos = message.qos();
        packet.retain = message.is_retained();
        packet.duplicate = message.is_duplicate();
        Ok(packet)
    }

    /// Converts the packet back into the message it carries.
    pub fn to_message(&self) -> Message {
        let mut message = Message::new(self.topic.clone(), self.payload.clone()).with_qos(self.qos);
        if self.retain {
            message = message.retained();
        }
        if self.duplicate {
            message = message.duplicate();
        }
        message
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
        self.retain
    }

    pub fn is_duplicate(&self) -> bool {
        self.duplicate
    }

    pub fn identifier(&self) -> Option<u16> {
        self.identifier
    }

    /// Sets the topic.  Wildcards and the empty topic are rejected.
    pub fn set_topic(&mut self, topic: impl Into<String>) -> Result<(), ProtocolError> {
        let topic = topic.into();
        validate_topic_name(&topic)?;
        self.topic = topic;
        Ok(())
    }

    pub fn set_payload(&mut self, payload: impl Into<Vec<u8>>) {
        self.payload = payload.into();
    }

    pub fn set_qos(&mut self, qos: QoS) {
        self.qos = qos;
    }

    /// Sets the QoS from its raw level.
    pub fn set_qos_level(&mut self, level: u8) -> Result<(), ProtocolError> {
        self.qos = QoS::try_from(level)?;
        Ok(())
    }

    pub fn set_retained(&mut self, retain: bool) {
        self.retain = retain;
    }

    pub fn set_duplicate(&mut self, duplicate: bool) {
        self.duplicate = duplicate;
    }

    pub fn set_identifier(&mut self, identifier: u16) {
        self.identifier = Some(identifier);
    }
}

// ── Acknowledgements carrying only a packet identifier ────────────────────────

macro_rules! identifier_packet {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
        pub struct $name {
            /// Generated on first write when `None`.
            pub identifier: Option<u16>,
        }

        impl $name {
            pub fn new(identifier: u16) -> Self {
                Self {
                    identifier: Some(identifier),
                }
            }
        }
    };
}

identifier_packet!(
    /// PUBACK (4): QoS 1 acknowledgement.
    PubAckPacket
);
identifier_packet!(
    /// PUBREC (5): QoS 2 step one, publish received.
    PubRecPacket
);
identifier_packet!(
    /// PUBREL (6): QoS 2 step two, publish release.  Header flags are 0b0010.
    PubRelPacket
);
identifier_packet!(
    /// PUBCOMP (7): QoS 2 step three, publish complete.
    PubCompPacket
);
identifier_packet!(
    /// UNSUBACK (11): acknowledges an UNSUBSCRIBE.
    UnsubAckPacket
);

// ── SUBSCRIBE / SUBACK ────────────────────────────────────────────────────────

/// SUBSCRIBE (8): one or more topic filters with their requested QoS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscribePacket {
    pub(crate) identifier: Option<u16>,
    pub(crate) subscriptions: Vec<Subscription>,
}

impl SubscribePacket {
    /// Creates a SUBSCRIBE.  At least one subscription is required.
    pub fn new(subscriptions: Vec<Subscription>) -> Result<Self, ProtocolError> {
        let mut packet = Self {
            identifier: None,
            subscriptions: Vec::new(),
        };
        packet.set_subscriptions(subscriptions)?;
        Ok(packet)
    }

    pub fn identifier(&self) -> Option<u16> {
        self.identifier
    }

    pub fn subscriptions(&self) -> &[Subscription] {
        &self.subscriptions
    }

    pub fn set_identifier(&mut self, identifier: u16) {
        self.identifier = Some(identifier);
    }

    pub fn set_subscriptions(&mut self, subscriptions: Vec<Subscription>) -> Result<(), ProtocolError> {
        if subscriptions.is_empty() {
            return Err(ProtocolError::InvalidArgument(
                "SUBSCRIBE needs at least one topic filter".to_string(),
            ));
        }
        for subscription in &subscriptions {
            validate_topic_filter(subscription.filter())?;
        }
        self.subscriptions = subscriptions;
        Ok(())
    }
}

/// SUBACK (9): one return code per requested filter, in request order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubAckPacket {
    pub(crate) identifier: Option<u16>,
    pub(crate) return_codes: Vec<u8>,
}

impl SubAckPacket {
    pub fn new(identifier: u16, return_codes: Vec<u8>) -> Result<Self, ProtocolError> {
        let mut packet = Self {
            identifier: Some(identifier),
            return_codes: Vec::new(),
        };
        packet.set_return_codes(return_codes)?;
        Ok(packet)
    }

    pub fn identifier(&self) -> Option<u16> {
        self.identifier
    }

    pub fn return_codes(&self) -> &[u8] {
        &self.return_codes
    }

    pub fn set_identifier(&mut self, identifier: u16) {
        self.identifier = Some(identifier);
    }

    /// Sets the return codes; each must be 0, 1, 2 or [`SUBACK_FAILURE`].
    pub fn set_return_codes(&mut self, return_codes: Vec<u8>) -> Result<(), ProtocolError> {
        if let Some(code) = return_codes.iter().find(|code| !is_valid_suback_code(**code)) {
            return Err(ProtocolError::InvalidArgument(format!(
                "invalid SUBACK return code {code}"
            )));
        }
        self.return_codes = return_codes;
        Ok(())
    }
}

pub(crate) fn is_valid_suback_code(code: u8) -> bool {
    code <= QoS::ExactlyOnce.as_u8() || code == SUBACK_FAILURE
}

// ── UNSUBSCRIBE ───────────────────────────────────────────────────────────────

/// UNSUBSCRIBE (10): one or more topic filters to drop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsubscribePacket {
    pub(crate) identifier: Option<u16>,
    pub(crate) filters: Vec<String>,
}

impl UnsubscribePacket {
    pub fn new(filters: Vec<String>) -> Result<Self, ProtocolError> {
        let mut packet = Self {
            identifier: None,
            filters: Vec::new(),
        };
        packet.set_filters(filters)?;
        Ok(packet)
    }

    pub fn identifier(&self) -> Option<u16> {
        self.identifier
    }

    pub fn filters(&self) -> &[String] {
        &self.filters
    }

    pub fn set_identifier(&mut self, identifier: u16) {
        self.identifier = Some(identifier);
    }

    pub fn set_filters(&mut self, filters: Vec<String>) -> Result<(), ProtocolError> {
        if filters.is_empty() {
            return Err(ProtocolError::InvalidArgument(
                "UNSUBSCRIBE needs at least one topic filter".to_string(),
            ));
        }
        for filter in &filters {
            validate_topic_filter(filter)?;
        }
        self.filters = filters;
        Ok(())
    }
}

// ── Packet ────────────────────────────────────────────────────────────────────

/// Top-level enum covering every MQTT 3.1.1 control packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Packet {
    Connect(ConnectPacket),
    ConnAck(ConnAckPacket),
    Publish(PublishPacket),
    PubAck(PubAckPacket),
    PubRec(PubRecPacket),
    PubRel(PubRelPacket),
    PubComp(PubCompPacket),
    Subscribe(SubscribePacket),
    SubAck(SubAckPacket),
    Unsubscribe(UnsubscribePacket),
    UnsubAck(UnsubAckPacket),
    PingReq,
    PingResp,
    Disconnect,
}

impl Packet {
    pub fn packet_type(&self) -> PacketType {
        match self {
            Packet::Connect(_) => PacketType::Connect,
            Packet::ConnAck(_) => PacketType::ConnAck,
            Packet::Publish(_) => PacketType::Publish,
            Packet::PubAck(_) => PacketType::PubAck,
            Packet::PubRec(_) => PacketType::PubRec,
            Packet::PubRel(_) => PacketType::PubRel,
            Packet::PubComp(_) => PacketType::PubComp,
            Packet::Subscribe(_) => PacketType::Subscribe,
            Packet::SubAck(_) => PacketType::SubAck,
            Packet::Unsubscribe(_) => PacketType::Unsubscribe,
            Packet::UnsubAck(_) => PacketType::UnsubAck,
            Packet::PingReq => PacketType::PingReq,
            Packet::PingResp => PacketType::PingResp,
            Packet::Disconnect => PacketType::Disconnect,
        }
    }

    /// Packet identifier, for the types that carry one and have it set.
    pub fn identifier(&self) -> Option<u16> {
        match self {
            Packet::Publish(p) => p.identifier,
            Packet::PubAck(p) => p.identifier,
            Packet::PubRec(p) => p.identifier,
            Packet::PubRel(p) => p.identifier,
            Packet::PubComp(p) => p.identifier,
            Packet::Subscribe(p) => p.identifier,
            Packet::SubAck(p) => p.identifier,
            Packet::Unsubscribe(p) => p.identifier,
            Packet::UnsubAck(p) => p.identifier,
            Packet::Connect(_)
            | Packet::ConnAck(_)
            | Packet::PingReq
            | Packet::PingResp
            | Packet::Disconnect => None,
        }
    }
}

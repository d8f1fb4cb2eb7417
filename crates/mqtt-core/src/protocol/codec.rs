//! Binary codec for MQTT 3.1/3.1.1 control packets.
//!
//! Wire format:
//! ```text
//! [type:4|flags:4][remaining_length:1-4][body:remaining_length]
//! ```
//! All multi-byte integers are big-endian; all strings are a 2-byte length
//! followed by UTF-8 bytes.
//!
//! Decoding reads the fixed header, waits until the whole body is buffered,
//! then decodes the body from its own bounded cursor.  Running off the end
//! of that body is therefore a [`ProtocolError::MalformedPacket`], never an
//! [`ProtocolError::EndOfStream`]: the latter only means "the frame is not
//! complete yet".

use std::sync::Arc;

use thiserror::Error;

use crate::domain::{Message, QoS, Subscription, PROTOCOL_LEVEL_3_1, PROTOCOL_LEVEL_3_1_1};
use crate::protocol::config::CodecConfig;
use crate::protocol::cursor::{ByteCursor, MAX_STRING_LENGTH};
use crate::protocol::identifier::{
    ClientIdentifierGenerator, DefaultClientIdentifierGenerator, PacketIdentifierGenerator,
    SequentialPacketIdentifierGenerator, MAX_CLIENT_ID_LENGTH,
};
use crate::protocol::packets::{
    is_valid_suback_code, protocol_name_for, ConnAckPacket, ConnectPacket, Packet, PacketType,
    PubAckPacket, PubCompPacket, PubRecPacket, PubRelPacket, PublishPacket, SubAckPacket,
    SubscribePacket, UnsubAckPacket, UnsubscribePacket,
};

/// Errors raised while reading or writing packets.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProtocolError {
    /// Not enough bytes are buffered yet.  Retry once more data arrives.
    #[error("end of stream: more data needed")]
    EndOfStream,

    /// The bytes violate MQTT framing, flags, lengths, string encoding, or
    /// value ranges.  The packet cannot be recovered.
    #[error("malformed packet: {0}")]
    MalformedPacket(String),

    /// The type nibble of the header byte is 0 or 15.  Holds the full byte.
    #[error("unknown packet type in header byte 0x{0:02X}")]
    UnknownPacketType(u8),

    /// A caller passed a value outside its allowed range.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl ProtocolError {
    /// Re-labels a validation failure found while decoding as malformed input.
    pub(crate) fn into_malformed(self) -> Self {
        match self {
            ProtocolError::InvalidArgument(reason) => ProtocolError::MalformedPacket(reason),
            ProtocolError::EndOfStream => {
                ProtocolError::MalformedPacket("packet body ended unexpectedly".to_string())
            }
            other => other,
        }
    }
}

// CONNECT flag bits (MQTT 3.1.1 section 3.1.2.3).
const CONNECT_RESERVED: u8 = 0x01;
const CONNECT_CLEAN_SESSION: u8 = 0x02;
const CONNECT_WILL: u8 = 0x04;
const CONNECT_WILL_QOS_SHIFT: u8 = 3;
const CONNECT_WILL_QOS_MASK: u8 = 0x18;
const CONNECT_WILL_RETAIN: u8 = 0x20;
const CONNECT_PASSWORD: u8 = 0x40;
const CONNECT_USERNAME: u8 = 0x80;

// PUBLISH header flag bits.
const PUBLISH_DUPLICATE: u8 = 0x08;
const PUBLISH_QOS_SHIFT: u8 = 1;
const PUBLISH_RETAIN: u8 = 0x01;

// ── Public API ────────────────────────────────────────────────────────────────

/// Reads and writes packets using a decoder configuration and a packet
/// identifier generator.
///
/// # Examples
///
/// ```rust
/// use mqtt_core::protocol::{Packet, PacketCodec};
///
/// let codec = PacketCodec::default();
/// let bytes = codec.encode(&mut Packet::PingReq).unwrap();
/// assert_eq!(bytes, vec![0xC0, 0x00]);
/// let (decoded, consumed) = codec.decode(&bytes).unwrap();
/// assert_eq!(decoded, Packet::PingReq);
/// assert_eq!(consumed, 2);
/// ```
#[derive(Clone)]
pub struct PacketCodec {
    config: CodecConfig,
    identifiers: Arc<dyn PacketIdentifierGenerator>,
}

impl Default for PacketCodec {
    fn default() -> Self {
        Self::new(
            CodecConfig::default(),
            Arc::new(SequentialPacketIdentifierGenerator::new()),
        )
    }
}

impl std::fmt::Debug for PacketCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PacketCodec")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl PacketCodec {
    pub fn new(config: CodecConfig, identifiers: Arc<dyn PacketIdentifierGenerator>) -> Self {
        Self { config, identifiers }
    }

    /// Uses `config` with a fresh sequential identifier generator.
    pub fn with_config(config: CodecConfig) -> Self {
        Self::new(config, Arc::new(SequentialPacketIdentifierGenerator::new()))
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Decodes one packet starting at the cursor position.
    ///
    /// On [`ProtocolError::EndOfStream`] the position is restored to where
    /// it was.  On [`ProtocolError::MalformedPacket`] it is left after the
    /// last byte that belongs to the bad packet: the end of the declared
    /// frame if the header was readable, otherwise just past the bytes read
    /// for the header.  A frame longer than the configured maximum is
    /// rejected before its body arrives, so the position stays right after
    /// its length field.
    pub fn read(&self, cursor: &mut ByteCursor) -> Result<Packet, ProtocolError> {
        let start = cursor.position();
        let result = self.read_frame(cursor);
        if result == Err(ProtocolError::EndOfStream) {
            cursor.set_position(start);
        }
        result
    }

    /// Appends the encoding of `packet` to the cursor.
    ///
    /// Missing packet identifiers are generated and stored on the packet;
    /// an empty CONNECT client id is replaced by a generated one.
    pub fn write(&self, packet: &mut Packet, cursor: &mut ByteCursor) -> Result<(), ProtocolError> {
        let mut body = ByteCursor::new();
        let flags = match packet {
            Packet::Connect(p) => {
                write_connect(&mut body, p)?;
                0
            }
            Packet::ConnAck(p) => {
                write_connack(&mut body, p);
                0
            }
            Packet::Publish(p) => {
                write_publish(&mut body, p, self.identifiers.as_ref())?;
                publish_flags(p)
            }
            Packet::Subscribe(p) => {
                write_subscribe(&mut body, p, self.identifiers.as_ref())?;
                0
            }
            Packet::SubAck(p) => {
                write_suback(&mut body, p, self.identifiers.as_ref())?;
                0
            }
            Packet::Unsubscribe(p) => {
                write_unsubscribe(&mut body, p, self.identifiers.as_ref())?;
                0
            }
            Packet::PubAck(PubAckPacket { identifier })
            | Packet::PubRec(PubRecPacket { identifier })
            | Packet::PubRel(PubRelPacket { identifier })
            | Packet::PubComp(PubCompPacket { identifier })
            | Packet::UnsubAck(UnsubAckPacket { identifier }) => {
                body.write_word(resolve_identifier(identifier, self.identifiers.as_ref()));
                0
            }
            Packet::PingReq | Packet::PingResp | Packet::Disconnect => 0,
        };

        let packet_type = packet.packet_type();
        let flags = packet_type.expected_flags().unwrap_or(flags);
        let remaining_length = u32::try_from(body.len()).map_err(|_| {
            ProtocolError::InvalidArgument(format!("{packet_type} body of {} bytes is too large", body.len()))
        })?;

        let mut header = ByteCursor::with_capacity(5);
        header.write_byte(((packet_type as u8) << 4) | flags);
        header.write_remaining_length(remaining_length)?;
        cursor.write_bytes(header.as_slice());
        cursor.write_bytes(body.as_slice());
        Ok(())
    }

    /// Encodes a single packet into a new byte vector.
    pub fn encode(&self, packet: &mut Packet) -> Result<Vec<u8>, ProtocolError> {
        let mut cursor = ByteCursor::new();
        self.write(packet, &mut cursor)?;
        Ok(cursor.into_inner())
    }

    /// Decodes one packet from the beginning of `bytes`.
    ///
    /// Returns the packet and the number of bytes it occupied.
    pub fn decode(&self, bytes: &[u8]) -> Result<(Packet, usize), ProtocolError> {
        let mut cursor = ByteCursor::from(bytes);
        let packet = self.read(&mut cursor)?;
        Ok((packet, cursor.position()))
    }

    /// Body length declared by the fixed header at the start of `bytes`,
    /// if it exceeds the configured maximum.
    pub(crate) fn oversized_body_length(&self, bytes: &[u8]) -> Option<u32> {
        let mut cursor = ByteCursor::from(bytes);
        PacketType::from_header(cursor.read_byte().ok()?).ok()?;
        let length = cursor.read_remaining_length().ok()?;
        (length > self.config.effective_max_remaining_length()).then_some(length)
    }

    fn read_frame(&self, cursor: &mut ByteCursor) -> Result<Packet, ProtocolError> {
        let header = cursor.read_byte()?;
        let packet_type = PacketType::from_header(header)?;
        let flags = header & 0x0F;

        let remaining_length = cursor.read_remaining_length()?;
        if remaining_length > self.config.effective_max_remaining_length() {
            return Err(ProtocolError::MalformedPacket(format!(
                "remaining length {remaining_length} exceeds the configured maximum of {}",
                self.config.effective_max_remaining_length()
            )));
        }

        let mut body = ByteCursor::from(cursor.read_bytes(remaining_length as usize)?);
        let packet = self
            .read_body(packet_type, flags, &mut body)
            .map_err(ProtocolError::into_malformed)?;
        if body.remaining() > 0 {
            return Err(ProtocolError::MalformedPacket(format!(
                "{packet_type} has {} unexpected trailing bytes",
                body.remaining()
            )));
        }
        Ok(packet)
    }

    fn read_body(
        &self,
        packet_type: PacketType,
        flags: u8,
        body: &mut ByteCursor,
    ) -> Result<Packet, ProtocolError> {
        assert_packet_flags(packet_type, flags)?;
        match packet_type {
            PacketType::Connect => read_connect(body, &self.config).map(Packet::Connect),
            PacketType::ConnAck => read_connack(body).map(Packet::ConnAck),
            PacketType::Publish => read_publish(body, flags).map(Packet::Publish),
            PacketType::PubAck => {
                read_identifier_only(body, packet_type).map(|identifier| Packet::PubAck(PubAckPacket { identifier }))
            }
            PacketType::PubRec => {
                read_identifier_only(body, packet_type).map(|identifier| Packet::PubRec(PubRecPacket { identifier }))
            }
            PacketType::PubRel => {
                read_identifier_only(body, packet_type).map(|identifier| Packet::PubRel(PubRelPacket { identifier }))
            }
            PacketType::PubComp => {
                read_identifier_only(body, packet_type).map(|identifier| Packet::PubComp(PubCompPacket { identifier }))
            }
            PacketType::Subscribe => read_subscribe(body).map(Packet::Subscribe),
            PacketType::SubAck => read_suback(body).map(Packet::SubAck),
            PacketType::Unsubscribe => read_unsubscribe(body).map(Packet::Unsubscribe),
            PacketType::UnsubAck => {
                read_identifier_only(body, packet_type).map(|identifier| Packet::UnsubAck(UnsubAckPacket { identifier }))
            }
            PacketType::PingReq => read_empty(body, packet_type).map(|()| Packet::PingReq),
            PacketType::PingResp => read_empty(body, packet_type).map(|()| Packet::PingResp),
            PacketType::Disconnect => read_empty(body, packet_type).map(|()| Packet::Disconnect),
        }
    }
}

// ── Shared assertions ─────────────────────────────────────────────────────────

fn assert_packet_flags(packet_type: PacketType, flags: u8) -> Result<(), ProtocolError> {
    match packet_type.expected_flags() {
        Some(expected) if expected != flags => Err(ProtocolError::MalformedPacket(format!(
            "{packet_type} requires header flags 0x{expected:X}, got 0x{flags:X}"
        ))),
        _ => Ok(()),
    }
}

/// Remaining-length expectation of a packet body.
enum ExpectedLength {
    Positive,
    Exactly(usize),
}

fn assert_remaining_length(
    body: &ByteCursor,
    packet_type: PacketType,
    expected: ExpectedLength,
) -> Result<(), ProtocolError> {
    let actual = body.remaining();
    match expected {
        ExpectedLength::Positive if actual == 0 => Err(ProtocolError::MalformedPacket(format!(
            "{packet_type} requires a non-empty body"
        ))),
        ExpectedLength::Exactly(len) if actual != len => Err(ProtocolError::MalformedPacket(format!(
            "{packet_type} requires a remaining length of {len}, got {actual}"
        ))),
        _ => Ok(()),
    }
}

fn read_packet_identifier(body: &mut ByteCursor, packet_type: PacketType) -> Result<u16, ProtocolError> {
    let identifier = body.read_word()?;
    if identifier == 0 {
        return Err(ProtocolError::MalformedPacket(format!(
            "{packet_type} carries packet identifier 0"
        )));
    }
    Ok(identifier)
}

fn resolve_identifier(slot: &mut Option<u16>, identifiers: &dyn PacketIdentifierGenerator) -> u16 {
    *slot.get_or_insert_with(|| identifiers.generate())
}

// ── String and topic validation ───────────────────────────────────────────────

/// Checks a textual field: at most 65535 bytes and no embedded NUL.
///
/// A `&str` is always well-formed UTF-8 without lone surrogates, so those
/// properties are guaranteed by the type and by the cursor's decoding.
pub fn validate_string(value: &str, what: &str) -> Result<(), ProtocolError> {
    if value.len() > MAX_STRING_LENGTH {
        return Err(ProtocolError::InvalidArgument(format!(
            "{what} of {} bytes exceeds {MAX_STRING_LENGTH}",
            value.len()
        )));
    }
    if value.contains('\0') {
        return Err(ProtocolError::InvalidArgument(format!(
            "{what} contains a NUL character"
        )));
    }
    Ok(())
}

/// Checks a topic used for publishing: non-empty and free of `+` and `#`.
pub fn validate_topic_name(topic: &str) -> Result<(), ProtocolError> {
    validate_string(topic, "topic")?;
    if topic.is_empty() {
        return Err(ProtocolError::InvalidArgument("topic must not be empty".to_string()));
    }
    if topic.contains(['+', '#']) {
        return Err(ProtocolError::InvalidArgument(format!(
            "topic {topic:?} must not contain wildcards"
        )));
    }
    Ok(())
}

/// Checks a subscription filter: non-empty, `#` only as the whole last
/// level, `+` only as a whole level.
pub fn validate_topic_filter(filter: &str) -> Result<(), ProtocolError> {
    validate_string(filter, "topic filter")?;
    if filter.is_empty() {
        return Err(ProtocolError::InvalidArgument(
            "topic filter must not be empty".to_string(),
        ));
    }
    let levels: Vec<&str> = filter.split('/').collect();
    for (index, level) in levels.iter().enumerate() {
        let is_last = index + 1 == levels.len();
        if level.contains('#') && (*level != "#" || !is_last) {
            return Err(ProtocolError::InvalidArgument(format!(
                "topic filter {filter:?} uses '#' outside the last level"
            )));
        }
        if level.contains('+') && *level != "+" {
            return Err(ProtocolError::InvalidArgument(format!(
                "topic filter {filter:?} uses '+' inside a level"
            )));
        }
    }
    Ok(())
}

/// Checks a client id against the MQTT 3.1 rule: 1–23 ASCII alphanumerics.
pub fn validate_strict_client_id(client_id: &str) -> Result<(), ProtocolError> {
    if client_id.is_empty() || client_id.len() > MAX_CLIENT_ID_LENGTH {
        return Err(ProtocolError::InvalidArgument(format!(
            "client id must be 1 to {MAX_CLIENT_ID_LENGTH} characters, got {}",
            client_id.len()
        )));
    }
    if !client_id.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ProtocolError::InvalidArgument(format!(
            "client id {client_id:?} must be alphanumeric"
        )));
    }
    Ok(())
}

// ── Per-packet encode helpers ─────────────────────────────────────────────────

fn write_connect(body: &mut ByteCursor, p: &mut ConnectPacket) -> Result<(), ProtocolError> {
    if p.client_id.is_empty() {
        p.client_id = DefaultClientIdentifierGenerator.generate();
    }
    validate_string(&p.client_id, "client id")?;

    let mut flags = 0u8;
    if p.clean_session {
        flags |= CONNECT_CLEAN_SESSION;
    }
    if let Some(will) = &p.will {
        validate_topic_name(will.topic())?;
        flags |= CONNECT_WILL | (will.qos().as_u8() << CONNECT_WILL_QOS_SHIFT);
        if will.is_retained() {
            flags |= CONNECT_WILL_RETAIN;
        }
    }
    if p.username.is_some() {
        flags |= CONNECT_USERNAME;
    }
    if p.password.is_some() {
        flags |= CONNECT_PASSWORD;
    }

    body.write_length_prefixed_string(protocol_name_for(p.protocol_level))?;
    body.write_byte(p.protocol_level);
    body.write_byte(flags);
    body.write_word(p.keep_alive);
    body.write_length_prefixed_string(&p.client_id)?;
    if let Some(will) = &p.will {
        body.write_length_prefixed_string(will.topic())?;
        body.write_length_prefixed_bytes(will.payload())?;
    }
    if let Some(username) = &p.username {
        validate_string(username, "username")?;
        body.write_length_prefixed_string(username)?;
    }
    if let Some(password) = &p.password {
        validate_string(password, "password")?;
        body.write_length_prefixed_string(password)?;
    }
    Ok(())
}

fn write_connack(body: &mut ByteCursor, p: &ConnAckPacket) {
    body.write_byte(u8::from(p.session_present));
    body.write_byte(p.return_code);
}

fn publish_flags(p: &PublishPacket) -> u8 {
    let mut flags = p.qos.as_u8() << PUBLISH_QOS_SHIFT;
    if p.duplicate {
        flags |= PUBLISH_DUPLICATE;
    }
    if p.retain {
        flags |= PUBLISH_RETAIN;
    }
    flags
}

fn write_publish(
    body: &mut ByteCursor,
    p: &mut PublishPacket,
    identifiers: &dyn PacketIdentifierGenerator,
) -> Result<(), ProtocolError> {
    validate_topic_name(&p.topic)?;
    body.write_length_prefixed_string(&p.topic)?;
    if p.qos > QoS::AtMostOnce {
        body.write_word(resolve_identifier(&mut p.identifier, identifiers));
    }
    body.write_bytes(&p.payload);
    Ok(())
}

fn write_subscribe(
    body: &mut ByteCursor,
    p: &mut SubscribePacket,
    identifiers: &dyn PacketIdentifierGenerator,
) -> Result<(), ProtocolError> {
    if p.subscriptions.is_empty() {
        return Err(ProtocolError::InvalidArgument(
            "SUBSCRIBE needs at least one topic filter".to_string(),
        ));
    }
    body.write_word(resolve_identifier(&mut p.identifier, identifiers));
    for subscription in &p.subscriptions {
        validate_topic_filter(subscription.filter())?;
        body.write_length_prefixed_string(subscription.filter())?;
        body.write_byte(subscription.qos().as_u8());
    }
    Ok(())
}

fn write_suback(
    body: &mut ByteCursor,
    p: &mut SubAckPacket,
    identifiers: &dyn PacketIdentifierGenerator,
) -> Result<(), ProtocolError> {
    if p.return_codes.is_empty() {
        return Err(ProtocolError::InvalidArgument(
            "SUBACK needs at least one return code".to_string(),
        ));
    }
    body.write_word(resolve_identifier(&mut p.identifier, identifiers));
    body.write_bytes(&p.return_codes);
    Ok(())
}

fn write_unsubscribe(
    body: &mut ByteCursor,
    p: &mut UnsubscribePacket,
    identifiers: &dyn PacketIdentifierGenerator,
) -> Result<(), ProtocolError> {
    if p.filters.is_empty() {
        return Err(ProtocolError::InvalidArgument(
            "UNSUBSCRIBE needs at least one topic filter".to_string(),
        ));
    }
    body.write_word(resolve_identifier(&mut p.identifier, identifiers));
    for filter in &p.filters {
        validate_topic_filter(filter)?;
        body.write_length_prefixed_string(filter)?;
    }
    Ok(())
}

// ── Per-packet decode helpers ─────────────────────────────────────────────────

fn read_connect(body: &mut ByteCursor, config: &CodecConfig) -> Result<ConnectPacket, ProtocolError> {
    assert_remaining_length(body, PacketType::Connect, ExpectedLength::Positive)?;

    let protocol_name = body.read_length_prefixed_string()?;
    let protocol_level = body.read_byte()?;
    if protocol_level != PROTOCOL_LEVEL_3_1 && protocol_level != PROTOCOL_LEVEL_3_1_1 {
        return Err(ProtocolError::MalformedPacket(format!(
            "unsupported protocol level {protocol_level}"
        )));
    }
    let expected_name = protocol_name_for(protocol_level);
    if protocol_name != expected_name {
        return Err(ProtocolError::MalformedPacket(format!(
            "protocol level {protocol_level} requires protocol name {expected_name:?}, got {protocol_name:?}"
        )));
    }

    let flags = body.read_byte()?;
    if flags & CONNECT_RESERVED != 0 {
        return Err(ProtocolError::MalformedPacket(
            "reserved CONNECT flag is set".to_string(),
        ));
    }
    let has_will = flags & CONNECT_WILL != 0;
    if !has_will && flags & (CONNECT_WILL_QOS_MASK | CONNECT_WILL_RETAIN) != 0 {
        return Err(ProtocolError::MalformedPacket(
            "will QoS or retain set without a will".to_string(),
        ));
    }

    let keep_alive = body.read_word()?;
    let client_id = body.read_length_prefixed_string()?;
    validate_string(&client_id, "client id")?;
    if config.strict_client_id {
        validate_strict_client_id(&client_id)?;
    }

    let will = if has_will {
        let qos = QoS::try_from((flags & CONNECT_WILL_QOS_MASK) >> CONNECT_WILL_QOS_SHIFT)?;
        let topic = body.read_length_prefixed_string()?;
        validate_topic_name(&topic)?;
        let payload = body.read_length_prefixed_bytes()?;
        let mut will = Message::new(topic, payload).with_qos(qos);
        if flags & CONNECT_WILL_RETAIN != 0 {
            will = will.retained();
        }
        Some(will)
    } else {
        None
    };

    let username = if flags & CONNECT_USERNAME != 0 {
        let username = body.read_length_prefixed_string()?;
        validate_string(&username, "username")?;
        Some(username)
    } else {
        None
    };
    let password = if flags & CONNECT_PASSWORD != 0 {
        let password = body.read_length_prefixed_string()?;
        validate_string(&password, "password")?;
        Some(password)
    } else {
        None
    };

    Ok(ConnectPacket {
        protocol_level,
        client_id,
        clean_session: flags & CONNECT_CLEAN_SESSION != 0,
        keep_alive,
        username,
        password,
        will,
    })
}

fn read_connack(body: &mut ByteCursor) -> Result<ConnAckPacket, ProtocolError> {
    assert_remaining_length(body, PacketType::ConnAck, ExpectedLength::Exactly(2))?;
    let acknowledge_flags = body.read_byte()?;
    if acknowledge_flags & 0xFE != 0 {
        return Err(ProtocolError::MalformedPacket(format!(
            "reserved CONNACK flags set: 0x{acknowledge_flags:02X}"
        )));
    }
    let return_code = body.read_byte()?;
    Ok(ConnAckPacket {
        session_present: acknowledge_flags & 0x01 != 0,
        return_code,
    })
}

fn read_publish(body: &mut ByteCursor, flags: u8) -> Result<PublishPacket, ProtocolError> {
    assert_remaining_length(body, PacketType::Publish, ExpectedLength::Positive)?;

    let qos = QoS::try_from((flags >> PUBLISH_QOS_SHIFT) & 0x03)?;
    let topic = body.read_length_prefixed_string()?;
    validate_topic_name(&topic)?;
    let identifier = if qos > QoS::AtMostOnce {
        Some(read_packet_identifier(body, PacketType::Publish)?)
    } else {
        None
    };
    let payload = body.read_bytes(body.remaining())?.to_vec();

    Ok(PublishPacket {
        topic,
        payload,
        qos,
        retain: flags & PUBLISH_RETAIN != 0,
        duplicate: flags & PUBLISH_DUPLICATE != 0,
        identifier,
    })
}

fn read_identifier_only(body: &mut ByteCursor, packet_type: PacketType) -> Result<Option<u16>, ProtocolError> {
    assert_remaining_length(body, packet_type, ExpectedLength::Exactly(2))?;
    read_packet_identifier(body, packet_type).map(Some)
}

fn read_subscribe(body: &mut ByteCursor) -> Result<SubscribePacket, ProtocolError> {
    assert_remaining_length(body, PacketType::Subscribe, ExpectedLength::Positive)?;
    let identifier = read_packet_identifier(body, PacketType::Subscribe)?;

    let mut subscriptions = Vec::new();
    while body.remaining() > 0 {
        let filter = body.read_length_prefixed_string()?;
        validate_topic_filter(&filter)?;
        let qos = QoS::try_from(body.read_byte()?)?;
        subscriptions.push(Subscription::new(filter, qos));
    }
    if subscriptions.is_empty() {
        return Err(ProtocolError::MalformedPacket(
            "SUBSCRIBE without topic filters".to_string(),
        ));
    }

    Ok(SubscribePacket {
        identifier: Some(identifier),
        subscriptions,
    })
}

fn read_suback(body: &mut ByteCursor) -> Result<SubAckPacket, ProtocolError> {
    assert_remaining_length(body, PacketType::SubAck, ExpectedLength::Positive)?;
    let identifier = read_packet_identifier(body, PacketType::SubAck)?;

    let return_codes = body.read_bytes(body.remaining())?.to_vec();
    if return_codes.is_empty() {
        return Err(ProtocolError::MalformedPacket(
            "SUBACK without return codes".to_string(),
        ));
    }
    if let Some(code) = return_codes.iter().find(|code| !is_valid_suback_code(**code)) {
        return Err(ProtocolError::MalformedPacket(format!(
            "invalid SUBACK return code {code}"
        )));
    }

    Ok(SubAckPacket {
        identifier: Some(identifier),
        return_codes,
    })
}

fn read_unsubscribe(body: &mut ByteCursor) -> Result<UnsubscribePacket, ProtocolError> {
    assert_remaining_length(body, PacketType::Unsubscribe, ExpectedLength::Positive)?;
    // Identifier 0 is tolerated here for legacy 3.1 clients.
    let identifier = body.read_word()?;

    let mut filters = Vec::new();
    while body.remaining() > 0 {
        let filter = body.read_length_prefixed_string()?;
        validate_topic_filter(&filter)?;
        filters.push(filter);
    }
    if filters.is_empty() {
        return Err(ProtocolError::MalformedPacket(
            "UNSUBSCRIBE without topic filters".to_string(),
        ));
    }

    Ok(UnsubscribePacket {
        identifier: Some(identifier),
        filters,
    })
}

fn read_empty(body: &mut ByteCursor, packet_type: PacketType) -> Result<(), ProtocolError> {
    assert_remaining_length(body, packet_type, ExpectedLength::Exactly(0))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

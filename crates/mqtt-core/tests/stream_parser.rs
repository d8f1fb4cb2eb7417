//! Integration tests for the stream parser: fragmentation, coalescing and
//! recovery from bad input.

use std::sync::{Arc, Mutex};

use mqtt_core::protocol::{
    CodecConfig, ConnectPacket, Packet, PacketCodec, PubRelPacket, PublishPacket, StreamParser,
    SubAckPacket,
};
use mqtt_core::{Message, ProtocolError, QoS};

/// A realistic mix of packets encoded back to back.
fn sample_stream() -> (Vec<Packet>, Vec<u8>) {
    let codec = PacketCodec::default();

    let mut connect = ConnectPacket::new();
    connect.set_client_id("stream-test").unwrap();
    connect
        .set_will(Some(Message::new("wills/stream-test", "offline")))
        .unwrap();

    let mut publish = PublishPacket::new("a/b", vec![1u8; 300]).unwrap();
    publish.set_qos(QoS::AtLeastOnce);
    publish.set_identifier(77);

    let mut packets = vec![
        Packet::Connect(connect),
        Packet::Publish(publish),
        Packet::PubRel(PubRelPacket::new(77)),
        Packet::SubAck(SubAckPacket::new(3, vec![0, 1, 0x80]).unwrap()),
        Packet::PingReq,
        Packet::Disconnect,
    ];
    let mut bytes = Vec::new();
    for packet in &mut packets {
        bytes.extend(codec.encode(packet).unwrap());
    }
    (packets, bytes)
}

fn recording_parser(parser: StreamParser) -> (StreamParser, Arc<Mutex<Vec<ProtocolError>>>) {
    let errors = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&errors);
    let parser = parser.on_error(move |e| sink.lock().unwrap().push(e.clone()));
    (parser, errors)
}

#[test]
fn test_whole_stream_in_one_push() {
    let (expected, bytes) = sample_stream();
    let mut parser = StreamParser::new();

    assert_eq!(parser.push(&bytes), expected);
    assert_eq!(parser.buffered(), 0);
}

#[test]
fn test_every_chunk_size_yields_the_same_packets() {
    let (expected, bytes) = sample_stream();

    for chunk_size in 1..=bytes.len() {
        let mut parser = StreamParser::new();
        let decoded: Vec<Packet> = bytes
            .chunks(chunk_size)
            .flat_map(|chunk| parser.push(chunk))
            .collect();
        assert_eq!(decoded, expected, "chunk size {chunk_size}");
        assert_eq!(parser.buffered(), 0);
    }
}

#[test]
fn test_every_split_point_yields_the_same_packets() {
    let (expected, bytes) = sample_stream();

    for split in 1..bytes.len() {
        let mut parser = StreamParser::new();
        let mut decoded = parser.push(&bytes[..split]);
        decoded.extend(parser.push(&bytes[split..]));
        assert_eq!(decoded, expected, "split at {split}");
    }
}

#[test]
fn test_empty_push_returns_nothing() {
    let mut parser = StreamParser::new();
    assert!(parser.push(&[]).is_empty());
    assert_eq!(parser.buffered(), 0);
}

#[test]
fn test_garbage_between_packets_does_not_desynchronise() {
    // Arrange
    let (expected, bytes) = sample_stream();
    let (mut parser, errors) = recording_parser(StreamParser::new());
    let mut noisy = vec![0x00, 0xF0];
    noisy.extend_from_slice(&bytes);
    noisy.extend_from_slice(&[0xF3, 0x00]);

    // Act
    let decoded = parser.push(&noisy);

    // Assert – each stray byte is reported exactly once
    assert_eq!(decoded, expected);
    assert_eq!(
        *errors.lock().unwrap(),
        vec![
            ProtocolError::UnknownPacketType(0x00),
            ProtocolError::UnknownPacketType(0xF0),
            ProtocolError::UnknownPacketType(0xF3),
            ProtocolError::UnknownPacketType(0x00),
        ]
    );
}

#[test]
fn test_malformed_packet_is_reported_and_skipped() {
    let (mut parser, errors) = recording_parser(StreamParser::new());

    // PUBLISH at QoS 1 with identifier 0, followed by PINGRESP.
    let packets = parser.push(&[0x32, 0x05, 0x00, 0x01, b'a', 0x00, 0x00, 0xD0, 0x00]);

    assert_eq!(packets, vec![Packet::PingResp]);
    let errors = errors.lock().unwrap();
    assert_eq!(errors.len(), 1);
    assert!(matches!(errors[0], ProtocolError::MalformedPacket(_)));
}

#[test]
fn test_strict_parser_rejects_non_alphanumeric_client_id() {
    let (mut parser, errors) =
        recording_parser(StreamParser::with_codec(PacketCodec::with_config(CodecConfig::strict())));

    let mut connect = ConnectPacket::new();
    connect.set_client_id("has-dash").unwrap();
    let bytes = PacketCodec::default()
        .encode(&mut Packet::Connect(connect))
        .unwrap();

    assert!(parser.push(&bytes).is_empty());
    assert_eq!(errors.lock().unwrap().len(), 1);
}

#[test]
fn test_oversized_packet_is_skipped_without_surfacing_its_payload() {
    // Arrange – a PUBLISH whose payload is itself an encoded PUBLISH and a
    // DISCONNECT, followed by a real PINGREQ
    let codec = PacketCodec::default();
    let mut inner = Packet::Publish(PublishPacket::new("x", b"hidden".to_vec()).unwrap());
    let mut payload = codec.encode(&mut inner).unwrap();
    payload.extend_from_slice(&[0xE0, 0x00]);
    let mut outer = Packet::Publish(PublishPacket::new("carrier", payload).unwrap());
    let mut bytes = codec.encode(&mut outer).unwrap();
    bytes.extend_from_slice(&[0xC0, 0x00]);

    let config = CodecConfig {
        max_remaining_length: 16,
        ..CodecConfig::default()
    };

    for chunk_size in [1, 3, bytes.len()] {
        let (mut parser, errors) =
            recording_parser(StreamParser::with_codec(PacketCodec::with_config(config)));

        // Act
        let packets: Vec<Packet> = bytes.chunks(chunk_size).flat_map(|c| parser.push(c)).collect();

        // Assert
        assert_eq!(packets, vec![Packet::PingReq], "chunk size {chunk_size}");
        let errors = errors.lock().unwrap();
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], ProtocolError::MalformedPacket(_)));
    }
}

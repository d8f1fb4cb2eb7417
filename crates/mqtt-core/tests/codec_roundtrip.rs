//! Integration tests for the mqtt-core packet codec.
//!
//! These tests verify complete round-trip encoding and decoding of every
//! packet type through the public API, with every combination of optional
//! CONNECT fields and every QoS level.

use std::sync::Arc;

use mqtt_core::protocol::{
    ByteCursor, CodecConfig, ConnAckPacket, ConnectPacket, Packet, PacketCodec, PubAckPacket,
    PubCompPacket, PubRecPacket, PubRelPacket, PublishPacket, SequentialPacketIdentifierGenerator,
    SubAckPacket, SubscribePacket, UnsubAckPacket, UnsubscribePacket, SUBACK_FAILURE,
};
use mqtt_core::{Message, ProtocolError, QoS, Subscription};

/// Encodes a packet, decodes it, and checks that the result is identical and
/// re-encodes to the same bytes.
fn roundtrip(packet: Packet) -> Packet {
    let codec = PacketCodec::default();
    let mut original = packet;
    let bytes = codec.encode(&mut original).expect("encode must succeed");
    let (decoded, consumed) = codec.decode(&bytes).expect("decode must succeed");
    assert_eq!(consumed, bytes.len(), "all bytes must be consumed");
    assert_eq!(decoded, original);

    let mut again = decoded.clone();
    assert_eq!(codec.encode(&mut again).unwrap(), bytes, "re-encoding must be byte identical");
    decoded
}

#[test]
fn test_roundtrip_connect_with_every_optional_field_combination() {
    let wills = [
        None,
        Some(Message::new("last/will", "bye")),
        Some(Message::new("last/will", vec![0u8, 0xFF]).with_qos(QoS::ExactlyOnce).retained()),
    ];
    let credentials = [
        (None, None),
        (Some("user"), None),
        (None, Some("pass")),
        (Some("user"), Some("pass")),
    ];

    for level in [3u8, 4] {
        for will in &wills {
            for (username, password) in &credentials {
                let mut connect = ConnectPacket::new();
                connect.set_protocol_level(level).unwrap();
                connect.set_client_id("client42").unwrap();
                connect.set_keep_alive(120);
                connect.set_will(will.clone()).unwrap();
                connect.set_username(username.map(str::to_string)).unwrap();
                connect.set_password(password.map(str::to_string)).unwrap();

                roundtrip(Packet::Connect(connect));
            }
        }
    }
}

#[test]
fn test_connect_reference_encoding() {
    let mut connect = ConnectPacket::new();
    connect.set_client_id("foobar").unwrap();
    connect.set_keep_alive(10);
    connect.set_clean_session(true);

    let bytes = PacketCodec::default()
        .encode(&mut Packet::Connect(connect))
        .unwrap();

    assert_eq!(bytes, b"\x10\x12\x00\x04MQTT\x04\x02\x00\x0a\x00\x06foobar");
}

#[test]
fn test_roundtrip_connack_codes() {
    for code in 0..=5u8 {
        roundtrip(Packet::ConnAck(ConnAckPacket::new(code, code == 0)));
    }
}

#[test]
fn test_roundtrip_publish_every_qos_and_flag() {
    for qos in [QoS::AtMostOnce, QoS::AtLeastOnce, QoS::ExactlyOnce] {
        for (retain, duplicate) in [(false, false), (true, false), (false, true), (true, true)] {
            let mut publish = PublishPacket::new("home/livingroom/lamp", b"on".to_vec()).unwrap();
            publish.set_qos(qos);
            publish.set_retained(retain);
            publish.set_duplicate(duplicate);
            if qos > QoS::AtMostOnce {
                publish.set_identifier(0xBEEF);
            }

            let decoded = roundtrip(Packet::Publish(publish));

            let Packet::Publish(decoded) = decoded else {
                panic!("expected PUBLISH");
            };
            assert_eq!(decoded.qos(), qos);
            assert_eq!(decoded.is_retained(), retain);
            assert_eq!(decoded.is_duplicate(), duplicate);
        }
    }
}

#[test]
fn test_roundtrip_large_publish_uses_multi_byte_length() {
    let payload = vec![7u8; 200_000];
    let publish = PublishPacket::new("bulk", payload).unwrap();

    let mut packet = Packet::Publish(publish);
    let bytes = PacketCodec::default().encode(&mut packet).unwrap();

    // 200_006 bytes of body need three length groups.
    assert_eq!(&bytes[1..4], &[0xC6, 0x9A, 0x0C]);
    roundtrip(packet);
}

#[test]
fn test_roundtrip_identifier_packets() {
    roundtrip(Packet::PubAck(PubAckPacket::new(1)));
    roundtrip(Packet::PubRec(PubRecPacket::new(2)));
    roundtrip(Packet::PubRel(PubRelPacket::new(3)));
    roundtrip(Packet::PubComp(PubCompPacket::new(65535)));
    roundtrip(Packet::UnsubAck(UnsubAckPacket::new(4)));
}

#[test]
fn test_roundtrip_subscribe_family() {
    let mut subscribe = SubscribePacket::new(vec![
        Subscription::new("a/b", QoS::AtMostOnce),
        Subscription::new("+/c/#", QoS::ExactlyOnce),
    ])
    .unwrap();
    subscribe.set_identifier(10);
    roundtrip(Packet::Subscribe(subscribe));

    roundtrip(Packet::SubAck(SubAckPacket::new(10, vec![0, SUBACK_FAILURE]).unwrap()));

    let mut unsubscribe = UnsubscribePacket::new(vec!["a/b".to_string()]).unwrap();
    unsubscribe.set_identifier(11);
    roundtrip(Packet::Unsubscribe(unsubscribe));
}

#[test]
fn test_roundtrip_empty_packets() {
    roundtrip(Packet::PingReq);
    roundtrip(Packet::PingResp);
    roundtrip(Packet::Disconnect);
}

#[test]
fn test_missing_identifiers_come_from_the_codec_generator() {
    // Arrange
    let codec = PacketCodec::new(
        CodecConfig::default(),
        Arc::new(SequentialPacketIdentifierGenerator::starting_at(500)),
    );
    let mut first = Packet::PubAck(PubAckPacket::default());
    let mut second = Packet::PubRel(PubRelPacket::default());

    // Act
    codec.encode(&mut first).unwrap();
    codec.encode(&mut second).unwrap();

    // Assert
    assert_eq!(first.identifier(), Some(500));
    assert_eq!(second.identifier(), Some(501));
}

#[test]
fn test_read_continues_after_a_complete_packet() {
    let codec = PacketCodec::default();
    let mut cursor = ByteCursor::new();
    codec.write(&mut Packet::PingReq, &mut cursor).unwrap();
    codec
        .write(&mut Packet::PubAck(PubAckPacket::new(9)), &mut cursor)
        .unwrap();
    cursor.write_byte(0x30);

    assert_eq!(codec.read(&mut cursor), Ok(Packet::PingReq));
    assert_eq!(codec.read(&mut cursor), Ok(Packet::PubAck(PubAckPacket::new(9))));
    assert_eq!(codec.read(&mut cursor), Err(ProtocolError::EndOfStream));
    assert_eq!(cursor.remaining(), 1, "the partial header must stay unread");
}

#[test]
fn test_remaining_length_boundaries() {
    for value in [0u32, 127, 128, 16_383, 16_384, 2_097_151, 2_097_152, 268_435_455] {
        let mut cursor = ByteCursor::new();
        cursor.write_remaining_length(value).unwrap();
        assert_eq!(cursor.read_remaining_length(), Ok(value));
    }

    let mut too_long = ByteCursor::from(vec![0xFF, 0xFF, 0xFF, 0xFF, 0x01]);
    assert!(matches!(
        too_long.read_remaining_length(),
        Err(ProtocolError::MalformedPacket(_))
    ));

    let mut cursor = ByteCursor::new();
    assert!(matches!(
        cursor.write_remaining_length(268_435_456),
        Err(ProtocolError::InvalidArgument(_))
    ));
}

//! # mqtt-core
//!
//! MQTT 3.1 / 3.1.1 protocol core: the packet codec, an incremental stream
//! parser, and the state machines ("flows") that drive each protocol
//! exchange.
//!
//! The crate does no I/O.  It has no dependency on sockets, async runtimes or
//! timers, so the same code serves a client, a broker, or a test harness.
//!
//! # Architecture overview (for beginners)
//!
//! MQTT is a publish/subscribe protocol: clients connect to a broker,
//! subscribe to topic filters, and publish messages to topics.  Everything
//! travels as small binary "control packets".
//!
//! ```text
//! bytes in ──► StreamParser ──► Packet ──► Flow ──► Packet ──► PacketCodec ──► bytes out
//! ```
//!
//! - **`domain`** – Plain values the caller works with: a `Connection`
//!   (client id, credentials, keep-alive), a `Message` (topic, payload, QoS)
//!   and a `Subscription` (topic filter, QoS).
//!
//! - **`protocol`** – How packets look on the wire.  `ByteCursor` reads and
//!   writes the primitive fields, `PacketCodec` turns each of the 14 packet
//!   types into bytes and back, and `StreamParser` reassembles packets from
//!   the arbitrary chunks a TCP socket delivers.
//!
//! - **`flow`** – One state machine per exchange (connect, publish at each
//!   QoS, subscribe, …).  A flow says which packet to send next and tells the
//!   caller when the exchange is finished and whether it succeeded.
//!
//! # Example
//!
//! ```rust
//! use mqtt_core::{Flow, FlowFactory, FlowRequest, Message, PacketCodec, QoS, StreamParser};
//!
//! let factory = FlowFactory::default();
//! let codec = PacketCodec::default();
//!
//! let mut flow = factory
//!     .build(FlowRequest::Publish(Message::new("a/b", "hello").with_qos(QoS::AtLeastOnce)))
//!     .unwrap();
//! let mut publish = flow.start().unwrap().unwrap();
//! let _bytes_to_send = codec.encode(&mut publish).unwrap();
//!
//! // The broker answers with PUBACK for identifier 1.
//! let mut parser = StreamParser::new();
//! for packet in parser.push(&[0x40, 0x02, 0x00, 0x01]) {
//!     if flow.accept(&packet) {
//!         flow.next(&packet).unwrap();
//!     }
//! }
//! assert!(flow.is_finished() && flow.is_success());
//! ```

pub mod domain;
pub mod flow;
pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `mqtt_core::PacketCodec` instead of `mqtt_core::protocol::codec::PacketCodec`.
pub use domain::{Connection, Message, QoS, Subscription};
pub use flow::{Flow, FlowError, FlowFactory, FlowRequest, FlowResult};
pub use protocol::{ByteCursor, CodecConfig, Packet, PacketCodec, ProtocolError, StreamParser};

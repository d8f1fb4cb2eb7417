//! Incremental packet reassembly from a byte stream.
//!
//! A TCP `read()` returns however many bytes happen to be available, which
//! may be half a packet, three packets, or two and a half.  [`StreamParser`]
//! keeps the unconsumed tail between calls so the caller can simply feed it
//! whatever arrived and collect the packets that are now complete.
//!
//! # Error recovery
//!
//! Decode errors never stop the stream.  They are handed to the optional
//! error callback and scanning continues:
//!
//! - an unknown type nibble skips exactly that one byte;
//! - a malformed body skips the whole frame its header declared;
//! - a malformed remaining-length field skips the bytes read for it;
//! - a frame longer than the configured maximum is dropped as its body
//!   arrives, without buffering it.
//!
//! Each attempt advances at least one byte, so a buffer of garbage is always
//! drained in finite time.

use tracing::{debug, trace};

use crate::protocol::codec::{PacketCodec, ProtocolError};
use crate::protocol::cursor::ByteCursor;
use crate::protocol::packets::Packet;

type ErrorCallback = Box<dyn FnMut(&ProtocolError) + Send>;

/// Stateful decoder for one connection's inbound bytes.
///
/// # Examples
///
/// ```rust
/// use mqtt_core::protocol::{Packet, StreamParser};
///
/// let mut parser = StreamParser::new();
/// assert!(parser.push(&[0xD0]).is_empty());
/// assert_eq!(parser.push(&[0x00, 0xC0, 0x00]), vec![Packet::PingResp, Packet::PingReq]);
/// assert_eq!(parser.buffered(), 0);
/// ```
pub struct StreamParser {
    codec: PacketCodec,
    buffer: ByteCursor,
    /// Bytes of a rejected oversized frame that have not arrived yet.
    discard: usize,
    on_error: Option<ErrorCallback>,
}

impl Default for StreamParser {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for StreamParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamParser")
            .field("codec", &self.codec)
            .field("buffered", &self.buffered())
            .field("discard", &self.discard)
            .field("has_error_callback", &self.on_error.is_some())
            .finish()
    }
}

impl StreamParser {
    pub fn new() -> Self {
        Self::with_codec(PacketCodec::default())
    }

    /// Creates a parser decoding with `codec` (and therefore its config).
    pub fn with_codec(codec: PacketCodec) -> Self {
        Self {
            codec,
            buffer: ByteCursor::new(),
            discard: 0,
            on_error: None,
        }
    }

    /// Registers the callback that receives every decode error.
    ///
    /// Without a callback errors are dropped after being logged.
    pub fn on_error<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&ProtocolError) + Send + 'static,
    {
        self.on_error = Some(Box::new(callback));
        self
    }

    /// Number of bytes retained for the next call.
    pub fn buffered(&self) -> usize {
        self.buffer.remaining()
    }

    /// Appends `data` and returns every packet completed by it, in order.
    pub fn push(&mut self, data: &[u8]) -> Vec<Packet> {
        self.buffer.write_bytes(data);

        let mut packets = Vec::new();
        while self.buffer.remaining() > 0 {
            if self.discard > 0 {
                let skipped = self.discard.min(self.buffer.remaining());
                self.buffer.set_position(self.buffer.position() + skipped);
                self.discard -= skipped;
                continue;
            }

            let start = self.buffer.position();
            match self.codec.read(&mut self.buffer) {
                Ok(packet) => {
                    trace!(
                        offset = start,
                        length = self.buffer.position() - start,
                        "decoded {}",
                        packet.packet_type()
                    );
                    packets.push(packet);
                }
                Err(ProtocolError::EndOfStream) => {
                    // Partial packet: keep the bytes and wait for more.
                    break;
                }
                Err(e) => {
                    debug!(offset = start, "skipping undecodable input: {e}");
                    if let Some(length) = self.codec.oversized_body_length(&self.buffer.as_slice()[start..]) {
                        self.discard = length as usize;
                    }
                    if self.buffer.position() <= start {
                        self.buffer.set_position(start + 1);
                    }
                    if let Some(callback) = self.on_error.as_mut() {
                        callback(&e);
                    }
                }
            }
        }

        self.buffer.compact();
        packets
    }
}

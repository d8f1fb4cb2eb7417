//! Protocol module containing the packet types, the binary codec and the
//! stream parser.

pub mod codec;
pub mod config;
pub mod cursor;
pub mod identifier;
pub mod packets;
pub mod parser;

pub use codec::{PacketCodec, ProtocolError};
pub use config::CodecConfig;
pub use cursor::ByteCursor;
pub use identifier::{
    ClientIdentifierGenerator, DefaultClientIdentifierGenerator, PacketIdentifierGenerator,
    SequentialPacketIdentifierGenerator,
};
pub use packets::*;
pub use parser::StreamParser;

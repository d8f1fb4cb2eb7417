//! Value objects exchanged between the caller and the protocol flows.
//!
//! These records carry no wire logic.  They describe *what* a client wants
//! (connect with these parameters, publish this message, subscribe to these
//! filters); the packet codec and the flows turn them into bytes.
//!
//! All of them are immutable: every `with_*` method returns a new instance,
//! which is what lets a flow keep the exact value it was started with as its
//! final result.

pub mod connection;
pub mod message;
pub mod qos;
pub mod subscription;

pub use connection::{Connection, PROTOCOL_LEVEL_3_1, PROTOCOL_LEVEL_3_1_1};
pub use message::Message;
pub use qos::QoS;
pub use subscription::Subscription;

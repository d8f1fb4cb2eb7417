//! Packet and client identifier generators.
//!
//! # Why generators are passed in
//!
//! Packet identifiers correlate a request with its acknowledgements, so two
//! exchanges in flight at the same time must never share one.  The generator
//! is the only piece of shared mutable state in this crate, which is why it
//! is an explicit object handed to the codec and the flows instead of a
//! global counter.  Callers can plug in their own policy (for example one
//! that skips identifiers still awaiting an acknowledgement).
//!
//! # Thread safety
//!
//! [`SequentialPacketIdentifierGenerator`] uses an `AtomicU16`, so several
//! threads driving flows on the same connection can share one instance
//! behind an `Arc` without a lock.

use std::sync::atomic::{AtomicU16, Ordering};

use uuid::Uuid;

/// Prefix of generated client identifiers.
pub const CLIENT_ID_PREFIX: &str = "binsoul";

/// Longest client identifier every 3.1.1 server must accept.
pub const MAX_CLIENT_ID_LENGTH: usize = 23;

/// Produces packet identifiers in `1..=65535`.
#[cfg_attr(test, mockall::automock)]
pub trait PacketIdentifierGenerator: Send + Sync {
    /// Returns the next identifier.  Must never return 0.
    fn generate(&self) -> u16;
}

/// Produces client identifiers of at most [`MAX_CLIENT_ID_LENGTH`] bytes.
#[cfg_attr(test, mockall::automock)]
pub trait ClientIdentifierGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// Counts 1, 2, …, 65535 and wraps back to 1.
///
/// # Examples
///
/// ```rust
/// use mqtt_core::protocol::{PacketIdentifierGenerator, SequentialPacketIdentifierGenerator};
///
/// let ids = SequentialPacketIdentifierGenerator::new();
/// assert_eq!(ids.generate(), 1);
/// assert_eq!(ids.generate(), 2);
/// ```
#[derive(Debug)]
pub struct SequentialPacketIdentifierGenerator {
    next: AtomicU16,
}

impl SequentialPacketIdentifierGenerator {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    /// Creates a generator whose first identifier is `first` (0 is skipped).
    pub fn starting_at(first: u16) -> Self {
        Self {
            next: AtomicU16::new(first),
        }
    }
}

impl Default for SequentialPacketIdentifierGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl PacketIdentifierGenerator for SequentialPacketIdentifierGenerator {
    fn generate(&self) -> u16 {
        // fetch_add wraps 65535 -> 0; whoever draws the 0 draws again.
        loop {
            let id = self.next.fetch_add(1, Ordering::Relaxed);
            if id != 0 {
                return id;
            }
        }
    }
}

/// Generates `binsoul` followed by 16 random hex digits (23 bytes total).
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultClientIdentifierGenerator;

impl ClientIdentifierGenerator for DefaultClientIdentifierGenerator {
    fn generate(&self) -> String {
        let random = Uuid::new_v4().simple().to_string();
        let digits = MAX_CLIENT_ID_LENGTH - CLIENT_ID_PREFIX.len();
        format!("{CLIENT_ID_PREFIX}{}", &random[..digits])
    }
}

//! PUBLISH delivery for QoS 0, 1 and 2.
//!
//! ```text
//! QoS 0   PUBLISH ─►                                  done at start
//! QoS 1   PUBLISH ─►  ◄─ PUBACK                       done on PUBACK
//! QoS 2   PUBLISH ─►  ◄─ PUBREC   PUBREL ─►  ◄─ PUBCOMP
//! ```
//!
//! The receiving side mirrors this: QoS 0 and 1 finish at start, QoS 2 waits
//! for the sender's PUBREL before answering with PUBCOMP.

use std::sync::Arc;

use tracing::trace;

use crate::domain::{Message, QoS};
use crate::flow::{unexpected, Flow, FlowError, FlowResult, FlowStatus, CODE_MESSAGE, CODE_PUBLISH};
use crate::protocol::{
    Packet, PacketIdentifierGenerator, PubAckPacket, PubCompPacket, PubRecPacket, PubRelPacket,
    PublishPacket,
};

/// Sends a message and drives its acknowledgements.
pub struct OutgoingPublishFlow {
    message: Message,
    identifiers: Arc<dyn PacketIdentifierGenerator>,
    identifier: Option<u16>,
    released: bool,
    status: FlowStatus,
}

impl std::fmt::Debug for OutgoingPublishFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutgoingPublishFlow")
            .field("message", &self.message)
            .field("identifier", &self.identifier)
            .field("released", &self.released)
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

impl OutgoingPublishFlow {
    pub fn new(message: Message, identifiers: Arc<dyn PacketIdentifierGenerator>) -> Self {
        Self {
            message,
            identifiers,
            identifier: None,
            released: false,
            status: FlowStatus::new(),
        }
    }

    /// Packet identifier drawn at start for QoS 1 and 2.
    pub fn identifier(&self) -> Option<u16> {
        self.identifier
    }

    fn matches(&self, identifier: Option<u16>) -> bool {
        self.identifier.is_some() && identifier == self.identifier
    }
}

impl Flow for OutgoingPublishFlow {
    fn code(&self) -> &'static str {
        CODE_PUBLISH
    }

    fn start(&mut self) -> Result<Option<Packet>, FlowError> {
        let mut packet = PublishPacket::from_message(&self.message)?;
        if self.message.qos() == QoS::AtMostOnce {
            self.status
                .succeed(CODE_PUBLISH, Some(FlowResult::Message(self.message.clone())));
        } else {
            let identifier = *self
                .identifier
                .get_or_insert_with(|| self.identifiers.generate());
            packet.set_identifier(identifier);
        }
        Ok(Some(Packet::Publish(packet)))
    }

    fn accept(&self, packet: &Packet) -> bool {
        if self.status.is_finished() {
            return false;
        }
        match (self.message.qos(), packet) {
            (QoS::AtLeastOnce, Packet::PubAck(ack)) => self.matches(ack.identifier),
            (QoS::ExactlyOnce, Packet::PubRec(rec)) if !self.released => self.matches(rec.identifier),
            (QoS::ExactlyOnce, Packet::PubComp(comp)) if self.released => self.matches(comp.identifier),
            _ => false,
        }
    }

    fn next(&mut self, packet: &Packet) -> Result<Option<Packet>, FlowError> {
        if !self.accept(packet) {
            return Err(unexpected(self.code(), packet));
        }
        match packet {
            Packet::PubRec(rec) => {
                self.released = true;
                trace!(flow = CODE_PUBLISH, identifier = ?rec.identifier, "releasing message");
                Ok(Some(Packet::PubRel(PubRelPacket {
                    identifier: rec.identifier,
                })))
            }
            _ => {
                self.status
                    .succeed(CODE_PUBLISH, Some(FlowResult::Message(self.message.clone())));
                Ok(None)
            }
        }
    }

    fn status(&self) -> &FlowStatus {
        &self.status
    }
}

/// Acknowledges a received message.
#[derive(Debug)]
pub struct IncomingPublishFlow {
    message: Message,
    identifier: Option<u16>,
    status: FlowStatus,
}

impl IncomingPublishFlow {
    /// `identifier` is the one carried by the received PUBLISH; it is
    /// required for QoS 1 and 2.
    pub fn new(message: Message, identifier: Option<u16>) -> Self {
        Self {
            message,
            identifier,
            status: FlowStatus::new(),
        }
    }

    /// Creates the flow for a decoded PUBLISH.
    pub fn from_packet(packet: &PublishPacket) -> Self {
        Self::new(packet.to_message(), packet.identifier())
    }

    fn succeed(&mut self) {
        self.status
            .succeed(CODE_MESSAGE, Some(FlowResult::Message(self.message.clone())));
    }
}

impl Flow for IncomingPublishFlow {
    fn code(&self) -> &'static str {
        CODE_MESSAGE
    }

    fn start(&mut self) -> Result<Option<Packet>, FlowError> {
        match self.message.qos() {
            QoS::AtMostOnce => {
                self.succeed();
                Ok(None)
            }
            QoS::AtLeastOnce => {
                let identifier = self.identifier.ok_or(FlowError::MissingIdentifier)?;
                self.succeed();
                Ok(Some(Packet::PubAck(PubAckPacket::new(identifier))))
            }
            QoS::ExactlyOnce => {
                let identifier = self.identifier.ok_or(FlowError::MissingIdentifier)?;
                trace!(flow = CODE_MESSAGE, identifier, "message received, awaiting release");
                Ok(Some(Packet::PubRec(PubRecPacket::new(identifier))))
            }
        }
    }

    fn accept(&self, packet: &Packet) -> bool {
        !self.status.is_finished()
            && self.message.qos() == QoS::ExactlyOnce
            && self.identifier.is_some()
            && matches!(packet, Packet::PubRel(rel) if rel.identifier == self.identifier)
    }

    fn next(&mut self, packet: &Packet) -> Result<Option<Packet>, FlowError> {
        let Packet::PubRel(rel) = packet else {
            return Err(unexpected(self.code(), packet));
        };
        if !self.accept(packet) {
            return Err(unexpected(self.code(), packet));
        }
        self.succeed();
        Ok(Some(Packet::PubComp(PubCompPacket {
            identifier: rel.identifier,
        })))
    }

    fn status(&self) -> &FlowStatus {
        &self.status
    }
}

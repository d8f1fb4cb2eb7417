//! UNSUBSCRIBE / UNSUBACK exchange.
//!
//! UNSUBACK carries no per-filter status in MQTT 3.1.1, so the outgoing flow
//! succeeds on any matching acknowledgement.

use std::sync::Arc;

use crate::domain::Subscription;
use crate::flow::{unexpected, Flow, FlowError, FlowResult, FlowStatus, CODE_UNSUBSCRIBE};
use crate::protocol::{Packet, PacketIdentifierGenerator, UnsubAckPacket, UnsubscribePacket};

#[derive(Debug)]
pub struct OutgoingUnsubscribeFlow {
    subscriptions: Vec<Subscription>,
    identifier: u16,
    status: FlowStatus,
}

impl OutgoingUnsubscribeFlow {
    pub fn new(
        subscriptions: Vec<Subscription>,
        identifiers: Arc<dyn PacketIdentifierGenerator>,
    ) -> Result<Self, FlowError> {
        if subscriptions.is_empty() {
            return Err(FlowError::EmptySubscriptions);
        }
        Ok(Self {
            subscriptions,
            identifier: identifiers.generate(),
            status: FlowStatus::new(),
        })
    }

    pub fn identifier(&self) -> u16 {
        self.identifier
    }

    fn succeed(&mut self) {
        self.status.succeed(
            CODE_UNSUBSCRIBE,
            Some(FlowResult::Subscriptions(self.subscriptions.clone())),
        );
    }
}

impl Flow for OutgoingUnsubscribeFlow {
    fn code(&self) -> &'static str {
        CODE_UNSUBSCRIBE
    }

    fn start(&mut self) -> Result<Option<Packet>, FlowError> {
        let filters = self
            .subscriptions
            .iter()
            .map(|subscription| subscription.filter().to_string())
            .collect();
        let mut packet = UnsubscribePacket::new(filters)?;
        packet.set_identifier(self.identifier);
        Ok(Some(Packet::Unsubscribe(packet)))
    }

    fn accept(&self, packet: &Packet) -> bool {
        !self.status.is_finished()
            && matches!(packet, Packet::UnsubAck(ack) if ack.identifier == Some(self.identifier))
    }

    fn next(&mut self, packet: &Packet) -> Result<Option<Packet>, FlowError> {
        if !self.accept(packet) {
            return Err(unexpected(self.code(), packet));
        }
        self.succeed();
        Ok(None)
    }

    fn status(&self) -> &FlowStatus {
        &self.status
    }
}

#[derive(Debug)]
pub struct IncomingUnsubscribeFlow {
    subscriptions: Vec<Subscription>,
    identifier: u16,
    status: FlowStatus,
}

impl IncomingUnsubscribeFlow {
    pub fn new(subscriptions: Vec<Subscription>, identifier: u16) -> Self {
        Self {
            subscriptions,
            identifier,
            status: FlowStatus::new(),
        }
    }
}

impl Flow for IncomingUnsubscribeFlow {
    fn code(&self) -> &'static str {
        CODE_UNSUBSCRIBE
    }

    fn start(&mut self) -> Result<Option<Packet>, FlowError> {
        self.status.succeed(
            CODE_UNSUBSCRIBE,
            Some(FlowResult::Subscriptions(self.subscriptions.clone())),
        );
        Ok(Some(Packet::UnsubAck(UnsubAckPacket::new(self.identifier))))
    }

    fn accept(&self, _packet: &Packet) -> bool {
        false
    }

    fn next(&mut self, packet: &Packet) -> Result<Option<Packet>, FlowError> {
        Err(unexpected(self.code(), packet))
    }

    fn status(&self) -> &FlowStatus {
        &self.status
    }
}

//! SUBSCRIBE / SUBACK exchange.

use std::sync::Arc;

use crate::domain::Subscription;
use crate::flow::{unexpected, Flow, FlowError, FlowResult, FlowStatus, CODE_SUBSCRIBE};
use crate::protocol::{Packet, PacketIdentifierGenerator, SubAckPacket, SubscribePacket, SUBACK_FAILURE};

/// Client side: requests subscriptions and evaluates the SUBACK.
#[derive(Debug)]
pub struct OutgoingSubscribeFlow {
    subscriptions: Vec<Subscription>,
    identifier: u16,
    status: FlowStatus,
}

impl OutgoingSubscribeFlow {
    /// Creates the flow and draws its packet identifier.
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

    pub fn subscriptions(&self) -> &[Subscription] {
        &self.subscriptions
    }
}

impl Flow for OutgoingSubscribeFlow {
    fn code(&self) -> &'static str {
        CODE_SUBSCRIBE
    }

    fn start(&mut self) -> Result<Option<Packet>, FlowError> {
        let mut packet = SubscribePacket::new(self.subscriptions.clone())?;
        packet.set_identifier(self.identifier);
        Ok(Some(Packet::Subscribe(packet)))
    }

    fn accept(&self, packet: &Packet) -> bool {
        !self.status.is_finished()
            && matches!(packet, Packet::SubAck(ack) if ack.identifier() == Some(self.identifier))
    }

    fn next(&mut self, packet: &Packet) -> Result<Option<Packet>, FlowError> {
        let Packet::SubAck(ack) = packet else {
            return Err(unexpected(self.code(), packet));
        };
        if !self.accept(packet) {
            return Err(unexpected(self.code(), packet));
        }

        let codes = ack.return_codes();
        if codes.len() != self.subscriptions.len() {
            return Err(FlowError::ReturnCodeMismatch {
                expected: self.subscriptions.len(),
                actual: codes.len(),
            });
        }

        let rejected = self
            .subscriptions
            .iter()
            .zip(codes)
            .find(|(_, code)| **code == SUBACK_FAILURE);
        match rejected {
            Some((subscription, _)) => {
                let message = format!(
                    "Subscription for topic filter \"{}\" was rejected",
                    subscription.filter()
                );
                self.status.fail(CODE_SUBSCRIBE, message);
            }
            None => {
                let first = self.subscriptions[0].clone();
                self.status
                    .succeed(CODE_SUBSCRIBE, Some(FlowResult::Subscription(first)));
            }
        }
        Ok(None)
    }

    fn status(&self) -> &FlowStatus {
        &self.status
    }
}

/// Server side: answers a SUBSCRIBE with return codes decided by the caller.
#[derive(Debug)]
pub struct IncomingSubscribeFlow {
    subscriptions: Vec<Subscription>,
    return_codes: Vec<u8>,
    identifier: u16,
    status: FlowStatus,
}

impl IncomingSubscribeFlow {
    pub fn new(subscriptions: Vec<Subscription>, return_codes: Vec<u8>, identifier: u16) -> Self {
        Self {
            subscriptions,
            return_codes,
            identifier,
            status: FlowStatus::new(),
        }
    }
}

impl Flow for IncomingSubscribeFlow {
    fn code(&self) -> &'static str {
        CODE_SUBSCRIBE
    }

    fn start(&mut self) -> Result<Option<Packet>, FlowError> {
        if self.return_codes.len() != self.subscriptions.len() {
            return Err(FlowError::ReturnCodeMismatch {
                expected: self.subscriptions.len(),
                actual: self.return_codes.len(),
            });
        }
        let packet = SubAckPacket::new(self.identifier, self.return_codes.clone())?;
        self.status.succeed(
            CODE_SUBSCRIBE,
            Some(FlowResult::Subscriptions(self.subscriptions.clone())),
        );
        Ok(Some(Packet::SubAck(packet)))
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

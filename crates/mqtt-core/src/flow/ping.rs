//! PINGREQ / PINGRESP keep-alive exchange.

use crate::flow::{unexpected, Flow, FlowError, FlowStatus, CODE_PING, CODE_PONG};
use crate::protocol::Packet;

/// Sends PINGREQ and waits for PINGRESP.
#[derive(Debug, Default)]
pub struct OutgoingPingFlow {
    status: FlowStatus,
}

impl OutgoingPingFlow {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Flow for OutgoingPingFlow {
    fn code(&self) -> &'static str {
        CODE_PING
    }

    fn start(&mut self) -> Result<Option<Packet>, FlowError> {
        Ok(Some(Packet::PingReq))
    }

    fn accept(&self, packet: &Packet) -> bool {
        !self.status.is_finished() && matches!(packet, Packet::PingResp)
    }

    fn next(&mut self, packet: &Packet) -> Result<Option<Packet>, FlowError> {
        if !self.accept(packet) {
            return Err(unexpected(self.code(), packet));
        }
        self.status.succeed(CODE_PING, None);
        Ok(None)
    }

    fn status(&self) -> &FlowStatus {
        &self.status
    }
}

/// Answers a received PINGREQ.
#[derive(Debug, Default)]
pub struct IncomingPingFlow {
    status: FlowStatus,
}

impl IncomingPingFlow {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Flow for IncomingPingFlow {
    fn code(&self) -> &'static str {
        CODE_PONG
    }

    fn start(&mut self) -> Result<Option<Packet>, FlowError> {
        self.status.succeed(CODE_PONG, None);
        Ok(Some(Packet::PingResp))
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outgoing_ping_waits_for_pingresp() {
        // Arrange
        let mut flow = OutgoingPingFlow::new();

        // Act
        let request = flow.start().unwrap();

        // Assert
        assert_eq!(request, Some(Packet::PingReq));
        assert!(!flow.is_finished());
        assert!(!flow.accept(&Packet::PingReq));
        assert!(flow.accept(&Packet::PingResp));

        assert_eq!(flow.next(&Packet::PingResp).unwrap(), None);
        assert!(flow.is_success());
        assert!(flow.result().is_none());
        assert!(!flow.accept(&Packet::PingResp));
    }

    #[test]
    fn test_outgoing_ping_next_after_finish_is_an_error() {
        let mut flow = OutgoingPingFlow::new();
        flow.start().unwrap();
        flow.next(&Packet::PingResp).unwrap();

        assert!(matches!(
            flow.next(&Packet::PingResp),
            Err(FlowError::UnexpectedPacket { flow: "ping", .. })
        ));
    }

    #[test]
    fn test_incoming_ping_replies_immediately() {
        let mut flow = IncomingPingFlow::new();
        assert_eq!(flow.code(), "pong");
        assert_eq!(flow.start().unwrap(), Some(Packet::PingResp));
        assert!(flow.is_finished());
        assert!(flow.is_success());
    }
}

//! CONNECT / CONNACK handshake.

use crate::domain::Connection;
use crate::flow::{unexpected, Flow, FlowError, FlowResult, FlowStatus, CODE_CONNECT};
use crate::protocol::{ClientIdentifierGenerator, ConnAckPacket, ConnectPacket, Packet};

/// Client side: sends CONNECT and waits for CONNACK.
#[derive(Debug)]
pub struct OutgoingConnectFlow {
    connection: Connection,
    status: FlowStatus,
}

impl OutgoingConnectFlow {
    /// Creates the flow.  An empty client id is replaced once, here, by one
    /// from `client_ids`.
    pub fn new(connection: Connection, client_ids: &dyn ClientIdentifierGenerator) -> Self {
        let connection = if connection.client_id().is_empty() {
            connection.with_client_id(client_ids.generate())
        } else {
            connection
        };
        Self {
            connection,
            status: FlowStatus::new(),
        }
    }

    /// The connection parameters sent in CONNECT.
    pub fn connection(&self) -> &Connection {
        &self.connection
    }
}

impl Flow for OutgoingConnectFlow {
    fn code(&self) -> &'static str {
        CODE_CONNECT
    }

    fn start(&mut self) -> Result<Option<Packet>, FlowError> {
        let packet = ConnectPacket::from_connection(&self.connection)?;
        Ok(Some(Packet::Connect(packet)))
    }

    fn accept(&self, packet: &Packet) -> bool {
        !self.status.is_finished() && matches!(packet, Packet::ConnAck(_))
    }

    fn next(&mut self, packet: &Packet) -> Result<Option<Packet>, FlowError> {
        let Packet::ConnAck(connack) = packet else {
            return Err(unexpected(self.code(), packet));
        };
        if !self.accept(packet) {
            return Err(unexpected(self.code(), packet));
        }

        if connack.is_success() {
            self.status
                .succeed(CODE_CONNECT, Some(FlowResult::Connection(self.connection.clone())));
        } else {
            self.status.fail(CODE_CONNECT, connack.error_name());
        }
        Ok(None)
    }

    fn status(&self) -> &FlowStatus {
        &self.status
    }
}

/// Server side: answers a received CONNECT with a CONNACK decided by the
/// caller.
#[derive(Debug)]
pub struct IncomingConnectFlow {
    connection: Connection,
    return_code: u8,
    session_present: bool,
    status: FlowStatus,
}

impl IncomingConnectFlow {
    pub fn new(connection: Connection, return_code: u8, session_present: bool) -> Self {
        Self {
            connection,
            return_code,
            session_present,
            status: FlowStatus::new(),
        }
    }
}

impl Flow for IncomingConnectFlow {
    fn code(&self) -> &'static str {
        CODE_CONNECT
    }

    fn start(&mut self) -> Result<Option<Packet>, FlowError> {
        self.status
            .succeed(CODE_CONNECT, Some(FlowResult::Connection(self.connection.clone())));
        Ok(Some(Packet::ConnAck(ConnAckPacket::new(
            self.return_code,
            self.session_present,
        ))))
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
    use crate::protocol::identifier::MockClientIdentifierGenerator;
    use crate::protocol::DefaultClientIdentifierGenerator;

    fn connack(code: u8) -> Packet {
        Packet::ConnAck(ConnAckPacket::new(code, false))
    }

    #[test]
    fn test_empty_client_id_is_generated_once_at_creation() {
        // Arrange
        let mut ids = MockClientIdentifierGenerator::new();
        ids.expect_generate()
            .times(1)
            .returning(|| "generated".to_string());

        // Act
        let mut flow = OutgoingConnectFlow::new(Connection::new(""), &ids);
        let first = flow.start().unwrap();
        let second = flow.start().unwrap();

        // Assert
        assert_eq!(flow.connection().client_id(), "generated");
        assert_eq!(first, second);
    }

    #[test]
    fn test_given_client_id_is_kept() {
        let mut ids = MockClientIdentifierGenerator::new();
        ids.expect_generate().never();
        let flow = OutgoingConnectFlow::new(Connection::new("me"), &ids);
        assert_eq!(flow.connection().client_id(), "me");
    }

    #[test]
    fn test_start_emits_connect_with_connection_fields() {
        let connection = Connection::new("me")
            .with_keep_alive(15)
            .with_credentials("user", "pass");
        let mut flow = OutgoingConnectFlow::new(connection, &DefaultClientIdentifierGenerator);

        let Some(Packet::Connect(connect)) = flow.start().unwrap() else {
            panic!("expected CONNECT");
        };

        assert_eq!(connect.client_id(), "me");
        assert_eq!(connect.keep_alive(), 15);
        assert_eq!(connect.username(), Some("user"));
        assert_eq!(connect.password(), Some("pass"));
        assert!(!flow.is_finished());
    }

    #[test]
    fn test_accepted_connack_succeeds_with_connection() {
        let mut flow = OutgoingConnectFlow::new(Connection::new("me"), &DefaultClientIdentifierGenerator);
        flow.start().unwrap();

        assert!(flow.accept(&connack(0)));
        assert_eq!(flow.next(&connack(0)).unwrap(), None);

        assert!(flow.is_finished());
        assert!(flow.is_success());
        assert_eq!(flow.result(), Some(&FlowResult::Connection(Connection::new("me"))));
        assert!(!flow.accept(&connack(0)), "finished flows accept nothing");
    }

    #[test]
    fn test_refused_connack_fails_with_code_name() {
        let mut flow = OutgoingConnectFlow::new(Connection::new("me"), &DefaultClientIdentifierGenerator);
        flow.start().unwrap();

        flow.next(&connack(4)).unwrap();

        assert!(flow.is_finished());
        assert!(!flow.is_success());
        assert_eq!(flow.error_message(), "Bad user name or password");
    }

    #[test]
    fn test_unknown_return_code_name() {
        let mut flow = OutgoingConnectFlow::new(Connection::new("me"), &DefaultClientIdentifierGenerator);
        flow.next(&connack(42)).unwrap();
        assert_eq!(flow.error_message(), "Unknown 42");
    }

    #[test]
    fn test_outgoing_connect_rejects_other_packets() {
        let mut flow = OutgoingConnectFlow::new(Connection::new("me"), &DefaultClientIdentifierGenerator);
        assert!(!flow.accept(&Packet::PingResp));
        assert!(matches!(
            flow.next(&Packet::PingResp),
            Err(FlowError::UnexpectedPacket { .. })
        ));
    }

    #[test]
    fn test_incoming_connect_answers_with_given_code() {
        let mut flow = IncomingConnectFlow::new(Connection::new("peer"), 0, true);

        let reply = flow.start().unwrap();

        assert_eq!(reply, Some(Packet::ConnAck(ConnAckPacket::new(0, true))));
        assert!(flow.is_finished());
        assert!(flow.is_success());
        assert!(!flow.accept(&Packet::PingReq));
    }
}

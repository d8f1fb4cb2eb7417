//! DISCONNECT.  Single step in both directions; MQTT defines no reply.

use crate::domain::Connection;
use crate::flow::{unexpected, Flow, FlowError, FlowResult, FlowStatus, CODE_DISCONNECT};
use crate::protocol::Packet;

/// Sends DISCONNECT and finishes.
#[derive(Debug)]
pub struct OutgoingDisconnectFlow {
    connection: Connection,
    status: FlowStatus,
}

impl OutgoingDisconnectFlow {
    pub fn new(connection: Connection) -> Self {
        Self {
            connection,
            status: FlowStatus::new(),
        }
    }
}

impl Flow for OutgoingDisconnectFlow {
    fn code(&self) -> &'static str {
        CODE_DISCONNECT
    }

    fn start(&mut self) -> Result<Option<Packet>, FlowError> {
        self.status
            .succeed(CODE_DISCONNECT, Some(FlowResult::Connection(self.connection.clone())));
        Ok(Some(Packet::Disconnect))
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

/// Records a received DISCONNECT.
#[derive(Debug)]
pub struct IncomingDisconnectFlow {
    connection: Connection,
    status: FlowStatus,
}

impl IncomingDisconnectFlow {
    pub fn new(connection: Connection) -> Self {
        Self {
            connection,
            status: FlowStatus::new(),
        }
    }
}

impl Flow for IncomingDisconnectFlow {
    fn code(&self) -> &'static str {
        CODE_DISCONNECT
    }

    fn start(&mut self) -> Result<Option<Packet>, FlowError> {
        self.status
            .succeed(CODE_DISCONNECT, Some(FlowResult::Connection(self.connection.clone())));
        Ok(None)
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

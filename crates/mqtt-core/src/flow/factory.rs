//! Builds flows from a description of the exchange to run.

use std::sync::Arc;

use crate::domain::{Connection, Message, Subscription};
use crate::flow::{
    Flow, FlowError, IncomingConnectFlow, IncomingDisconnectFlow, IncomingPingFlow,
    IncomingPublishFlow, IncomingSubscribeFlow, IncomingUnsubscribeFlow, OutgoingConnectFlow,
    OutgoingDisconnectFlow, OutgoingPingFlow, OutgoingPublishFlow, OutgoingSubscribeFlow,
    OutgoingUnsubscribeFlow, CODE_CONNECT, CODE_DISCONNECT, CODE_MESSAGE, CODE_PING, CODE_PONG,
    CODE_PUBLISH, CODE_SUBSCRIBE, CODE_UNSUBSCRIBE,
};
use crate::protocol::{
    ClientIdentifierGenerator, DefaultClientIdentifierGenerator, PacketIdentifierGenerator,
    SequentialPacketIdentifierGenerator,
};

/// An exchange to start.  `Accept*` variants answer a packet from the peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowRequest {
    Connect(Connection),
    AcceptConnect {
        connection: Connection,
        return_code: u8,
        session_present: bool,
    },
    Disconnect(Connection),
    AcceptDisconnect(Connection),
    Ping,
    AcceptPing,
    Publish(Message),
    AcceptPublish {
        message: Message,
        identifier: Option<u16>,
    },
    Subscribe(Vec<Subscription>),
    AcceptSubscribe {
        subscriptions: Vec<Subscription>,
        return_codes: Vec<u8>,
        identifier: u16,
    },
    Unsubscribe(Vec<Subscription>),
    AcceptUnsubscribe {
        subscriptions: Vec<Subscription>,
        identifier: u16,
    },
}

impl FlowRequest {
    /// Code of the flow this request builds.
    pub fn code(&self) -> &'static str {
        match self {
            FlowRequest::Connect(_) | FlowRequest::AcceptConnect { .. } => CODE_CONNECT,
            FlowRequest::Disconnect(_) | FlowRequest::AcceptDisconnect(_) => CODE_DISCONNECT,
            FlowRequest::Ping => CODE_PING,
            FlowRequest::AcceptPing => CODE_PONG,
            FlowRequest::Publish(_) => CODE_PUBLISH,
            FlowRequest::AcceptPublish { .. } => CODE_MESSAGE,
            FlowRequest::Subscribe(_) | FlowRequest::AcceptSubscribe { .. } => CODE_SUBSCRIBE,
            FlowRequest::Unsubscribe(_) | FlowRequest::AcceptUnsubscribe { .. } => {
                CODE_UNSUBSCRIBE
            }
        }
    }
}

/// Creates flows that share one pair of identifier generators.
///
/// Use one factory per connection so every flow on it draws packet
/// identifiers from the same counter.
#[derive(Clone)]
pub struct FlowFactory {
    packet_ids: Arc<dyn PacketIdentifierGenerator>,
    client_ids: Arc<dyn ClientIdentifierGenerator>,
}

impl Default for FlowFactory {
    fn default() -> Self {
        Self::new(
            Arc::new(SequentialPacketIdentifierGenerator::new()),
            Arc::new(DefaultClientIdentifierGenerator),
        )
    }
}

impl std::fmt::Debug for FlowFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlowFactory").finish_non_exhaustive()
    }
}

impl FlowFactory {
    pub fn new(
        packet_ids: Arc<dyn PacketIdentifierGenerator>,
        client_ids: Arc<dyn ClientIdentifierGenerator>,
    ) -> Self {
        Self {
            packet_ids,
            client_ids,
        }
    }

    pub fn build(&self, request: FlowRequest) -> Result<Box<dyn Flow>, FlowError> {
        let flow: Box<dyn Flow> = match request {
            FlowRequest::Connect(connection) => {
                Box::new(OutgoingConnectFlow::new(connection, self.client_ids.as_ref()))
            }
            FlowRequest::AcceptConnect {
                connection,
                return_code,
                session_present,
            } => Box::new(IncomingConnectFlow::new(connection, return_code, session_present)),
            FlowRequest::Disconnect(connection) => Box::new(OutgoingDisconnectFlow::new(connection)),
            FlowRequest::AcceptDisconnect(connection) => {
                Box::new(IncomingDisconnectFlow::new(connection))
            }
            FlowRequest::Ping => Box::new(OutgoingPingFlow::new()),
            FlowRequest::AcceptPing => Box::new(IncomingPingFlow::new()),
            FlowRequest::Publish(message) => {
                Box::new(OutgoingPublishFlow::new(message, Arc::clone(&self.packet_ids)))
            }
            FlowRequest::AcceptPublish { message, identifier } => {
                Box::new(IncomingPublishFlow::new(message, identifier))
            }
            FlowRequest::Subscribe(subscriptions) => Box::new(OutgoingSubscribeFlow::new(
                subscriptions,
                Arc::clone(&self.packet_ids),
            )?),
            FlowRequest::AcceptSubscribe {
                subscriptions,
                return_codes,
                identifier,
            } => Box::new(IncomingSubscribeFlow::new(subscriptions, return_codes, identifier)),
            FlowRequest::Unsubscribe(subscriptions) => Box::new(OutgoingUnsubscribeFlow::new(
                subscriptions,
                Arc::clone(&self.packet_ids),
            )?),
            FlowRequest::AcceptUnsubscribe {
                subscriptions,
                identifier,
            } => Box::new(IncomingUnsubscribeFlow::new(subscriptions, identifier)),
        };
        Ok(flow)
    }
}

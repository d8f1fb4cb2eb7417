//! Protocol flows: one state machine per MQTT exchange.
//!
//! # How a flow is driven (for beginners)
//!
//! Every MQTT operation is a short conversation between client and server.
//! A QoS 2 publish, for example, looks like this from the sender's side:
//!
//! ```text
//! sender                      receiver
//!   │ ── PUBLISH (id 7) ────────► │
//!   │ ◄─────────── PUBREC (id 7) ─│
//!   │ ── PUBREL (id 7) ─────────► │
//!   │ ◄────────── PUBCOMP (id 7) ─│   flow finished, success
//! ```
//!
//! A [`Flow`] models one such conversation.  The caller owns the socket and
//! drives every flow the same way:
//!
//! 1. Call [`Flow::start`] and send the packet it returns, if any.
//! 2. For each inbound packet, ask every active flow whether it
//!    [`accept`](Flow::accept)s the packet.  The flow that does gets
//!    [`next`](Flow::next), and any packet it returns is sent back.
//! 3. Once [`Flow::is_finished`] is true, read [`Flow::is_success`] and
//!    [`Flow::result`] (or [`Flow::error_message`]) and drop the flow.
//!
//! Flows do no I/O and hold no timers.  Retransmission and keep-alive
//! timeouts are the caller's business.
//!
//! # Failures versus errors
//!
//! A broker rejecting a subscription or refusing a connection is a normal
//! outcome: the flow finishes with `is_success() == false` and a readable
//! [`Flow::error_message`].  A [`FlowError`] is reserved for situations the
//! local side cannot resolve, such as a SUBACK whose return-code count does
//! not match the request.

pub mod connect;
pub mod disconnect;
pub mod factory;
pub mod ping;
pub mod publish;
pub mod subscribe;
pub mod unsubscribe;

use thiserror::Error;
use tracing::debug;

use crate::domain::{Connection, Message, Subscription};
use crate::protocol::{Packet, PacketType, ProtocolError};

pub use connect::{IncomingConnectFlow, OutgoingConnectFlow};
pub use disconnect::{IncomingDisconnectFlow, OutgoingDisconnectFlow};
pub use factory::{FlowFactory, FlowRequest};
pub use ping::{IncomingPingFlow, OutgoingPingFlow};
pub use publish::{IncomingPublishFlow, OutgoingPublishFlow};
pub use subscribe::{IncomingSubscribeFlow, OutgoingSubscribeFlow};
pub use unsubscribe::{IncomingUnsubscribeFlow, OutgoingUnsubscribeFlow};

// ── Flow codes ────────────────────────────────────────────────────────────────

pub const CODE_CONNECT: &str = "connect";
pub const CODE_DISCONNECT: &str = "disconnect";
/// Outgoing PINGREQ awaiting a PINGRESP.
pub const CODE_PING: &str = "ping";
/// Answering a peer's PINGREQ.
pub const CODE_PONG: &str = "pong";
/// Sending an application message.
pub const CODE_PUBLISH: &str = "publish";
/// Receiving an application message.
pub const CODE_MESSAGE: &str = "message";
pub const CODE_SUBSCRIBE: &str = "subscribe";
pub const CODE_UNSUBSCRIBE: &str = "unsubscribe";

// ── Errors ────────────────────────────────────────────────────────────────────

/// Hard errors raised while driving a flow.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FlowError {
    /// A SUBACK carried a different number of return codes than there are
    /// subscriptions.
    #[error("expected {expected} return codes but got {actual}")]
    ReturnCodeMismatch { expected: usize, actual: usize },

    /// `next` was called with a packet the flow does not accept.
    #[error("flow '{flow}' cannot handle a {packet} packet")]
    UnexpectedPacket { flow: &'static str, packet: PacketType },

    /// A QoS 1/2 message arrived without a packet identifier.
    #[error("a packet identifier is required for QoS 1 and 2")]
    MissingIdentifier,

    /// Subscribe and unsubscribe need at least one subscription.
    #[error("at least one subscription is required")]
    EmptySubscriptions,

    /// Building an outbound packet failed validation.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

// ── Results ───────────────────────────────────────────────────────────────────

/// Value a successful flow hands back to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowResult {
    Connection(Connection),
    Message(Message),
    Subscription(Subscription),
    Subscriptions(Vec<Subscription>),
}

// ── Status ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum FlowState {
    #[default]
    Active,
    Succeeded,
    Failed,
}

/// Completion state shared by every flow.
///
/// Moves from active to succeeded or failed exactly once; later calls to
/// [`succeed`](Self::succeed) or [`fail`](Self::fail) are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlowStatus {
    state: FlowState,
    result: Option<FlowResult>,
    error_message: String,
}

impl FlowStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_finished(&self) -> bool {
        self.state != FlowState::Active
    }

    pub fn is_success(&self) -> bool {
        self.state == FlowState::Succeeded
    }

    pub fn result(&self) -> Option<&FlowResult> {
        self.result.as_ref()
    }

    /// Empty unless the flow failed.
    pub fn error_message(&self) -> &str {
        &self.error_message
    }

    pub fn succeed(&mut self, code: &str, result: Option<FlowResult>) {
        if self.is_finished() {
            return;
        }
        debug!(flow = code, "flow succeeded");
        self.state = FlowState::Succeeded;
        self.result = result;
    }

    pub fn fail(&mut self, code: &str, message: impl Into<String>) {
        if self.is_finished() {
            return;
        }
        let message = message.into();
        debug!(flow = code, "flow failed: {message}");
        self.state = FlowState::Failed;
        self.error_message = message;
    }
}

// ── Flow trait ────────────────────────────────────────────────────────────────

/// One protocol exchange.
///
/// Implementors provide the exchange logic and expose their [`FlowStatus`];
/// the completion accessors are derived from it.
pub trait Flow: Send {
    /// Stable tag naming the exchange kind, e.g. `"publish"`.
    fn code(&self) -> &'static str;

    /// Begins the exchange and returns the first outbound packet, if any.
    fn start(&mut self) -> Result<Option<Packet>, FlowError>;

    /// Whether this flow handles `packet`.  Always false once finished.
    fn accept(&self, packet: &Packet) -> bool;

    /// Advances the exchange with an accepted packet and returns the reply,
    /// if any.
    fn next(&mut self, packet: &Packet) -> Result<Option<Packet>, FlowError>;

    fn status(&self) -> &FlowStatus;

    fn is_finished(&self) -> bool {
        self.status().is_finished()
    }

    fn is_success(&self) -> bool {
        self.status().is_success()
    }

    fn result(&self) -> Option<&FlowResult> {
        self.status().result()
    }

    fn error_message(&self) -> &str {
        self.status().error_message()
    }
}

/// Error for a packet handed to `next` that the flow did not accept.
pub(crate) fn unexpected(flow: &'static str, packet: &Packet) -> FlowError {
    FlowError::UnexpectedPacket {
        flow,
        packet: packet.packet_type(),
    }
}

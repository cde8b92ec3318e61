//! Wire-level message protocol shared by the UI, the main process and the
//! backend process.
//!
//! Every message travels inside a [`MessageEnvelope`]. Envelopes arriving
//! from outside the process are checked with the structural guards in
//! [`guards`] before anything is trusted.

pub mod envelope;
pub mod error;
pub mod guards;
pub mod messages;
pub mod outbox;
pub mod topics;

pub use envelope::MessageEnvelope;
pub use error::{ProtocolError, ProtocolErrorCode, ProtocolResult, WireResult};
pub use guards::{is_client_to_server_message, is_server_to_client_message};
pub use messages::{
    ChatWindowCreatePayload, ClientToServerMessage, ForwardedServerEvent, KnownClientPayload,
    LogsSendPayload, RuntimeAckPayload, RuntimePingPayload, ServerToClientMessage,
};
pub use outbox::{DESKTOP_EVENT_QUEUE_CAPACITY, ServerEventOutbox};
pub use topics::{ClientTopic, ServerTopic};

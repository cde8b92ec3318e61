use super::envelope::MessageEnvelope;
use super::guards::is_server_to_client_message;
use super::topics::{ClientTopic, ServerTopic};

use humantime::format_rfc3339_millis;
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use std::time::SystemTime;

/// UI → backend message. The payload stays an open object because unknown
/// topics are forwarded untouched.
pub type ClientToServerMessage = MessageEnvelope<ClientTopic, Map<String, Value>>;

impl MessageEnvelope<ClientTopic, Map<String, Value>> {
    /// Builds a fresh envelope with a random id and the current time.
    pub fn new(topic: ClientTopic, payload: Option<Map<String, Value>>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            topic,
            sent_at: format_rfc3339_millis(SystemTime::now()).to_string(),
            payload,
        }
    }

    /// Decodes the payload of a known topic into its typed shape.
    ///
    /// Returns `None` for [`ClientTopic::Other`]. An absent payload decodes
    /// as an empty object.
    pub fn known_payload(&self) -> Option<Result<KnownClientPayload, serde_json::Error>> {
        let payload = Value::Object(self.payload.clone().unwrap_or_default());

        let decoded = match self.topic {
            ClientTopic::ChatWindowCreate => {
                serde_json::from_value(payload).map(KnownClientPayload::ChatWindowCreate)
            }
            ClientTopic::LogsSend => serde_json::from_value(payload).map(KnownClientPayload::LogsSend),
            ClientTopic::RuntimePing => {
                serde_json::from_value(payload).map(KnownClientPayload::RuntimePing)
            }
            ClientTopic::Other(_) => return None,
        };

        Some(decoded)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatWindowCreatePayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogsSendPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimePingPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum KnownClientPayload {
    ChatWindowCreate(ChatWindowCreatePayload),
    LogsSend(LogsSendPayload),
    RuntimePing(RuntimePingPayload),
}

/// Payload of `runtime.ack`. Kept as the raw object so every ack the guard
/// accepts decodes; fields of an unexpected type read as absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuntimeAckPayload(pub Map<String, Value>);

impl RuntimeAckPayload {
    pub fn request_id(&self) -> Option<&str> {
        self.0.get("requestId").and_then(Value::as_str)
    }

    pub fn message(&self) -> Option<&str> {
        self.0.get("message").and_then(Value::as_str)
    }
}

/// Payload of `event.forward`: an event channel name plus opaque data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForwardedServerEvent {
    pub event: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

/// Backend → UI message, discriminated by `topic`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "topic")]
pub enum ServerToClientMessage {
    #[serde(rename = "runtime.ack")]
    RuntimeAck {
        id: String,
        #[serde(rename = "sentAt")]
        sent_at: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        payload: Option<RuntimeAckPayload>,
    },
    #[serde(rename = "event.forward")]
    EventForward {
        id: String,
        #[serde(rename = "sentAt")]
        sent_at: String,
        payload: ForwardedServerEvent,
    },
}

impl ServerToClientMessage {
    /// Guard first, then typed decode. Every value the guard accepts
    /// decodes; the second step only fails on a broken invariant and is
    /// logged at debug like a guard rejection.
    pub fn from_value(value: Value) -> Option<Self> {
        if !is_server_to_client_message(&value) {
            debug!("Dropping malformed server message: {value}");
            return None;
        }

        match serde_json::from_value(value) {
            Ok(message) => Some(message),
            Err(error) => {
                debug!("Dropping undecodable server message: {error}");
                None
            }
        }
    }

    pub fn id(&self) -> &str {
        match self {
            ServerToClientMessage::RuntimeAck { id, .. }
            | ServerToClientMessage::EventForward { id, .. } => id,
        }
    }

    pub fn sent_at(&self) -> &str {
        match self {
            ServerToClientMessage::RuntimeAck { sent_at, .. }
            | ServerToClientMessage::EventForward { sent_at, .. } => sent_at,
        }
    }

    pub fn topic(&self) -> ServerTopic {
        match self {
            ServerToClientMessage::RuntimeAck { .. } => ServerTopic::RuntimeAck,
            ServerToClientMessage::EventForward { .. } => ServerTopic::EventForward,
        }
    }
}

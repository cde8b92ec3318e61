use serde::{Deserialize, Serialize};

use std::fmt::{Display, Formatter, Result as FmtResult};

pub const CHAT_WINDOW_CREATE_TOPIC: &str = "desktop.chat-window.create";
pub const LOGS_SEND_TOPIC: &str = "desktop.logs.send";
pub const RUNTIME_PING_TOPIC: &str = "runtime.ping";

pub const RUNTIME_ACK_TOPIC: &str = "runtime.ack";
pub const EVENT_FORWARD_TOPIC: &str = "event.forward";

/// Topic of a UI → backend message.
///
/// The known topics are closed, but the set stays open for forward
/// compatibility: anything else is carried through as [`ClientTopic::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ClientTopic {
    ChatWindowCreate,
    LogsSend,
    RuntimePing,
    Other(String),
}

impl ClientTopic {
    pub fn as_str(&self) -> &str {
        match self {
            ClientTopic::ChatWindowCreate => CHAT_WINDOW_CREATE_TOPIC,
            ClientTopic::LogsSend => LOGS_SEND_TOPIC,
            ClientTopic::RuntimePing => RUNTIME_PING_TOPIC,
            ClientTopic::Other(topic) => topic,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, ClientTopic::Other(_))
    }
}

impl From<&str> for ClientTopic {
    fn from(topic: &str) -> Self {
        match topic {
            CHAT_WINDOW_CREATE_TOPIC => ClientTopic::ChatWindowCreate,
            LOGS_SEND_TOPIC => ClientTopic::LogsSend,
            RUNTIME_PING_TOPIC => ClientTopic::RuntimePing,
            other => ClientTopic::Other(other.to_string()),
        }
    }
}

impl From<String> for ClientTopic {
    fn from(topic: String) -> Self {
        match ClientTopic::from(topic.as_str()) {
            ClientTopic::Other(_) => ClientTopic::Other(topic),
            known => known,
        }
    }
}

impl From<ClientTopic> for String {
    fn from(topic: ClientTopic) -> Self {
        match topic {
            ClientTopic::Other(topic) => topic,
            known => known.as_str().to_string(),
        }
    }
}

impl Display for ClientTopic {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// Topic of a backend → UI message. Closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServerTopic {
    #[serde(rename = "runtime.ack")]
    RuntimeAck,
    #[serde(rename = "event.forward")]
    EventForward,
}

impl ServerTopic {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ServerTopic::RuntimeAck => RUNTIME_ACK_TOPIC,
            ServerTopic::EventForward => EVENT_FORWARD_TOPIC,
        }
    }
}

impl Display for ServerTopic {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

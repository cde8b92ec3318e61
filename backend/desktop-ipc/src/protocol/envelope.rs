use serde::{Deserialize, Serialize};

/// Common wrapper for every protocol message.
///
/// `sent_at` is an ISO-8601 timestamp string; it is carried verbatim and
/// never parsed by this crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageEnvelope<T, P> {
    pub id: String,
    pub topic: T,
    pub sent_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<P>,
}

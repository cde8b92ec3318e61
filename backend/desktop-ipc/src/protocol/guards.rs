//! Structural guards for envelopes received from outside the process.
//!
//! Guards answer "does this value have the right shape?" and never fail.
//! Typed decoding happens afterwards in [`super::messages`].

use super::topics::{EVENT_FORWARD_TOPIC, RUNTIME_ACK_TOPIC};

use serde_json::{Map, Value};

const ENVELOPE_FIELDS: [&str; 3] = ["id", "topic", "sentAt"];

fn has_envelope_fields(candidate: &Map<String, Value>) -> bool {
    ENVELOPE_FIELDS.iter().all(|field| {
        candidate
            .get(*field)
            .and_then(Value::as_str)
            .is_some_and(|value| !value.is_empty())
    })
}

fn payload_is_absent_or_object(candidate: &Map<String, Value>) -> bool {
    candidate.get("payload").is_none_or(Value::is_object)
}

/// Accepts an object with non-empty string `id`, `topic` and `sentAt`, and a
/// `payload` that is absent or an object. The topic is not checked against
/// the known set.
pub fn is_client_to_server_message(value: &Value) -> bool {
    let Some(candidate) = value.as_object() else {
        return false;
    };

    has_envelope_fields(candidate) && payload_is_absent_or_object(candidate)
}

/// Accepts `runtime.ack` with an absent-or-object payload and
/// `event.forward` whose payload is an object carrying a string `event`.
pub fn is_server_to_client_message(value: &Value) -> bool {
    let Some(candidate) = value.as_object() else {
        return false;
    };

    if !has_envelope_fields(candidate) {
        return false;
    }

    match candidate.get("topic").and_then(Value::as_str) {
        Some(RUNTIME_ACK_TOPIC) => payload_is_absent_or_object(candidate),
        Some(EVENT_FORWARD_TOPIC) => candidate
            .get("payload")
            .and_then(Value::as_object)
            .and_then(|payload| payload.get("event"))
            .is_some_and(Value::is_string),
        _ => false,
    }
}

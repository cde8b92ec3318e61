//! Converts arbitrary failures into a [`ProtocolError`].
//!
//! Resolution order, first match wins:
//!
//! 1. an object with a recognized `code` and a string `message` passes
//!    through, keeping `details` (objects only) and `retryable` (booleans only)
//! 2. an object `cause` is normalized recursively
//! 3. a non-empty string `message` becomes `IPC_INTERNAL`
//! 4. otherwise `IPC_INTERNAL` with the caller's fallback message
//!
//! [`normalize_error`] applies the same order to native error chains, where
//! the chain's `source()` plays the role of `cause`.

use crate::protocol::{ProtocolError, ProtocolErrorCode};

use serde_json::Value;

use std::error::Error as StdError;

pub fn normalize_ipc_error(error: &Value, fallback_message: &str) -> ProtocolError {
    if let Value::Object(candidate) = error {
        let code = candidate
            .get("code")
            .and_then(Value::as_str)
            .and_then(ProtocolErrorCode::from_code);
        let message = candidate.get("message").and_then(Value::as_str);

        if let (Some(code), Some(message)) = (code, message) {
            let mut normalized = ProtocolError::new(code, message);
            if let Some(Value::Object(details)) = candidate.get("details") {
                normalized.details = Some(details.clone());
            }
            if let Some(Value::Bool(retryable)) = candidate.get("retryable") {
                normalized.retryable = Some(*retryable);
            }
            return normalized;
        }

        if let Some(cause @ Value::Object(_)) = candidate.get("cause") {
            return normalize_ipc_error(cause, fallback_message);
        }

        if let Some(message) = message.filter(|message| !message.is_empty()) {
            return ProtocolError::internal(message);
        }
    }

    ProtocolError::internal(fallback_message)
}

pub fn normalize_error(error: &(dyn StdError + 'static), fallback_message: &str) -> ProtocolError {
    if let Some(protocol_error) = error.downcast_ref::<ProtocolError>() {
        return protocol_error.clone();
    }

    if let Some(cause) = error.source() {
        return normalize_error(cause, fallback_message);
    }

    let message = error.to_string();
    if message.is_empty() {
        ProtocolError::internal(fallback_message)
    } else {
        ProtocolError::internal(message)
    }
}

// Unit tests for the failure normalizer.

use crate::error::{TransportError, normalize_error, normalize_ipc_error};
use crate::protocol::{ProtocolError, ProtocolErrorCode};

use common::ErrorLocation;

use serde_json::json;
use thiserror::Error;

use std::io;
use std::panic::Location;

#[derive(Debug, Error)]
#[error("wrapper failed")]
struct Wrapper {
    #[source]
    source: ProtocolError,
}

#[derive(Debug, Error)]
#[error("")]
struct Silent;

/// **VALUE**: A well-formed protocol error passes through untouched.
///
/// **WHY THIS MATTERS**: Handlers reject with precise codes like
/// `IPC_NOT_FOUND`; the UI must see those codes, not a generic failure.
///
/// **BUG THIS CATCHES**: Would catch a normalizer that drops `details` or
/// `retryable`, or downgrades a known code to `IPC_INTERNAL`.
#[test]
fn given_well_formed_protocol_error_when_normalized_then_passes_through() {
    // GIVEN: A rejection value with all optional fields
    let error = json!({
        "code": "IPC_NOT_FOUND",
        "message": "IPC channel is not implemented: get-settings",
        "details": {"channel": "get-settings"},
        "retryable": false,
    });

    // WHEN: Normalizing it
    let normalized = normalize_ipc_error(&error, "fallback");

    // THEN: Every field survives
    assert_eq!(normalized.code, ProtocolErrorCode::IpcNotFound);
    assert_eq!(normalized.message, "IPC channel is not implemented: get-settings");
    assert_eq!(normalized.details.unwrap()["channel"], "get-settings");
    assert_eq!(normalized.retryable, Some(false));
}

#[test]
fn given_wrongly_typed_optional_fields_when_normalized_then_they_are_dropped() {
    let error = json!({
        "code": "IPC_IO_ERROR",
        "message": "disk",
        "details": ["not", "an", "object"],
        "retryable": "yes",
    });

    let normalized = normalize_ipc_error(&error, "fallback");

    assert_eq!(normalized.code, ProtocolErrorCode::IpcIoError);
    assert!(normalized.details.is_none());
    assert!(normalized.retryable.is_none());
}

#[test]
fn given_wrapped_error_when_normalized_then_cause_is_used() {
    // GIVEN: A wrapper with an unknown code and a well-formed cause
    let error = json!({
        "code": "E_WRAPPED",
        "message": "outer",
        "cause": {"code": "IPC_UNAUTHORIZED", "message": "bad secret"},
    });

    // WHEN / THEN: The cause wins over the outer message
    let normalized = normalize_ipc_error(&error, "fallback");
    assert_eq!(normalized, ProtocolError::new(ProtocolErrorCode::IpcUnauthorized, "bad secret"));
}

#[test]
fn given_unknown_code_with_message_when_normalized_then_internal_with_message() {
    let normalized = normalize_ipc_error(&json!({"code": "ENOENT", "message": "no such file"}), "fallback");

    assert_eq!(normalized, ProtocolError::internal("no such file"));
}

#[test]
fn given_unusable_values_when_normalized_then_fallback_message_used() {
    let candidates = [
        json!(null),
        json!("plain string"),
        json!(42),
        json!({"message": ""}),
        json!({"cause": "not an object"}),
    ];

    for candidate in &candidates {
        assert_eq!(
            normalize_ipc_error(candidate, "IPC call failed for channel: read-file"),
            ProtocolError::internal("IPC call failed for channel: read-file"),
            "candidate {candidate}"
        );
    }
}

#[test]
fn given_native_error_chain_when_normalized_then_protocol_source_found() {
    // GIVEN: A native error whose source is a protocol error
    let error = Wrapper {
        source: ProtocolError::io("Bridge POST failed with status 500"),
    };

    // WHEN / THEN: The protocol error is surfaced as-is
    let normalized = normalize_error(&error, "fallback");
    assert_eq!(normalized.code, ProtocolErrorCode::IpcIoError);
}

#[test]
fn given_plain_native_errors_when_normalized_then_message_or_fallback_used() {
    let io_error = io::Error::other("connection refused");
    assert_eq!(
        normalize_error(&io_error, "fallback"),
        ProtocolError::internal("connection refused")
    );

    assert_eq!(normalize_error(&Silent, "fallback"), ProtocolError::internal("fallback"));
}

#[test]
fn given_transport_errors_when_normalized_then_rejections_decode_and_failures_keep_message() {
    // GIVEN: A rejection carrying a serialized protocol error, and a bare failure
    let rejected = TransportError::from(ProtocolError::invalid_input("Payload must be an object"));
    let failed = TransportError::Failed {
        message: "No handler registered for 'x'".to_string(),
        location: ErrorLocation::from(Location::caller()),
    };

    // WHEN / THEN: Each normalizes through its own path
    assert_eq!(
        rejected.normalize("fallback"),
        ProtocolError::invalid_input("Payload must be an object")
    );
    assert_eq!(
        failed.normalize("fallback"),
        ProtocolError::internal("No handler registered for 'x'")
    );
}

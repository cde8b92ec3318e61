//! The diagnostics "send logs" request to the backend.

use crate::bridge::{BackendEndpoint, HttpTransport};
use crate::contracts::SendLogsResult;
use crate::error::HttpError;

use common::ErrorLocation;

use humantime::format_rfc3339_millis;
use log::error;
use serde_json::{Value, json};

use std::panic::Location;
use std::time::SystemTime;

pub const SEND_LOGS_COMMAND: &str = "/send-logs";
pub const SEND_LOGS_SESSION_ID: &str = "desktop-send-logs";
pub const REPLY_PATH: &str = "/reply";

/// Asks the backend to bundle and ship its logs.
///
/// Never fails: every problem is reported as `ok: false` with a short
/// user-facing message, and the details go to the log.
pub async fn execute_send_logs_request(
    http: &dyn HttpTransport,
    endpoint: &BackendEndpoint,
) -> SendLogsResult {
    let Some(base_url) = endpoint.base_url() else {
        return SendLogsResult::failed("Backend is not ready");
    };
    let Some(secret) = endpoint.secret() else {
        return SendLogsResult::failed("Backend auth is unavailable");
    };

    let url = BackendEndpoint::url_for(&base_url, REPLY_PATH);
    let body = send_logs_body(SystemTime::now());

    let reply = match http.post_json(&url, secret.expose(), &body).await {
        Ok(reply) => reply,
        Err(request_error) => {
            error!("Send logs request failed: {request_error}");
            return SendLogsResult::failed("Send logs request failed");
        }
    };

    if !reply.status.is_success() {
        return SendLogsResult::failed(format!("Send logs request failed ({})", reply.status));
    }

    match parse_send_logs_reply(&reply.body) {
        Ok(result) => result,
        Err(parse_error) => {
            error!(
                "Send logs response invalid: {parse_error}; body: {}",
                reply.body
            );
            SendLogsResult::failed("Send logs response is invalid")
        }
    }
}

pub fn send_logs_body(created: SystemTime) -> Value {
    json!({
        "session_id": SEND_LOGS_SESSION_ID,
        "user_message": {
            "role": "user",
            "created": format_rfc3339_millis(created).to_string(),
            "content": [{ "type": "text", "text": SEND_LOGS_COMMAND }],
        },
    })
}

/// Reads the first `data: ` line of an SSE reply as a [`SendLogsResult`].
/// Empty optional paths are dropped.
pub fn parse_send_logs_reply(body: &str) -> Result<SendLogsResult, HttpError> {
    let data = body
        .split('\n')
        .map(str::trim)
        .find_map(|line| line.strip_prefix("data: "))
        .ok_or_else(|| body_error("Send logs response is missing SSE data frame"))?;

    let parsed: Value = serde_json::from_str(data).map_err(|error| body_error(error.to_string()))?;

    let (Some(ok), Some(message)) = (
        parsed.get("ok").and_then(Value::as_bool),
        parsed.get("message").and_then(Value::as_str),
    ) else {
        return Err(body_error("Send logs response payload is invalid"));
    };

    let optional_path = |key: &str| {
        parsed
            .get(key)
            .and_then(Value::as_str)
            .filter(|path| !path.is_empty())
            .map(str::to_string)
    };

    Ok(SendLogsResult {
        ok,
        message: message.to_string(),
        artifact_path: optional_path("artifactPath"),
        remote_path: optional_path("remotePath"),
    })
}

#[track_caller]
fn body_error(message: impl Into<String>) -> HttpError {
    HttpError::Body {
        message: message.into(),
        location: ErrorLocation::from(Location::caller()),
    }
}

//! Payload parsing for registry handlers.
//!
//! Each parser turns an untyped IPC payload into a typed value or a
//! `IPC_INVALID_INPUT` [`ProtocolError`]. Nothing downstream of these
//! functions touches raw JSON.

use crate::contracts::{CreateChatWindowPayload, NotifyPayload, ThemeChange};
use crate::protocol::{ClientToServerMessage, ProtocolError, is_client_to_server_message};

use serde_json::{Map, Value};
use url::Url;

/// Schemes `open-external` accepts.
pub const EXTERNAL_URL_SCHEMES: &[&str] = &["http", "https", "mailto"];

/// Schemes accepted wherever a page is fetched or opened in a browser.
pub const WEB_URL_SCHEMES: &[&str] = &["http", "https"];

pub const INVALID_CLIENT_MESSAGE: &str = "Invalid client message envelope";

pub fn as_record(payload: Option<&Value>) -> Result<&Map<String, Value>, ProtocolError> {
    payload
        .and_then(Value::as_object)
        .ok_or_else(|| ProtocolError::invalid_input("Payload must be an object"))
}

/// Like [`as_record`], but an absent payload reads as an empty object.
pub fn as_optional_record(payload: Option<&Value>) -> Result<Map<String, Value>, ProtocolError> {
    match payload {
        None => Ok(Map::new()),
        Some(_) => as_record(payload).cloned(),
    }
}

/// The value must be a string that is non-empty after trimming. The
/// untrimmed value is returned.
pub fn require_string(record: &Map<String, Value>, key: &str) -> Result<String, ProtocolError> {
    match record.get(key) {
        Some(Value::String(value)) if !value.trim().is_empty() => Ok(value.clone()),
        _ => Err(ProtocolError::invalid_input(format!(
            "Field {key} must be a non-empty string"
        ))),
    }
}

pub fn optional_string(
    record: &Map<String, Value>,
    key: &str,
) -> Result<Option<String>, ProtocolError> {
    match record.get(key) {
        None => Ok(None),
        Some(Value::String(value)) => Ok(Some(value.clone())),
        Some(_) => Err(ProtocolError::invalid_input(format!(
            "Field {key} must be a string"
        ))),
    }
}

/// Parses `value` and checks its scheme against `allowed`. Returns the
/// normalized URL string.
pub fn assert_safe_url(value: &str, allowed: &[&str]) -> Result<String, ProtocolError> {
    let url = Url::parse(value).map_err(|_| ProtocolError::invalid_input("Invalid URL payload"))?;

    if !allowed.contains(&url.scheme()) {
        return Err(ProtocolError::invalid_input("URL protocol is not allowed")
            .with_detail("protocol", format!("{}:", url.scheme())));
    }

    Ok(url.to_string())
}

pub fn parse_notify(payload: Option<&Value>) -> Result<NotifyPayload, ProtocolError> {
    let input = as_record(payload)?;
    let title = optional_string(input, "title")?.filter(|title| !title.is_empty());
    let body = optional_string(input, "body")?.filter(|body| !body.is_empty());

    match (title, body) {
        (Some(title), Some(body)) => Ok(NotifyPayload { title, body }),
        _ => Err(ProtocolError::invalid_input(
            "notify payload must include title and body",
        )),
    }
}

pub fn parse_theme_change(payload: Option<&Value>) -> Result<ThemeChange, ProtocolError> {
    let input = as_record(payload)?;
    let mode = optional_string(input, "mode")?.filter(|mode| !mode.is_empty());
    let theme = optional_string(input, "theme")?.filter(|theme| !theme.is_empty());
    let use_system_theme = input.get("useSystemTheme").and_then(Value::as_bool);

    match (mode, theme, use_system_theme) {
        (Some(mode), Some(theme), Some(use_system_theme)) => Ok(ThemeChange {
            mode,
            use_system_theme,
            theme,
        }),
        _ => Err(ProtocolError::invalid_input(
            "broadcast-theme-change payload is invalid",
        )),
    }
}

/// An empty `query` is treated as absent.
pub fn parse_create_chat_window(
    payload: Option<&Value>,
) -> Result<CreateChatWindowPayload, ProtocolError> {
    let input = as_optional_record(payload)?;
    let query = optional_string(&input, "query")?.filter(|query| !query.is_empty());
    Ok(CreateChatWindowPayload { query })
}

/// `{url}` payload for commands that open a web page.
pub fn parse_web_url(payload: Option<&Value>) -> Result<String, ProtocolError> {
    let input = as_record(payload)?;
    let url = optional_string(input, "url")?
        .filter(|url| !url.is_empty())
        .ok_or_else(|| ProtocolError::invalid_input("URL is required"))?;
    assert_safe_url(&url, WEB_URL_SCHEMES)
}

pub fn parse_client_message(payload: Option<Value>) -> Result<ClientToServerMessage, ProtocolError> {
    let value = payload
        .filter(is_client_to_server_message)
        .ok_or_else(|| ProtocolError::invalid_input(INVALID_CLIENT_MESSAGE))?;

    serde_json::from_value(value).map_err(|_| ProtocolError::invalid_input(INVALID_CLIENT_MESSAGE))
}

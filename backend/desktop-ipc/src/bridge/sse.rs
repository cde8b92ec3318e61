use crate::protocol::ServerToClientMessage;

use log::debug;
use serde_json::Value;

pub const SSE_DATA_PREFIX: &str = "data: ";

/// Splits a stream body into blank-line separated frames and decodes every
/// `data: <json>` frame that is a valid server message. Everything else is
/// skipped.
pub fn parse_sse_messages(raw: &str) -> Vec<ServerToClientMessage> {
    raw.split("\n\n")
        .map(str::trim)
        .filter_map(|frame| frame.strip_prefix(SSE_DATA_PREFIX))
        .filter_map(|data| match serde_json::from_str::<Value>(data) {
            Ok(value) => ServerToClientMessage::from_value(value),
            Err(error) => {
                debug!("Skipping unparseable SSE frame: {error}");
                None
            }
        })
        .collect()
}

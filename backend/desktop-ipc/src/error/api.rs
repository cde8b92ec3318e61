use common::ErrorLocation;

use thiserror::Error as ThisError;

/// Failure surfaced by the typed [`crate::client::DesktopApi`] helpers.
///
/// `message` is formatted as `<code>: <message>`.
#[derive(Debug, ThisError)]
pub enum DesktopApiError {
    #[error("Desktop API Error: {message} {location}")]
    Call {
        message: String,
        location: ErrorLocation,
    },
}

impl DesktopApiError {
    pub fn message(&self) -> &str {
        match self {
            DesktopApiError::Call { message, .. } => message,
        }
    }
}

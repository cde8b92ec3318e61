use super::normalize::normalize_ipc_error;
use crate::protocol::ProtocolError;

use common::ErrorLocation;

use serde_json::Value;
use thiserror::Error as ThisError;

use std::panic::Location;

#[derive(Debug, ThisError)]
pub enum TransportError {
    /// The handler rejected the call with a serialized error value.
    #[error("Rejected Error: {payload} {location}")]
    Rejected {
        payload: Value,
        location: ErrorLocation,
    },

    /// The call never reached a handler.
    #[error("Transport Error: {message} {location}")]
    Failed {
        message: String,
        location: ErrorLocation,
    },
}

impl TransportError {
    pub fn normalize(&self, fallback_message: &str) -> ProtocolError {
        match self {
            TransportError::Rejected { payload, .. } => normalize_ipc_error(payload, fallback_message),
            TransportError::Failed { message, .. } if !message.is_empty() => {
                ProtocolError::internal(message.clone())
            }
            TransportError::Failed { .. } => ProtocolError::internal(fallback_message),
        }
    }
}

impl From<ProtocolError> for TransportError {
    #[track_caller]
    fn from(error: ProtocolError) -> Self {
        let location = ErrorLocation::from(Location::caller());
        match serde_json::to_value(&error) {
            Ok(payload) => TransportError::Rejected { payload, location },
            Err(_) => TransportError::Failed {
                message: error.to_string(),
                location,
            },
        }
    }
}

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use thiserror::Error as ThisError;

use std::fmt::{Display, Formatter, Result as FmtResult};

/// Canonical failure classification shared by every IPC surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProtocolErrorCode {
    IpcInvalidInput,
    IpcUnauthorized,
    IpcUnsupportedPlatform,
    IpcNotFound,
    IpcIoError,
    IpcInternal,
}

impl ProtocolErrorCode {
    pub const ALL: &'static [ProtocolErrorCode] = &[
        ProtocolErrorCode::IpcInvalidInput,
        ProtocolErrorCode::IpcUnauthorized,
        ProtocolErrorCode::IpcUnsupportedPlatform,
        ProtocolErrorCode::IpcNotFound,
        ProtocolErrorCode::IpcIoError,
        ProtocolErrorCode::IpcInternal,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            ProtocolErrorCode::IpcInvalidInput => "IPC_INVALID_INPUT",
            ProtocolErrorCode::IpcUnauthorized => "IPC_UNAUTHORIZED",
            ProtocolErrorCode::IpcUnsupportedPlatform => "IPC_UNSUPPORTED_PLATFORM",
            ProtocolErrorCode::IpcNotFound => "IPC_NOT_FOUND",
            ProtocolErrorCode::IpcIoError => "IPC_IO_ERROR",
            ProtocolErrorCode::IpcInternal => "IPC_INTERNAL",
        }
    }

    /// Looks up a code by its wire name. Unrecognized names yield `None`.
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|candidate| candidate.as_str() == code)
    }
}

impl Display for ProtocolErrorCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// The single error shape that crosses the process boundary.
///
/// Serializes as `{code, message, details?, retryable?}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ThisError)]
#[error("{code}: {message}")]
pub struct ProtocolError {
    pub code: ProtocolErrorCode,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retryable: Option<bool>,
}

impl ProtocolError {
    pub fn new(code: ProtocolErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
            retryable: None,
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ProtocolErrorCode::IpcInvalidInput, message)
    }

    pub fn unsupported_platform(message: impl Into<String>) -> Self {
        Self::new(ProtocolErrorCode::IpcUnsupportedPlatform, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ProtocolErrorCode::IpcNotFound, message)
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::new(ProtocolErrorCode::IpcIoError, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ProtocolErrorCode::IpcInternal, message)
    }

    pub fn with_details(mut self, details: Map<String, Value>) -> Self {
        self.details = Some(details);
        self
    }

    /// Adds a single `key: value` entry to `details`.
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details
            .get_or_insert_with(Map::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn with_retryable(mut self, retryable: bool) -> Self {
        self.retryable = Some(retryable);
        self
    }
}

pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Wire rendering of a [`ProtocolResult`]: `{ok: true, data}` or
/// `{ok: false, error}`.
pub struct WireResult<'a, T>(pub &'a ProtocolResult<T>);

impl<T: Serialize> Serialize for WireResult<'_, T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ProtocolResult", 2)?;
        match self.0 {
            Ok(data) => {
                state.serialize_field("ok", &true)?;
                state.serialize_field("data", data)?;
            }
            Err(error) => {
                state.serialize_field("ok", &false)?;
                state.serialize_field("error", error)?;
            }
        }
        state.end()
    }
}

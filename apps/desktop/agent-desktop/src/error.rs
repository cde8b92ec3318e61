use desktop_ipc::error::{ConfigError, HttpError};

use common::ErrorLocation;

use serde::Serialize;
use thiserror::Error;

use std::panic::Location;

/// Errors raised by the main-process host.
///
/// Serializable so startup failures can be reported in the same tagged
/// shape the UI receives for other host errors.
#[derive(Debug, Error, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum HostError {
    /// Error from host wiring or startup
    #[error("Host Error: {message} {location}")]
    Host {
        message: String,
        location: ErrorLocation,
    },

    /// Environment configuration could not be loaded
    #[error("Config Error: {message} {location}")]
    Config {
        message: String,
        location: ErrorLocation,
    },

    /// The backend process could not be reached or answered badly
    #[error("Backend Error: {message} {location}")]
    Backend {
        message: String,
        location: ErrorLocation,
    },

    /// An OS facility (file opener, data directory) failed
    #[error("Platform Error: {message} {location}")]
    Platform {
        message: String,
        location: ErrorLocation,
    },
}

impl HostError {
    /// The message without the location suffix, for user-facing surfaces.
    pub fn message(&self) -> &str {
        match self {
            HostError::Host { message, .. }
            | HostError::Config { message, .. }
            | HostError::Backend { message, .. }
            | HostError::Platform { message, .. } => message,
        }
    }
}

impl From<ConfigError> for HostError {
    #[track_caller]
    fn from(error: ConfigError) -> Self {
        HostError::Config {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<HttpError> for HostError {
    #[track_caller]
    fn from(error: HttpError) -> Self {
        HostError::Backend {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<reqwest::Error> for HostError {
    #[track_caller]
    fn from(error: reqwest::Error) -> Self {
        HostError::Backend {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

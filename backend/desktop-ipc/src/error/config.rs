use common::ErrorLocation;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config Parse Error: {variable}: {reason} {location}")]
    ParseError {
        location: ErrorLocation,
        variable: String,
        reason: String,
    },

    #[error("Config Validation Error: {reason} {location}")]
    ValidationError {
        location: ErrorLocation,
        reason: String,
    },
}

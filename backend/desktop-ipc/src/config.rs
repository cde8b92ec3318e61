//! Environment-driven configuration for the desktop IPC layer.

use crate::error::ConfigError;
use crate::{BACKEND_DEFAULT_BASE_URL, BACKEND_DEFAULT_HOSTNAME, BACKEND_DEFAULT_PORT};

use common::{ErrorLocation, RedactedSecret};

use log::{debug, info};
use url::Url;

use std::panic::Location;
use std::str::FromStr;
use std::time::Duration;

pub const BACKEND_URL_VAR: &str = "AGENT_DESKTOP_BACKEND_URL";
pub const BACKEND_PORT_VAR: &str = "AGENT_DESKTOP_BACKEND_PORT";
pub const SECRET_KEY_VAR: &str = "SERVER_SECRET_KEY";
pub const RECONNECT_DELAY_VAR: &str = "AGENT_DESKTOP_RECONNECT_DELAY_MS";
pub const NOTIFICATION_DEDUP_VAR: &str = "AGENT_DESKTOP_NOTIFICATION_DEDUP_MS";
pub const DEV_MODE_VAR: &str = "AGENT_DESKTOP_DEV";

const DEFAULT_SECRET_KEY: &str = "dev-secret";
const DEFAULT_RECONNECT_DELAY_MS: u64 = 1_000;
const DEFAULT_NOTIFICATION_DEDUP_MS: u64 = 30_000;

#[derive(Debug, Clone)]
pub struct DesktopConfig {
    pub backend_url: String,
    pub secret_key: RedactedSecret,
    pub reconnect_delay: Duration,
    pub notification_dedup_window: Duration,
    pub is_dev: bool,
}

impl Default for DesktopConfig {
    fn default() -> Self {
        Self {
            backend_url: BACKEND_DEFAULT_BASE_URL.to_string(),
            secret_key: RedactedSecret::from(DEFAULT_SECRET_KEY),
            reconnect_delay: Duration::from_millis(DEFAULT_RECONNECT_DELAY_MS),
            notification_dedup_window: Duration::from_millis(DEFAULT_NOTIFICATION_DEDUP_MS),
            is_dev: false,
        }
    }
}

fn default_backend_url(port: u16) -> String {
    format!("http://{BACKEND_DEFAULT_HOSTNAME}:{port}")
}

impl DesktopConfig {
    /// Loads `.env` if present, then reads the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a variable cannot be parsed or the
    /// resulting config fails [`Self::validate`].
    pub fn from_env() -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(path) => info!("Loaded environment from {}", path.display()),
            Err(error) => debug!("No .env file loaded: {error}"),
        }

        Self::from_lookup(|variable| std::env::var(variable).ok())
    }

    /// Builds the config from an arbitrary variable source. Unset and empty
    /// variables take their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let lookup = |variable: &str| lookup(variable).filter(|value| !value.trim().is_empty());

        let port = match lookup(BACKEND_PORT_VAR) {
            Some(raw) => parse_var::<u16>(BACKEND_PORT_VAR, &raw)?,
            None => BACKEND_DEFAULT_PORT,
        };

        let backend_url = lookup(BACKEND_URL_VAR).unwrap_or_else(|| default_backend_url(port));

        let secret_key = RedactedSecret::new(
            lookup(SECRET_KEY_VAR).unwrap_or_else(|| DEFAULT_SECRET_KEY.to_string()),
        );

        let reconnect_delay = match lookup(RECONNECT_DELAY_VAR) {
            Some(raw) => Duration::from_millis(parse_var::<u64>(RECONNECT_DELAY_VAR, &raw)?),
            None => Duration::from_millis(DEFAULT_RECONNECT_DELAY_MS),
        };

        let notification_dedup_window = match lookup(NOTIFICATION_DEDUP_VAR) {
            Some(raw) => Duration::from_millis(parse_var::<u64>(NOTIFICATION_DEDUP_VAR, &raw)?),
            None => Duration::from_millis(DEFAULT_NOTIFICATION_DEDUP_MS),
        };

        let is_dev = match lookup(DEV_MODE_VAR) {
            Some(raw) => parse_flag(DEV_MODE_VAR, &raw)?,
            None => false,
        };

        let config = Self {
            backend_url,
            secret_key,
            reconnect_delay,
            notification_dedup_window,
            is_dev,
        };
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = Url::parse(&self.backend_url).map_err(|e| ConfigError::ValidationError {
            location: ErrorLocation::from(Location::caller()),
            reason: format!("Invalid backend URL '{}': {e}", self.backend_url),
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: format!("Backend URL must be http or https, got '{}'", url.scheme()),
            });
        }

        if self.secret_key.is_empty() {
            return Err(ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: "Secret key must not be empty".to_string(),
            });
        }

        if self.reconnect_delay.is_zero() {
            return Err(ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: "Reconnect delay must be greater than zero".to_string(),
            });
        }

        Ok(())
    }
}

fn parse_var<T>(variable: &str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::ParseError {
        location: ErrorLocation::from(Location::caller()),
        variable: variable.to_string(),
        reason: e.to_string(),
    })
}

fn parse_flag(variable: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::ParseError {
            location: ErrorLocation::from(Location::caller()),
            variable: variable.to_string(),
            reason: format!("expected a boolean, got '{other}'"),
        }),
    }
}

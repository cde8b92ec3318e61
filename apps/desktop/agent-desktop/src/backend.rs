//! Plain HTTP probes: backend health, local model server, link metadata.

use crate::error::HostError;

use desktop_ipc::bridge::BackendEndpoint;

use common::{ErrorLocation, HttpStatusCode};

use log::{debug, info};
use reqwest::Client;

use std::panic::Location;
use std::time::Duration;

pub const HEALTH_PATH: &str = "/status";
pub const OLLAMA_TAGS_URL: &str = "http://127.0.0.1:11434/api/tags";
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// How long [`wait_for_health`] keeps asking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthCheck {
    pub attempts: u32,
    pub interval: Duration,
}

impl Default for HealthCheck {
    fn default() -> Self {
        Self {
            attempts: 40,
            interval: Duration::from_millis(250),
        }
    }
}

pub fn probe_client() -> Result<Client, HostError> {
    Ok(Client::builder().timeout(PROBE_TIMEOUT).build()?)
}

/// Polls `GET <base_url>/status` until it answers 2xx.
///
/// # Errors
///
/// Returns [`HostError::Backend`] once every attempt has failed.
pub async fn wait_for_health(
    client: &Client,
    base_url: &str,
    check: HealthCheck,
) -> Result<(), HostError> {
    let location = ErrorLocation::from(Location::caller());
    let url = BackendEndpoint::url_for(base_url, HEALTH_PATH);

    for attempt in 1..=check.attempts {
        match client.get(&url).send().await {
            Ok(response) if response.status().is_success() => {
                info!("Backend healthy at {base_url} (attempt {attempt})");
                return Ok(());
            }
            Ok(response) => debug!("Health check {attempt} got {}", response.status()),
            Err(e) => debug!("Health check {attempt} failed: {e}"),
        }

        if attempt < check.attempts {
            tokio::time::sleep(check.interval).await;
        }
    }

    Err(HostError::Backend {
        message: "Backend health check timed out".to_string(),
        location,
    })
}

pub async fn check_ollama(client: &Client, url: &str) -> bool {
    match client.get(url).send().await {
        Ok(response) => response.status().is_success(),
        Err(e) => {
            debug!("Ollama probe failed: {e}");
            false
        }
    }
}

/// Fetches `url` and returns the body text, used for link previews.
pub async fn fetch_metadata(client: &Client, url: &str) -> Result<String, HostError> {
    let location = ErrorLocation::from(Location::caller());
    let response = client.get(url).send().await?;
    let status = HttpStatusCode::from(response.status().as_u16());

    if !status.is_success() {
        return Err(HostError::Backend {
            message: format!("Fetching {url} failed with status {status}"),
            location,
        });
    }

    Ok(response.text().await?)
}

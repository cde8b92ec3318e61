use common::RedactedSecret;

use std::sync::{Arc, PoisonError, RwLock};

#[derive(Debug, Default)]
struct EndpointState {
    base_url: Option<String>,
    secret: Option<RedactedSecret>,
}

/// Where the backend lives and how to authenticate to it.
///
/// Shared between the bridge and other backend callers; the host fills it
/// once the backend process is up and clears it when it goes away.
#[derive(Debug, Clone, Default)]
pub struct BackendEndpoint {
    state: Arc<RwLock<EndpointState>>,
}

impl BackendEndpoint {
    pub fn new(base_url: impl Into<String>, secret: RedactedSecret) -> Self {
        let endpoint = Self::default();
        endpoint.set(base_url, secret);
        endpoint
    }

    pub fn set(&self, base_url: impl Into<String>, secret: RedactedSecret) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.base_url = Some(base_url.into());
        state.secret = Some(secret);
    }

    pub fn clear(&self) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.base_url = None;
        state.secret = None;
    }

    /// `None` when unset or empty.
    pub fn base_url(&self) -> Option<String> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.base_url.clone().filter(|url| !url.is_empty())
    }

    /// `None` when unset or empty.
    pub fn secret(&self) -> Option<RedactedSecret> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.secret.clone().filter(|secret| !secret.is_empty())
    }

    /// Both values, or `None` if either is missing.
    pub fn ready(&self) -> Option<(String, RedactedSecret)> {
        Some((self.base_url()?, self.secret()?))
    }

    /// Joins `path` onto the base URL without doubling the slash.
    pub fn url_for(base_url: &str, path: &str) -> String {
        format!("{}{}", base_url.trim_end_matches('/'), path)
    }
}

use log::{info, warn};

use std::sync::{PoisonError, RwLock};

/// What the UI is told about the backend in `desktop:get-state`.
#[derive(Debug, Default)]
pub struct BackendState {
    error: RwLock<String>,
}

impl BackendState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_error(&self, message: impl Into<String>) {
        let message = message.into();
        warn!("Backend unavailable: {message}");
        *self.error.write().unwrap_or_else(PoisonError::into_inner) = message;
    }

    pub fn clear_error(&self) {
        let mut error = self.error.write().unwrap_or_else(PoisonError::into_inner);
        if !error.is_empty() {
            info!("Backend error cleared");
            error.clear();
        }
    }

    /// Empty when the backend is fine.
    pub fn error(&self) -> String {
        self.error.read().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

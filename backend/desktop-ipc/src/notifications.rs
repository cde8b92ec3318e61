//! OS notification dedup contract.
//!
//! Presentation is the transport's business; this service decides what to
//! show and suppresses repeats of the same code and backend inside a
//! window.

use crate::contracts::NotifyPayload;
use crate::error::NotificationError;

use log::{error, info, warn};
use serde::{Deserialize, Serialize};

use std::collections::HashMap;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

pub const NOTIFICATION_TITLE: &str = "Agent Desktop";
pub const DEFAULT_DEDUP_WINDOW: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NotificationCode {
    #[serde(rename = "runtime.preflight.failed")]
    RuntimePreflightFailed,
    #[serde(rename = "runtime.backend.ready")]
    RuntimeBackendReady,
    #[serde(rename = "runtime.backend.start_failed")]
    RuntimeBackendStartFailed,
    #[serde(rename = "diagnostics.send_logs.succeeded")]
    SendLogsSucceeded,
    #[serde(rename = "diagnostics.send_logs.failed")]
    SendLogsFailed,
}

impl NotificationCode {
    pub const fn as_str(&self) -> &'static str {
        match self {
            NotificationCode::RuntimePreflightFailed => "runtime.preflight.failed",
            NotificationCode::RuntimeBackendReady => "runtime.backend.ready",
            NotificationCode::RuntimeBackendStartFailed => "runtime.backend.start_failed",
            NotificationCode::SendLogsSucceeded => "diagnostics.send_logs.succeeded",
            NotificationCode::SendLogsFailed => "diagnostics.send_logs.failed",
        }
    }

    pub const fn body(&self) -> &'static str {
        match self {
            NotificationCode::RuntimePreflightFailed => {
                "Startup checks failed. Open app logs for details."
            }
            NotificationCode::RuntimeBackendReady => "Local backend is ready.",
            NotificationCode::RuntimeBackendStartFailed => {
                "Failed to start local backend. Open app logs for details."
            }
            NotificationCode::SendLogsSucceeded => "Logs prepared for sending.",
            NotificationCode::SendLogsFailed => "Failed to send logs. Open app logs for details.",
        }
    }

    pub fn payload(&self) -> NotifyPayload {
        NotifyPayload {
            title: NOTIFICATION_TITLE.to_string(),
            body: self.body().to_string(),
        }
    }
}

impl Display for NotificationCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationEvent {
    pub code: NotificationCode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<NotificationContext>,
}

impl NotificationEvent {
    pub fn new(code: NotificationCode) -> Self {
        Self { code, context: None }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.context.get_or_insert_with(NotificationContext::default).base_url =
            Some(base_url.into());
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.context.get_or_insert_with(NotificationContext::default).message = Some(message.into());
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.context.get_or_insert_with(NotificationContext::default).reason = Some(reason.into());
        self
    }

    fn dedup_key(&self) -> (NotificationCode, String) {
        let base_url = self
            .context
            .as_ref()
            .and_then(|context| context.base_url.clone())
            .unwrap_or_default();
        (self.code, base_url)
    }
}

pub trait NotificationTransport: Send + Sync {
    fn is_supported(&self) -> bool;

    fn show(&self, payload: &NotifyPayload) -> Result<(), NotificationError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyOutcome {
    Shown,
    Suppressed,
    Unsupported,
    Failed,
}

type Clock = Box<dyn Fn() -> Duration + Send + Sync>;

pub struct NotificationService {
    transport: Arc<dyn NotificationTransport>,
    clock: Clock,
    dedup_window: Duration,
    last_emitted_at: Mutex<HashMap<(NotificationCode, String), Duration>>,
}

impl NotificationService {
    pub fn new(transport: Arc<dyn NotificationTransport>) -> Self {
        let origin = Instant::now();
        Self {
            transport,
            clock: Box::new(move || origin.elapsed()),
            dedup_window: DEFAULT_DEDUP_WINDOW,
            last_emitted_at: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_dedup_window(mut self, dedup_window: Duration) -> Self {
        self.dedup_window = dedup_window;
        self
    }

    /// Replaces the monotonic clock. The closure returns the time elapsed
    /// since any fixed origin.
    pub fn with_clock(mut self, clock: impl Fn() -> Duration + Send + Sync + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn notify(&self, event: &NotificationEvent) -> NotifyOutcome {
        if !self.transport.is_supported() {
            warn!("Notifications unsupported, dropping {}", event.code);
            return NotifyOutcome::Unsupported;
        }

        let now = (self.clock)();
        {
            let mut last_emitted_at = self
                .last_emitted_at
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            let key = event.dedup_key();

            let within_window = last_emitted_at
                .get(&key)
                .is_some_and(|last| now.saturating_sub(*last) < self.dedup_window);

            if within_window {
                warn!(
                    "Notification {} suppressed (dedup window {}ms)",
                    event.code,
                    self.dedup_window.as_millis()
                );
                return NotifyOutcome::Suppressed;
            }

            last_emitted_at.insert(key, now);
        }

        match self.transport.show(&event.code.payload()) {
            Ok(()) => {
                info!("Notification {} shown", event.code);
                NotifyOutcome::Shown
            }
            Err(show_error) => {
                error!("Notification {} failed: {show_error}", event.code);
                NotifyOutcome::Failed
            }
        }
    }
}

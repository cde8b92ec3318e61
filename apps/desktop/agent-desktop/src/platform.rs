//! Headless stand-ins for the windowing and notification shell, plus the
//! system opener used for external URLs and directories.

use crate::error::HostError;

use desktop_ipc::contracts::NotifyPayload;
use desktop_ipc::error::NotificationError;
use desktop_ipc::notifications::NotificationTransport;
use desktop_ipc::registry::WindowController;

use common::ErrorLocation;

use log::info;
use tokio::process::Command;

use std::panic::Location;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

#[cfg(target_os = "macos")]
const SYSTEM_OPENER: &str = "open";

#[cfg(target_os = "windows")]
const SYSTEM_OPENER: &str = "explorer";

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
const SYSTEM_OPENER: &str = "xdg-open";

/// A window with no surface: actions are logged and tracked.
#[derive(Debug)]
pub struct LogWindow {
    name: String,
    visible: AtomicBool,
    closed: AtomicBool,
    reloads: AtomicU32,
}

impl LogWindow {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            visible: AtomicBool::new(true),
            closed: AtomicBool::new(false),
            reloads: AtomicU32::new(0),
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn reloads(&self) -> u32 {
        self.reloads.load(Ordering::SeqCst)
    }
}

impl WindowController for LogWindow {
    fn show(&self) {
        info!("Window '{}': show", self.name);
        self.visible.store(true, Ordering::SeqCst);
        self.closed.store(false, Ordering::SeqCst);
    }

    fn focus(&self) {
        info!("Window '{}': focus", self.name);
    }

    fn hide(&self) {
        info!("Window '{}': hide", self.name);
        self.visible.store(false, Ordering::SeqCst);
    }

    fn close(&self) {
        info!("Window '{}': close", self.name);
        self.visible.store(false, Ordering::SeqCst);
        self.closed.store(true, Ordering::SeqCst);
    }

    fn reload(&self) {
        info!("Window '{}': reload", self.name);
        self.reloads.fetch_add(1, Ordering::SeqCst);
    }
}

/// Writes notifications to the log.
#[derive(Debug, Default)]
pub struct LogNotificationTransport;

impl NotificationTransport for LogNotificationTransport {
    fn is_supported(&self) -> bool {
        true
    }

    fn show(&self, payload: &NotifyPayload) -> Result<(), NotificationError> {
        info!("Notification: {}: {}", payload.title, payload.body);
        Ok(())
    }
}

/// Hands `target` (URL or path) to the platform opener without waiting for it.
#[track_caller]
pub fn open_with_system(target: &str) -> Result<(), HostError> {
    let location = ErrorLocation::from(Location::caller());
    Command::new(SYSTEM_OPENER)
        .arg(target)
        .spawn()
        .map(|_| info!("Opened {target} with {SYSTEM_OPENER}"))
        .map_err(|e| HostError::Platform {
            message: format!("Failed to open {target}: {e}"),
            location,
        })
}

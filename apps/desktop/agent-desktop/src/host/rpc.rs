use crate::backend::{OLLAMA_TAGS_URL, check_ollama, fetch_metadata};
use crate::files;
use crate::platform::open_with_system;
use crate::state::BackendState;

use desktop_ipc::bridge::{BackendEndpoint, DesktopServerMessageBridge, HttpTransport};
use desktop_ipc::contracts::{Accepted, AppDirs, DesktopState, FileReadResult, SendLogsResult};
use desktop_ipc::notifications::{NotificationCode, NotificationEvent, NotificationService};
use desktop_ipc::protocol::{ClientToServerMessage, ProtocolError, ProtocolResult};
use desktop_ipc::registry::RpcDependencies;
use desktop_ipc::send_logs::execute_send_logs_request;

use log::{info, warn};
use reqwest::Client;
use serde_json::Value;
use url::Url;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

pub const RECENT_DIRS_LIMIT: usize = 10;

const SEND_LOGS_IN_PROGRESS: &str = "Send logs already in progress";
const NO_DIALOGS_MESSAGE: &str = "File dialogs are not available in headless mode";

/// Clears the in-progress flag however the send-logs future ends.
struct InProgress<'a>(&'a AtomicBool);

impl Drop for InProgress<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub struct HostRpc {
    pub(super) is_dev: bool,
    pub(super) app_dirs: Option<AppDirs>,
    pub(super) endpoint: BackendEndpoint,
    pub(super) backend: Arc<BackendState>,
    pub(super) http: Arc<dyn HttpTransport>,
    pub(super) bridge: Arc<DesktopServerMessageBridge>,
    pub(super) probe: Client,
    pub(super) notifications: Arc<NotificationService>,
    pub(super) recent_dirs: Mutex<Vec<String>>,
    pub(super) sending_logs: AtomicBool,
}

impl HostRpc {
    pub fn recent_dirs(&self) -> Vec<String> {
        self.recent_dirs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn notify_send_logs(&self, result: &SendLogsResult) {
        let event = if result.ok {
            NotificationEvent::new(NotificationCode::SendLogsSucceeded)
        } else {
            NotificationEvent::new(NotificationCode::SendLogsFailed).with_reason(&result.message)
        };
        self.notifications.notify(&event);
    }
}

impl RpcDependencies for HostRpc {
    fn get_state(&self) -> DesktopState {
        DesktopState {
            backend_url: self.endpoint.base_url().unwrap_or_default(),
            backend_error: self.backend.error(),
            windows_preflight_messages: Vec::new(),
            app_dirs: self.app_dirs.clone(),
            is_dev: self.is_dev,
        }
    }

    async fn send_logs(&self) -> SendLogsResult {
        if self.sending_logs.swap(true, Ordering::SeqCst) {
            return SendLogsResult::failed(SEND_LOGS_IN_PROGRESS);
        }
        let _in_progress = InProgress(&self.sending_logs);

        let result = execute_send_logs_request(self.http.as_ref(), &self.endpoint).await;
        info!("Send logs finished: ok={} message={}", result.ok, result.message);
        self.notify_send_logs(&result);
        result
    }

    fn get_goosed_host_port(&self) -> Option<String> {
        let base_url = self.endpoint.base_url()?;
        let url = Url::parse(&base_url).ok()?;
        let host = url.host_str()?;
        let port = url.port_or_known_default()?;
        Some(format!("{host}:{port}"))
    }

    async fn choose_directory(&self) -> ProtocolResult<Value> {
        Err(ProtocolError::unsupported_platform(NO_DIALOGS_MESSAGE))
    }

    async fn select_file_or_directory(
        &self,
        _default_path: Option<String>,
    ) -> ProtocolResult<Option<String>> {
        Err(ProtocolError::unsupported_platform(NO_DIALOGS_MESSAGE))
    }

    async fn read_file(&self, file_path: String) -> ProtocolResult<FileReadResult> {
        Ok(files::read_file(file_path).await)
    }

    async fn write_file(&self, file_path: String, content: String) -> ProtocolResult<bool> {
        Ok(files::write_file(&file_path, &content).await)
    }

    async fn ensure_directory(&self, dir_path: String) -> ProtocolResult<bool> {
        Ok(files::ensure_directory(&dir_path).await)
    }

    async fn list_files(
        &self,
        dir_path: String,
        extension: Option<String>,
    ) -> ProtocolResult<Vec<String>> {
        Ok(files::list_files(&dir_path, extension.as_deref()).await)
    }

    fn get_allowed_extensions(&self) -> Vec<String> {
        files::DEFAULT_ALLOWED_EXTENSIONS
            .iter()
            .map(|extension| extension.to_string())
            .collect()
    }

    async fn open_directory_in_explorer(&self, path: String) -> ProtocolResult<bool> {
        if !files::is_directory(&path).await {
            warn!("Not opening {path}: not a directory");
            return Ok(false);
        }

        open_with_system(&path)
            .map(|()| true)
            .map_err(|error| ProtocolError::io(error.message()))
    }

    fn add_recent_dir(&self, dir: String) -> ProtocolResult<Option<bool>> {
        let mut recent = self
            .recent_dirs
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        recent.retain(|existing| *existing != dir);
        recent.insert(0, dir);
        recent.truncate(RECENT_DIRS_LIMIT);
        Ok(Some(true))
    }

    async fn open_external(&self, url: String) -> ProtocolResult<()> {
        open_with_system(&url).map_err(|error| ProtocolError::io(error.message()))
    }

    async fn fetch_metadata(&self, url: String) -> ProtocolResult<String> {
        fetch_metadata(&self.probe, &url)
            .await
            .map_err(|error| ProtocolError::io(error.message()).with_detail("url", url))
    }

    async fn check_ollama(&self) -> bool {
        check_ollama(&self.probe, OLLAMA_TAGS_URL).await
    }

    async fn send_client_message(&self, message: ClientToServerMessage) -> ProtocolResult<Accepted> {
        self.bridge.send(&message).await
    }
}

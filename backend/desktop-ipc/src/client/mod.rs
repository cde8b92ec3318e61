//! UI-facing adapter over a [`RendererTransport`].
//!
//! `invoke` never fails with a raw transport error: every rejection is
//! normalized into a [`ProtocolError`].

mod subscription;

pub use subscription::Subscription;

use crate::contracts::{
    Accepted, AddRecentDirRequest, CmdChannel, DesktopState, EnsureDirectoryRequest, EventChannel,
    FileReadResult, IPC_MESSAGE_EVENT_CHANNEL, ListFilesRequest, OpenDirectoryRequest,
    ReadFileRequest, RpcChannel, SelectFileOrDirectoryRequest, SendLogsResult, UrlRequest,
    WriteFileRequest,
};
use crate::error::DesktopApiError;
use crate::protocol::{ClientToServerMessage, ProtocolError, ProtocolResult, ServerToClientMessage};
use crate::transport::{EventListener, RendererTransport};

use common::ErrorLocation;

use log::debug;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use std::panic::Location;
use std::sync::Arc;

pub struct DesktopApi<T: RendererTransport> {
    transport: Arc<T>,
}

impl<T: RendererTransport> Clone for DesktopApi<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
        }
    }
}

impl<T: RendererTransport> DesktopApi<T> {
    pub fn new(transport: Arc<T>) -> Self {
        Self { transport }
    }

    pub async fn invoke(&self, channel: RpcChannel, payload: Option<Value>) -> ProtocolResult<Value> {
        self.transport
            .invoke(channel.as_str(), payload)
            .await
            .map_err(|error| error.normalize(&format!("IPC call failed for channel: {channel}")))
    }

    /// [`Self::invoke`] followed by a typed decode of the response.
    pub async fn invoke_as<R: DeserializeOwned>(
        &self,
        channel: RpcChannel,
        payload: Option<Value>,
    ) -> ProtocolResult<R> {
        let data = self.invoke(channel, payload).await?;
        serde_json::from_value(data).map_err(|error| {
            ProtocolError::internal(format!("Invalid response for channel {channel}: {error}"))
        })
    }

    pub fn send(&self, channel: CmdChannel, payload: Option<Value>) {
        self.transport.send(channel.as_str(), payload);
    }

    pub fn on<F>(&self, channel: EventChannel, listener: F) -> Subscription
    where
        F: Fn(Option<Value>) + Send + Sync + 'static,
    {
        let wrapped: EventListener = Arc::new(move |payload: Option<&Value>| listener(payload.cloned()));
        self.listen(channel.as_str(), wrapped)
    }

    pub async fn get_state(&self) -> Result<DesktopState, DesktopApiError> {
        unwrap(self.invoke_as(RpcChannel::DesktopGetState, None).await)
    }

    pub async fn send_logs(&self) -> Result<SendLogsResult, DesktopApiError> {
        unwrap(self.invoke_as(RpcChannel::DesktopSendLogs, None).await)
    }

    pub async fn send_message(&self, message: &ClientToServerMessage) -> ProtocolResult<Accepted> {
        self.request(RpcChannel::DesktopSendMessage, message).await
    }

    pub async fn select_file_or_directory(
        &self,
        default_path: Option<String>,
    ) -> ProtocolResult<Option<String>> {
        let request = SelectFileOrDirectoryRequest { default_path };
        self.request(RpcChannel::SelectFileOrDirectory, &request).await
    }

    pub async fn read_file(&self, file_path: impl Into<String>) -> ProtocolResult<FileReadResult> {
        let request = ReadFileRequest {
            file_path: file_path.into(),
        };
        self.request(RpcChannel::ReadFile, &request).await
    }

    pub async fn write_file(
        &self,
        file_path: impl Into<String>,
        content: impl Into<String>,
    ) -> ProtocolResult<bool> {
        let request = WriteFileRequest {
            file_path: file_path.into(),
            content: content.into(),
        };
        self.request(RpcChannel::WriteFile, &request).await
    }

    pub async fn ensure_directory(&self, dir_path: impl Into<String>) -> ProtocolResult<bool> {
        let request = EnsureDirectoryRequest {
            dir_path: dir_path.into(),
        };
        self.request(RpcChannel::EnsureDirectory, &request).await
    }

    pub async fn list_files(
        &self,
        dir_path: impl Into<String>,
        extension: Option<String>,
    ) -> ProtocolResult<Vec<String>> {
        let request = ListFilesRequest {
            dir_path: dir_path.into(),
            extension,
        };
        self.request(RpcChannel::ListFiles, &request).await
    }

    pub async fn open_directory_in_explorer(&self, path: impl Into<String>) -> ProtocolResult<bool> {
        let request = OpenDirectoryRequest { path: path.into() };
        self.request(RpcChannel::OpenDirectoryInExplorer, &request).await
    }

    /// `None` when the main process did not record the directory.
    pub async fn add_recent_dir(&self, dir: impl Into<String>) -> ProtocolResult<Option<bool>> {
        let request = AddRecentDirRequest { dir: dir.into() };
        self.request(RpcChannel::AddRecentDir, &request).await
    }

    pub async fn open_external(&self, url: impl Into<String>) -> ProtocolResult<()> {
        let request = UrlRequest { url: url.into() };
        self.request(RpcChannel::OpenExternal, &request).await
    }

    pub async fn fetch_metadata(&self, url: impl Into<String>) -> ProtocolResult<String> {
        let request = UrlRequest { url: url.into() };
        self.request(RpcChannel::FetchMetadata, &request).await
    }

    /// Subscribes to every backend → UI message relayed by the main
    /// process. Relayed values that do not pass the server-message guard are
    /// dropped before reaching `listener`.
    pub fn subscribe_messages<F>(&self, listener: F) -> Subscription
    where
        F: Fn(ServerToClientMessage) + Send + Sync + 'static,
    {
        let wrapped: EventListener = Arc::new(move |payload: Option<&Value>| {
            let Some(payload) = payload else {
                debug!("Ignoring empty message event");
                return;
            };
            if let Some(message) = ServerToClientMessage::from_value(payload.clone()) {
                listener(message);
            }
        });
        self.listen(IPC_MESSAGE_EVENT_CHANNEL, wrapped)
    }

    pub fn renderer_ready(&self) {
        self.send(CmdChannel::ReactReady, None);
    }

    pub fn app_version_sync(&self) -> Option<String> {
        match self
            .transport
            .send_sync(CmdChannel::GetAppVersion.as_str(), None)
        {
            Some(Value::String(version)) => Some(version),
            _ => None,
        }
    }

    async fn request<P: Serialize, R: DeserializeOwned>(
        &self,
        channel: RpcChannel,
        payload: &P,
    ) -> ProtocolResult<R> {
        self.invoke_as(channel, Some(encode_request(payload)?)).await
    }

    fn listen(&self, channel: &str, listener: EventListener) -> Subscription {
        let id = self.transport.on(channel, listener);
        let transport = Arc::clone(&self.transport);
        let channel = channel.to_string();
        Subscription::new(move || {
            transport.remove_listener(&channel, id);
        })
    }
}

fn encode_request<P: Serialize>(payload: &P) -> ProtocolResult<Value> {
    serde_json::to_value(payload).map_err(|error| ProtocolError::invalid_input(error.to_string()))
}

/// Converts a failed result into an error whose message is
/// `<code>: <message>`.
#[track_caller]
pub fn unwrap<R>(result: ProtocolResult<R>) -> Result<R, DesktopApiError> {
    let location = ErrorLocation::from(Location::caller());
    result.map_err(|error| DesktopApiError::Call {
        message: format!("{}: {}", error.code, error.message),
        location,
    })
}

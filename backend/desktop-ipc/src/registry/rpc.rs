use super::validation::{
    EXTERNAL_URL_SCHEMES, WEB_URL_SCHEMES, as_optional_record, as_record, assert_safe_url,
    optional_string, parse_client_message, require_string,
};
use super::{InvokeEvent, RpcFuture, RpcHandler, RpcHandlerMap};
use crate::contracts::{Accepted, DesktopState, FileReadResult, RpcChannel, SendLogsResult};
use crate::protocol::{ClientToServerMessage, ProtocolError, ProtocolResult};

use serde::Serialize;
use serde_json::Value;

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

/// Collaborators behind the implemented RPC channels.
pub trait RpcDependencies: Send + Sync + 'static {
    fn get_state(&self) -> DesktopState;

    fn send_logs(&self) -> impl Future<Output = SendLogsResult> + Send;

    fn get_goosed_host_port(&self) -> Option<String>;

    fn choose_directory(&self) -> impl Future<Output = ProtocolResult<Value>> + Send;

    fn select_file_or_directory(
        &self,
        default_path: Option<String>,
    ) -> impl Future<Output = ProtocolResult<Option<String>>> + Send;

    fn read_file(&self, file_path: String)
    -> impl Future<Output = ProtocolResult<FileReadResult>> + Send;

    fn write_file(
        &self,
        file_path: String,
        content: String,
    ) -> impl Future<Output = ProtocolResult<bool>> + Send;

    fn ensure_directory(&self, dir_path: String) -> impl Future<Output = ProtocolResult<bool>> + Send;

    fn list_files(
        &self,
        dir_path: String,
        extension: Option<String>,
    ) -> impl Future<Output = ProtocolResult<Vec<String>>> + Send;

    fn get_allowed_extensions(&self) -> Vec<String>;

    fn open_directory_in_explorer(
        &self,
        path: String,
    ) -> impl Future<Output = ProtocolResult<bool>> + Send;

    /// `None` when the directory was not recorded.
    fn add_recent_dir(&self, dir: String) -> ProtocolResult<Option<bool>>;

    fn open_external(&self, url: String) -> impl Future<Output = ProtocolResult<()>> + Send;

    fn fetch_metadata(&self, url: String) -> impl Future<Output = ProtocolResult<String>> + Send;

    fn check_ollama(&self) -> impl Future<Output = bool> + Send;

    fn send_client_message(
        &self,
        message: ClientToServerMessage,
    ) -> impl Future<Output = ProtocolResult<Accepted>> + Send;
}

fn encode<T: Serialize>(data: T) -> ProtocolResult<Value> {
    serde_json::to_value(data)
        .map_err(|error| ProtocolError::internal(format!("Failed to encode IPC response: {error}")))
}

fn handler<D, F, Fut, T>(dependencies: &Arc<D>, run: F) -> RpcHandler
where
    D: RpcDependencies,
    F: Fn(Arc<D>, Option<Value>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ProtocolResult<T>> + Send + 'static,
    T: Serialize,
{
    let dependencies = Arc::clone(dependencies);
    Arc::new(move |payload: Option<Value>, _event: InvokeEvent| -> RpcFuture {
        let pending = run(Arc::clone(&dependencies), payload);
        Box::pin(async move { encode(pending.await?) })
    })
}

pub fn create_rpc_handler_map<D: RpcDependencies>(dependencies: Arc<D>) -> RpcHandlerMap {
    let deps = &dependencies;
    let mut implemented: HashMap<RpcChannel, RpcHandler> = HashMap::new();

    implemented.insert(
        RpcChannel::DesktopGetState,
        handler(deps, |deps, _| async move { Ok(deps.get_state()) }),
    );
    implemented.insert(
        RpcChannel::DesktopSendLogs,
        handler(deps, |deps, _| async move { Ok(deps.send_logs().await) }),
    );
    implemented.insert(
        RpcChannel::DesktopSendMessage,
        handler(deps, |deps, payload| async move {
            let message = parse_client_message(payload)?;
            deps.send_client_message(message).await
        }),
    );
    implemented.insert(
        RpcChannel::GetGoosedHostPort,
        handler(deps, |deps, _| async move { Ok(deps.get_goosed_host_port()) }),
    );
    implemented.insert(
        RpcChannel::DirectoryChooser,
        handler(deps, |deps, _| async move { deps.choose_directory().await }),
    );
    implemented.insert(
        RpcChannel::SelectFileOrDirectory,
        handler(deps, |deps, payload| async move {
            let input = as_optional_record(payload.as_ref())?;
            let default_path = optional_string(&input, "defaultPath")?;
            deps.select_file_or_directory(default_path).await
        }),
    );
    implemented.insert(
        RpcChannel::ReadFile,
        handler(deps, |deps, payload| async move {
            let file_path = require_string(as_record(payload.as_ref())?, "filePath")?;
            deps.read_file(file_path).await
        }),
    );
    implemented.insert(
        RpcChannel::WriteFile,
        handler(deps, |deps, payload| async move {
            let input = as_record(payload.as_ref())?;
            let file_path = require_string(input, "filePath")?;
            let content = require_string(input, "content")?;
            deps.write_file(file_path, content).await
        }),
    );
    implemented.insert(
        RpcChannel::EnsureDirectory,
        handler(deps, |deps, payload| async move {
            let dir_path = require_string(as_record(payload.as_ref())?, "dirPath")?;
            deps.ensure_directory(dir_path).await
        }),
    );
    implemented.insert(
        RpcChannel::ListFiles,
        handler(deps, |deps, payload| async move {
            let input = as_record(payload.as_ref())?;
            let dir_path = require_string(input, "dirPath")?;
            let extension = optional_string(input, "extension")?;
            deps.list_files(dir_path, extension).await
        }),
    );
    implemented.insert(
        RpcChannel::GetAllowedExtensions,
        handler(deps, |deps, _| async move { Ok(deps.get_allowed_extensions()) }),
    );
    implemented.insert(
        RpcChannel::OpenDirectoryInExplorer,
        handler(deps, |deps, payload| async move {
            let path = require_string(as_record(payload.as_ref())?, "path")?;
            deps.open_directory_in_explorer(path).await
        }),
    );
    implemented.insert(
        RpcChannel::AddRecentDir,
        handler(deps, |deps, payload| async move {
            let dir = require_string(as_record(payload.as_ref())?, "dir")?;
            deps.add_recent_dir(dir)
        }),
    );
    implemented.insert(
        RpcChannel::OpenExternal,
        handler(deps, |deps, payload| async move {
            let url = require_string(as_record(payload.as_ref())?, "url")?;
            let url = assert_safe_url(&url, EXTERNAL_URL_SCHEMES)?;
            deps.open_external(url).await
        }),
    );
    implemented.insert(
        RpcChannel::FetchMetadata,
        handler(deps, |deps, payload| async move {
            let url = require_string(as_record(payload.as_ref())?, "url")?;
            let url = assert_safe_url(&url, WEB_URL_SCHEMES)?;
            deps.fetch_metadata(url).await
        }),
    );
    implemented.insert(
        RpcChannel::CheckOllama,
        handler(deps, |deps, _| async move { Ok(deps.check_ollama().await) }),
    );

    RpcHandlerMap::from_implemented(implemented)
}

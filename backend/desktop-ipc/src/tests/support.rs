// Shared test doubles for unit tests.

use crate::bridge::{HttpReply, HttpTransport};
use crate::contracts::{Accepted, DesktopState, FileReadResult, NotifyPayload, SendLogsResult};
use crate::error::HttpError;
use crate::event_bus::RendererSink;
use crate::protocol::{ClientToServerMessage, ClientTopic, ProtocolError, ProtocolResult};
use crate::registry::{CmdDependencies, RpcDependencies, WindowController};

use common::HttpStatusCode;

use futures_util::future::BoxFuture;
use serde_json::{Map, Value, json};

use std::collections::VecDeque;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

pub struct RecordingSink {
    id: u32,
    destroyed: AtomicBool,
    pub sent: Mutex<Vec<(String, Option<Value>)>>,
}

impl RecordingSink {
    pub fn new(id: u32) -> Arc<Self> {
        Arc::new(Self {
            id,
            destroyed: AtomicBool::new(false),
            sent: Mutex::new(Vec::new()),
        })
    }

    pub fn destroy(&self) {
        self.destroyed.store(true, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<(String, Option<Value>)> {
        self.sent.lock().unwrap().clone()
    }
}

impl RendererSink for RecordingSink {
    fn id(&self) -> u32 {
        self.id
    }

    fn send(&self, channel: &str, payload: Option<&Value>) {
        self.sent
            .lock()
            .unwrap()
            .push((channel.to_string(), payload.cloned()));
    }

    fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::SeqCst)
    }
}

#[derive(Default)]
pub struct FakeRpc {
    pub calls: Mutex<Vec<String>>,
    pub sent_messages: Mutex<Vec<ClientToServerMessage>>,
}

impl FakeRpc {
    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl RpcDependencies for FakeRpc {
    fn get_state(&self) -> DesktopState {
        self.record("get_state");
        DesktopState {
            backend_url: "http://127.0.0.1:43111".to_string(),
            backend_error: String::new(),
            windows_preflight_messages: vec![],
            app_dirs: None,
            is_dev: true,
        }
    }

    async fn send_logs(&self) -> SendLogsResult {
        self.record("send_logs");
        SendLogsResult {
            ok: true,
            message: "sent".to_string(),
            artifact_path: Some("/tmp/logs.zip".to_string()),
            remote_path: None,
        }
    }

    fn get_goosed_host_port(&self) -> Option<String> {
        Some("127.0.0.1:43111".to_string())
    }

    async fn choose_directory(&self) -> ProtocolResult<Value> {
        Err(ProtocolError::unsupported_platform("no dialogs"))
    }

    async fn select_file_or_directory(&self, default_path: Option<String>) -> ProtocolResult<Option<String>> {
        self.record(format!("select:{}", default_path.clone().unwrap_or_default()));
        Ok(default_path)
    }

    async fn read_file(&self, file_path: String) -> ProtocolResult<FileReadResult> {
        self.record(format!("read_file:{file_path}"));
        Ok(FileReadResult {
            file: "contents".to_string(),
            file_path,
            error: None,
            found: true,
        })
    }

    async fn write_file(&self, file_path: String, content: String) -> ProtocolResult<bool> {
        self.record(format!("write_file:{file_path}:{content}"));
        Ok(true)
    }

    async fn ensure_directory(&self, dir_path: String) -> ProtocolResult<bool> {
        self.record(format!("ensure_directory:{dir_path}"));
        Ok(true)
    }

    async fn list_files(&self, dir_path: String, extension: Option<String>) -> ProtocolResult<Vec<String>> {
        self.record(format!("list_files:{dir_path}:{}", extension.unwrap_or_default()));
        Ok(vec!["a.md".to_string()])
    }

    fn get_allowed_extensions(&self) -> Vec<String> {
        vec![".md".to_string()]
    }

    async fn open_directory_in_explorer(&self, path: String) -> ProtocolResult<bool> {
        self.record(format!("open_directory:{path}"));
        Ok(true)
    }

    fn add_recent_dir(&self, dir: String) -> ProtocolResult<Option<bool>> {
        self.record(format!("add_recent_dir:{dir}"));
        Ok(None)
    }

    async fn open_external(&self, url: String) -> ProtocolResult<()> {
        self.record(format!("open_external:{url}"));
        Ok(())
    }

    async fn fetch_metadata(&self, url: String) -> ProtocolResult<String> {
        self.record(format!("fetch_metadata:{url}"));
        Ok("text/plain".to_string())
    }

    async fn check_ollama(&self) -> bool {
        false
    }

    async fn send_client_message(&self, message: ClientToServerMessage) -> ProtocolResult<Accepted> {
        self.sent_messages.lock().unwrap().push(message);
        Ok(Accepted::default())
    }
}

#[derive(Default)]
pub struct FakeWindow {
    pub actions: Mutex<Vec<&'static str>>,
}

impl FakeWindow {
    pub fn actions(&self) -> Vec<&'static str> {
        self.actions.lock().unwrap().clone()
    }
}

impl WindowController for FakeWindow {
    fn show(&self) {
        self.actions.lock().unwrap().push("show");
    }

    fn focus(&self) {
        self.actions.lock().unwrap().push("focus");
    }

    fn hide(&self) {
        self.actions.lock().unwrap().push("hide");
    }

    fn close(&self) {
        self.actions.lock().unwrap().push("close");
    }

    fn reload(&self) {
        self.actions.lock().unwrap().push("reload");
    }
}

/// Knows a single window, owned by renderer 7.
pub struct FakeCmd {
    pub window: Arc<FakeWindow>,
    pub notifications: Mutex<Vec<NotifyPayload>>,
    pub logs: Mutex<Vec<String>>,
    pub dispatched: Mutex<Vec<(ClientTopic, Map<String, Value>)>>,
    pub opened: Mutex<Vec<String>>,
    pub restarts: Mutex<u32>,
}

pub const WINDOW_OWNER_ID: u32 = 7;

impl Default for FakeCmd {
    fn default() -> Self {
        Self {
            window: Arc::new(FakeWindow::default()),
            notifications: Mutex::new(Vec::new()),
            logs: Mutex::new(Vec::new()),
            dispatched: Mutex::new(Vec::new()),
            opened: Mutex::new(Vec::new()),
            restarts: Mutex::new(0),
        }
    }
}

impl FakeCmd {
    pub fn logs(&self) -> Vec<String> {
        self.logs.lock().unwrap().clone()
    }
}

impl CmdDependencies for FakeCmd {
    fn notify(&self, payload: NotifyPayload) {
        self.notifications.lock().unwrap().push(payload);
    }

    fn log_info(&self, message: &str) {
        self.logs.lock().unwrap().push(message.to_string());
    }

    fn window_for_sender(&self, sender_id: u32) -> Option<Arc<dyn WindowController>> {
        (sender_id == WINDOW_OWNER_ID).then(|| self.window.clone() as Arc<dyn WindowController>)
    }

    fn ensure_main_window(&self) -> Arc<dyn WindowController> {
        self.window.clone()
    }

    fn restart_app(&self) {
        *self.restarts.lock().unwrap() += 1;
    }

    fn open_in_chrome(&self, url: String) {
        self.opened.lock().unwrap().push(url);
    }

    fn get_app_version(&self) -> String {
        "1.2.3".to_string()
    }

    fn dispatch_client_message(&self, topic: ClientTopic, payload: Map<String, Value>) {
        self.dispatched.lock().unwrap().push((topic, payload));
    }
}

pub enum Scripted {
    Reply(u16, String),
    Fail(&'static str),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub method: &'static str,
    pub url: String,
    pub secret: String,
    pub body: Option<Value>,
}

/// Answers requests from a script, in order; an exhausted script replies
/// 200 with an empty body.
#[derive(Default)]
pub struct FakeHttp {
    script: Mutex<VecDeque<Scripted>>,
    pub requests: Mutex<Vec<RecordedRequest>>,
}

impl FakeHttp {
    pub fn scripted(script: impl IntoIterator<Item = Scripted>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn answer(&self, request: RecordedRequest) -> Result<HttpReply, HttpError> {
        self.requests.lock().unwrap().push(request);
        match self.script.lock().unwrap().pop_front() {
            Some(Scripted::Reply(status, body)) => Ok(HttpReply {
                status: HttpStatusCode(status),
                body,
            }),
            Some(Scripted::Fail(message)) => Err(HttpError::request(io::Error::other(message))),
            None => Ok(HttpReply {
                status: HttpStatusCode(200),
                body: String::new(),
            }),
        }
    }
}

impl HttpTransport for FakeHttp {
    fn post_json<'a>(
        &'a self,
        url: &'a str,
        secret: &'a str,
        body: &'a Value,
    ) -> BoxFuture<'a, Result<HttpReply, HttpError>> {
        let reply = self.answer(RecordedRequest {
            method: "POST",
            url: url.to_string(),
            secret: secret.to_string(),
            body: Some(body.clone()),
        });
        Box::pin(async move { reply })
    }

    fn get_event_stream<'a>(
        &'a self,
        url: &'a str,
        secret: &'a str,
    ) -> BoxFuture<'a, Result<HttpReply, HttpError>> {
        let reply = self.answer(RecordedRequest {
            method: "GET",
            url: url.to_string(),
            secret: secret.to_string(),
            body: None,
        });
        Box::pin(async move { reply })
    }
}

pub fn forward_frame(id: &str, event: &str, payload: Value) -> String {
    let message = json!({
        "id": id,
        "topic": "event.forward",
        "sentAt": "2026-01-01T00:00:00.000Z",
        "payload": {"event": event, "payload": payload},
    });
    format!("data: {message}\n\n")
}

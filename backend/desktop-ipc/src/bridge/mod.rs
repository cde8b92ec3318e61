//! HTTP/SSE relay between the main process and the backend process.
//!
//! Outbound: UI envelopes are POSTed to `/desktop/messages`. Inbound: the
//! stream endpoint is polled in a loop with a fixed delay after every
//! iteration, whatever its outcome.

mod endpoint;
mod http;
mod sse;

pub use endpoint::BackendEndpoint;
pub use http::{HttpReply, HttpTransport, ReqwestTransport};
pub use sse::{SSE_DATA_PREFIX, parse_sse_messages};

use crate::contracts::{Accepted, EventChannel, EventMessage};
use crate::error::normalize_error;
use crate::event_bus::MainEventBus;
use crate::protocol::{
    ClientToServerMessage, ProtocolError, ProtocolResult, ServerToClientMessage,
    is_client_to_server_message,
};

use common::{HttpStatusCode, RedactedSecret};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

pub const DESKTOP_MESSAGES_PATH: &str = "/desktop/messages";
pub const DESKTOP_MESSAGES_STREAM_PATH: &str =
    const_format::concatcp!(DESKTOP_MESSAGES_PATH, "/stream");
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_millis(1_000);

const NOT_READY_MESSAGE: &str = "Backend bridge is not ready";
const INVALID_ENVELOPE_MESSAGE: &str = "Invalid client message envelope";
const POST_FAILED_MESSAGE: &str = "Bridge POST failed";
const STREAM_FAILED_MESSAGE: &str = "Bridge stream failed";

pub type MessageObserver = Arc<dyn Fn(&ServerToClientMessage) + Send + Sync>;

pub struct BridgeOptions {
    pub endpoint: BackendEndpoint,
    pub event_bus: Arc<MainEventBus>,
    pub http: Arc<dyn HttpTransport>,
    pub on_message: Option<MessageObserver>,
    pub reconnect_delay: Duration,
}

impl BridgeOptions {
    pub fn new(
        endpoint: BackendEndpoint,
        event_bus: Arc<MainEventBus>,
        http: Arc<dyn HttpTransport>,
    ) -> Self {
        Self {
            endpoint,
            event_bus,
            http,
            on_message: None,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
        }
    }

    pub fn on_message(
        mut self,
        observer: impl Fn(&ServerToClientMessage) + Send + Sync + 'static,
    ) -> Self {
        self.on_message = Some(Arc::new(observer));
        self
    }

    pub fn reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }
}

/// Result of a successful [`DesktopServerMessageBridge::poll_once`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollSummary {
    pub count: usize,
}

pub struct DesktopServerMessageBridge {
    options: BridgeOptions,
    running: AtomicBool,
    generation: AtomicU64,
}

impl DesktopServerMessageBridge {
    pub fn new(options: BridgeOptions) -> Self {
        Self {
            options,
            running: AtomicBool::new(false),
            generation: AtomicU64::new(0),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// POSTs `message` to the backend.
    ///
    /// The envelope is checked before anything else, and the endpoint is
    /// checked before any network I/O.
    pub async fn send(&self, message: &ClientToServerMessage) -> ProtocolResult<Accepted> {
        let body = serde_json::to_value(message)
            .ok()
            .filter(is_client_to_server_message)
            .ok_or_else(|| ProtocolError::invalid_input(INVALID_ENVELOPE_MESSAGE))?;

        self.post(&body).await
    }

    async fn post(&self, body: &Value) -> ProtocolResult<Accepted> {
        let (base_url, secret) = self.ready()?;
        let url = BackendEndpoint::url_for(&base_url, DESKTOP_MESSAGES_PATH);

        let reply = self
            .options
            .http
            .post_json(&url, secret.expose(), body)
            .await
            .map_err(|error| normalize_error(&error, POST_FAILED_MESSAGE))?;

        if !reply.status.is_success() {
            return Err(status_error(POST_FAILED_MESSAGE, reply.status));
        }

        Ok(Accepted::default())
    }

    /// Fetches the stream endpoint once and relays every parsed message.
    pub async fn poll_once(&self) -> ProtocolResult<PollSummary> {
        let (base_url, secret) = self.ready()?;
        let url = BackendEndpoint::url_for(&base_url, DESKTOP_MESSAGES_STREAM_PATH);

        let reply = self
            .options
            .http
            .get_event_stream(&url, secret.expose())
            .await
            .map_err(|error| normalize_error(&error, STREAM_FAILED_MESSAGE))?;

        if !reply.status.is_success() {
            return Err(status_error(STREAM_FAILED_MESSAGE, reply.status));
        }

        let messages = parse_sse_messages(&reply.body);
        for message in &messages {
            if let Some(event) = forwarded_event(message) {
                self.options.event_bus.emit_message(event);
            }
            if let Some(observer) = &self.options.on_message {
                observer(message);
            }
        }

        Ok(PollSummary {
            count: messages.len(),
        })
    }

    /// Spawns the poll loop. A no-op while already running.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime.
    pub fn start(self: &Arc<Self>) {
        if self.running.swap(true, Ordering::SeqCst) {
            debug!("Bridge poll loop already running");
            return;
        }

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let bridge = Arc::clone(self);
        tokio::spawn(async move { bridge.run(generation).await });
    }

    /// Prevents the next iteration from starting. An in-flight request is
    /// not aborted.
    pub fn stop(&self) {
        if self.running.swap(false, Ordering::SeqCst) {
            info!("Bridge poll loop stopping");
        }
    }

    async fn run(&self, generation: u64) {
        info!("Bridge poll loop started (generation {generation})");

        while self.is_current(generation) {
            if let Err(error) = self.poll_once().await {
                warn!(
                    "Bridge poll failed: code={} message={}",
                    error.code, error.message
                );
            }
            tokio::time::sleep(self.options.reconnect_delay).await;
        }

        debug!("Bridge poll loop exited (generation {generation})");
    }

    fn is_current(&self, generation: u64) -> bool {
        self.running.load(Ordering::SeqCst) && self.generation.load(Ordering::SeqCst) == generation
    }

    fn ready(&self) -> ProtocolResult<(String, RedactedSecret)> {
        self.options
            .endpoint
            .ready()
            .ok_or_else(|| ProtocolError::internal(NOT_READY_MESSAGE))
    }
}

fn status_error(prefix: &str, status: HttpStatusCode) -> ProtocolError {
    ProtocolError::io(format!("{prefix} with status {status}"))
        .with_detail("status", status.0)
        .with_retryable(status.is_retryable())
}

/// The bus event carried by an `event.forward` message, if its event name
/// is a declared event channel.
fn forwarded_event(message: &ServerToClientMessage) -> Option<EventMessage> {
    let ServerToClientMessage::EventForward { payload, .. } = message else {
        return None;
    };

    match payload.event.parse::<EventChannel>() {
        Ok(channel) => Some(EventMessage::new(channel, payload.payload.clone())),
        Err(error) => {
            debug!("Not forwarding backend event: {error}");
            None
        }
    }
}

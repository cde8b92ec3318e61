//! Shared helpers for the desktop IPC integration tests.

use desktop_ipc::bridge::{
    BackendEndpoint, BridgeOptions, DesktopServerMessageBridge, HttpReply, HttpTransport,
    ReqwestTransport,
};
use desktop_ipc::error::HttpError;
use desktop_ipc::event_bus::{MainEventBus, RendererSink};

use common::{HttpStatusCode, RedactedSecret};

use futures_util::future::BoxFuture;
use serde_json::{Value, json};

use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const TEST_SECRET: &str = "integration-secret";
pub const TEST_RENDERER_ID: u32 = 1;

/// Renderer stand-in that records every delivered event.
#[derive(Default)]
pub struct RecordingRenderer {
    delivered: Mutex<Vec<(String, Option<Value>)>>,
}

impl RecordingRenderer {
    pub fn delivered(&self) -> Vec<(String, Option<Value>)> {
        self.delivered.lock().unwrap().clone()
    }
}

impl RendererSink for RecordingRenderer {
    fn id(&self) -> u32 {
        TEST_RENDERER_ID
    }

    fn send(&self, channel: &str, payload: Option<&Value>) {
        self.delivered
            .lock()
            .unwrap()
            .push((channel.to_string(), payload.cloned()));
    }
}

/// Event bus whose only renderer is already ready.
pub fn ready_bus() -> (Arc<MainEventBus>, Arc<RecordingRenderer>) {
    let renderer = Arc::new(RecordingRenderer::default());
    let provider = Arc::clone(&renderer);
    let bus = Arc::new(MainEventBus::new(move || {
        Some(provider.clone() as Arc<dyn RendererSink>)
    }));
    bus.mark_renderer_ready(TEST_RENDERER_ID);
    (bus, renderer)
}

pub fn options_for(base_url: &str, bus: Arc<MainEventBus>) -> BridgeOptions {
    let endpoint = BackendEndpoint::new(base_url, RedactedSecret::from(TEST_SECRET));
    let http = ReqwestTransport::new().expect("Failed to build HTTP client");
    BridgeOptions::new(endpoint, bus, Arc::new(http)).reconnect_delay(Duration::from_millis(20))
}

pub fn bridge_for(base_url: &str, bus: Arc<MainEventBus>) -> Arc<DesktopServerMessageBridge> {
    Arc::new(DesktopServerMessageBridge::new(options_for(base_url, bus)))
}

pub fn sse_frame(message: Value) -> String {
    format!("data: {message}\n\n")
}

pub fn forward_message(id: &str, event: &str, payload: Value) -> Value {
    json!({
        "id": id,
        "topic": "event.forward",
        "sentAt": "2026-01-01T00:00:00.000Z",
        "payload": {"event": event, "payload": payload},
    })
}

pub fn ack_message(id: &str, request_id: &str) -> Value {
    json!({
        "id": id,
        "topic": "runtime.ack",
        "sentAt": "2026-01-01T00:00:00.000Z",
        "payload": {"requestId": request_id, "message": "pong"},
    })
}

pub fn bridge_with_transport(
    base_url: &str,
    bus: Arc<MainEventBus>,
    http: Arc<dyn HttpTransport>,
) -> Arc<DesktopServerMessageBridge> {
    let endpoint = BackendEndpoint::new(base_url, RedactedSecret::from(TEST_SECRET));
    let options =
        BridgeOptions::new(endpoint, bus, http).reconnect_delay(Duration::from_millis(20));
    Arc::new(DesktopServerMessageBridge::new(options))
}

/// Transport whose every call fails before reaching a server.
pub struct FailingTransport {
    pub message: &'static str,
}

impl FailingTransport {
    fn fail(&self) -> Result<HttpReply, HttpError> {
        Err(HttpError::request(io::Error::other(self.message)))
    }
}

impl HttpTransport for FailingTransport {
    fn post_json<'a>(
        &'a self,
        _url: &'a str,
        _secret: &'a str,
        _body: &'a Value,
    ) -> BoxFuture<'a, Result<HttpReply, HttpError>> {
        Box::pin(async move { self.fail() })
    }

    fn get_event_stream<'a>(
        &'a self,
        _url: &'a str,
        _secret: &'a str,
    ) -> BoxFuture<'a, Result<HttpReply, HttpError>> {
        Box::pin(async move { self.fail() })
    }
}

/// Stream transport that answers empty batches after `latency` and records
/// how many reads overlapped.
pub struct OverlapTrackingTransport {
    latency: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    reads: AtomicUsize,
}

impl OverlapTrackingTransport {
    pub fn new(latency: Duration) -> Self {
        Self {
            latency,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            reads: AtomicUsize::new(0),
        }
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn reset_max_in_flight(&self) {
        self.max_in_flight
            .store(self.in_flight.load(Ordering::SeqCst), Ordering::SeqCst);
    }
}

impl HttpTransport for OverlapTrackingTransport {
    fn post_json<'a>(
        &'a self,
        _url: &'a str,
        _secret: &'a str,
        _body: &'a Value,
    ) -> BoxFuture<'a, Result<HttpReply, HttpError>> {
        Box::pin(async move {
            Ok(HttpReply {
                status: HttpStatusCode(202),
                body: String::new(),
            })
        })
    }

    fn get_event_stream<'a>(
        &'a self,
        _url: &'a str,
        _secret: &'a str,
    ) -> BoxFuture<'a, Result<HttpReply, HttpError>> {
        Box::pin(async move {
            self.reads.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(self.latency).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(HttpReply {
                status: HttpStatusCode(200),
                body: String::new(),
            })
        })
    }
}

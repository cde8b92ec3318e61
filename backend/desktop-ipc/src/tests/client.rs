// Unit tests for the UI-facing adapter over the in-process router.

use super::support::{FakeCmd, FakeRpc};
use crate::client::{DesktopApi, unwrap};
use crate::contracts::{EventChannel, IPC_MESSAGE_EVENT_CHANNEL, RpcChannel};
use crate::event_bus::{MainEventBus, RendererSink};
use crate::protocol::{ClientToServerMessage, ClientTopic, ProtocolError, ProtocolErrorCode};
use crate::registry::register_desktop_ipc;
use crate::transport::{IpcRouter, RendererTransport};

use serde_json::json;

use std::sync::{Arc, Mutex, Weak};

struct Harness {
    router: Arc<IpcRouter>,
    bus: Arc<MainEventBus>,
    api: DesktopApi<IpcRouter>,
}

fn harness() -> Harness {
    let router = Arc::new(IpcRouter::new(1));
    let weak: Weak<IpcRouter> = Arc::downgrade(&router);
    let bus = Arc::new(MainEventBus::new(move || {
        weak.upgrade().map(|router| router as Arc<dyn RendererSink>)
    }));
    register_desktop_ipc(
        &*router,
        Arc::new(FakeRpc::default()),
        Arc::new(FakeCmd::default()),
        Arc::clone(&bus),
    );
    let api = DesktopApi::new(Arc::clone(&router));
    Harness { router, bus, api }
}

#[tokio::test]
async fn given_registered_router_when_invoking_get_state_then_typed_state_returned() {
    let Harness { api, .. } = harness();

    let state = api.get_state().await.unwrap();

    assert_eq!(state.backend_url, "http://127.0.0.1:43111");
    assert!(state.is_dev);
}

#[tokio::test]
async fn given_unimplemented_channel_when_invoked_then_normalized_not_found() {
    let Harness { api, .. } = harness();

    let error = api.invoke(RpcChannel::GetWakelockState, None).await.unwrap_err();

    assert_eq!(error.code, ProtocolErrorCode::IpcNotFound);
    assert_eq!(error.message, "IPC channel is not implemented: get-wakelock-state");
}

#[tokio::test]
async fn given_send_logs_when_unwrapped_then_result_decoded() {
    let Harness { api, .. } = harness();

    let result = api.send_logs().await.unwrap();

    assert!(result.ok);
    assert_eq!(result.artifact_path.as_deref(), Some("/tmp/logs.zip"));
}

#[tokio::test]
async fn given_client_message_when_sent_then_accepted() {
    let Harness { api, .. } = harness();
    let message = ClientToServerMessage::new(ClientTopic::RuntimePing, None);

    let accepted = api.send_message(&message).await.unwrap();

    assert!(accepted.accepted);
}

#[tokio::test]
async fn given_typed_file_calls_when_invoked_then_requests_encoded_with_camel_case_keys() {
    let Harness { api, .. } = harness();

    let read = api.read_file("/tmp/notes.md").await.unwrap();
    let written = api.write_file("/tmp/notes.md", "hello").await.unwrap();
    let listed = api.list_files("/tmp", Some(".md".to_string())).await.unwrap();

    assert!(read.found);
    assert_eq!(read.file_path, "/tmp/notes.md");
    assert!(written);
    assert_eq!(listed, vec!["a.md".to_string()]);
}

#[tokio::test]
async fn given_unrecorded_recent_dir_when_added_then_none_returned() {
    let Harness { api, .. } = harness();

    let recorded = api.add_recent_dir("/tmp/project").await.unwrap();

    assert_eq!(recorded, None);
}

#[tokio::test]
async fn given_unsafe_url_when_opening_externally_then_invalid_input_before_handler() {
    let Harness { api, .. } = harness();

    let error = api.open_external("javascript:alert(1)").await.unwrap_err();
    let metadata = api.fetch_metadata("https://example.com").await.unwrap();

    assert_eq!(error.code, ProtocolErrorCode::IpcInvalidInput);
    assert_eq!(metadata, "text/plain");
}

#[test]
fn given_failed_result_when_unwrapped_then_message_is_code_and_message() {
    let error = unwrap::<()>(Err(ProtocolError::io("disk full"))).unwrap_err();

    assert_eq!(error.message(), "IPC_IO_ERROR: disk full");
}

#[tokio::test]
async fn given_transport_without_handler_when_invoked_then_fallback_failure_normalized() {
    // GIVEN: A router with nothing registered
    let api = DesktopApi::new(Arc::new(IpcRouter::new(1)));

    // WHEN: Invoking any channel
    let error = api.invoke(RpcChannel::ReadFile, None).await.unwrap_err();

    // THEN: The transport failure becomes IPC_INTERNAL
    assert_eq!(error.code, ProtocolErrorCode::IpcInternal);
    assert_eq!(error.message, "No handler registered for 'read-file'");
}

/// **VALUE**: The readiness handshake through the adapter releases queued
/// events to subscribed listeners.
///
/// **BUG THIS CATCHES**: Would catch `renderer_ready` sending the wrong
/// command, or the router not acting as the bus sink.
#[test]
fn given_subscription_when_renderer_ready_then_queued_event_delivered() {
    // GIVEN: A listener and an event emitted before readiness
    let Harness { bus, api, .. } = harness();
    let received = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&received);
    let subscription = api.on(EventChannel::SetView, move |payload| {
        sink.lock().unwrap().push(payload);
    });
    bus.emit_message(crate::contracts::EventMessage::new(
        EventChannel::SetView,
        Some(json!({"view": "settings"})),
    ));
    assert!(received.lock().unwrap().is_empty());

    // WHEN: The UI signals readiness
    api.renderer_ready();

    // THEN: The listener sees the event exactly once
    assert_eq!(*received.lock().unwrap(), vec![Some(json!({"view": "settings"}))]);
    subscription.unsubscribe();
}

#[test]
fn given_unsubscribed_listener_when_events_arrive_then_not_called_and_repeat_unsubscribe_is_noop() {
    let Harness { router, bus, api } = harness();
    let received = Arc::new(Mutex::new(0u32));
    let counter = Arc::clone(&received);
    let subscription = api.on(EventChannel::NewChat, move |_| *counter.lock().unwrap() += 1);
    api.renderer_ready();

    subscription.unsubscribe();
    subscription.unsubscribe();
    bus.emit(crate::contracts::DesktopEvent::NewChat);

    assert_eq!(*received.lock().unwrap(), 0);
    assert!(!subscription.is_active());
    assert!(!RendererTransport::remove_listener(
        &*router,
        EventChannel::NewChat.as_str(),
        crate::transport::ListenerId(1)
    ));
}

#[test]
fn given_message_subscription_when_relay_carries_invalid_value_then_listener_skips_it() {
    let Harness { router, api, .. } = harness();
    let received = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&received);
    api.subscribe_messages(move |message| sink.lock().unwrap().push(message.id().to_string()));

    RendererSink::send(&*router, IPC_MESSAGE_EVENT_CHANNEL, Some(&json!({"topic": "x"})));
    RendererSink::send(
        &*router,
        IPC_MESSAGE_EVENT_CHANNEL,
        Some(&json!({"id": "a1", "topic": "runtime.ack", "sentAt": "t"})),
    );

    assert_eq!(*received.lock().unwrap(), vec!["a1".to_string()]);
}

#[test]
fn given_app_version_when_requested_synchronously_then_returned() {
    let Harness { api, .. } = harness();

    assert_eq!(api.app_version_sync().as_deref(), Some("1.2.3"));
}

// Unit tests for payload validation and the RPC / CMD handler maps.

use super::support::{FakeCmd, FakeRpc, RecordingSink, WINDOW_OWNER_ID};
use crate::contracts::{CmdChannel, EventChannel, RpcChannel};
use crate::event_bus::{MainEventBus, RendererSink};
use crate::protocol::{ClientTopic, ProtocolError, ProtocolErrorCode};
use crate::registry::validation::{
    EXTERNAL_URL_SCHEMES, assert_safe_url, parse_create_chat_window, parse_notify,
    parse_theme_change, require_string,
};
use crate::registry::{
    CmdEvent, InvokeEvent, create_cmd_handler_map, create_rpc_handler_map,
};

use serde_json::{Value, json};

use std::sync::Arc;

const EVENT: InvokeEvent = InvokeEvent { sender_id: 1 };

fn ready_bus(sink: &Arc<RecordingSink>) -> Arc<MainEventBus> {
    let provider = Arc::clone(sink);
    let bus = Arc::new(MainEventBus::new(move || {
        Some(provider.clone() as Arc<dyn RendererSink>)
    }));
    bus.mark_renderer_ready(sink.id());
    bus
}

#[test]
fn given_string_fields_when_required_then_blank_and_non_strings_rejected() {
    let record = json!({"ok": " path ", "blank": "   ", "number": 3});
    let record = record.as_object().unwrap();

    assert_eq!(require_string(record, "ok").unwrap(), " path ");
    for key in ["blank", "number", "missing"] {
        assert_eq!(
            require_string(record, key).unwrap_err(),
            ProtocolError::invalid_input(format!("Field {key} must be a non-empty string"))
        );
    }
}

#[test]
fn given_urls_when_checked_against_allow_list_then_scheme_enforced() {
    assert_eq!(
        assert_safe_url("https://example.com", EXTERNAL_URL_SCHEMES).unwrap(),
        "https://example.com/"
    );
    assert!(assert_safe_url("mailto:team@example.com", EXTERNAL_URL_SCHEMES).is_ok());

    let rejected = assert_safe_url("file:///etc/passwd", EXTERNAL_URL_SCHEMES).unwrap_err();
    assert_eq!(rejected.message, "URL protocol is not allowed");
    assert_eq!(rejected.details.unwrap()["protocol"], "file:");

    let garbage = assert_safe_url("not a url", EXTERNAL_URL_SCHEMES).unwrap_err();
    assert_eq!(garbage, ProtocolError::invalid_input("Invalid URL payload"));
}

#[test]
fn given_command_payloads_when_parsed_then_required_fields_enforced() {
    assert!(parse_notify(Some(&json!({"title": "t", "body": "b"}))).is_ok());
    assert_eq!(
        parse_notify(Some(&json!({"title": "t", "body": ""}))).unwrap_err().message,
        "notify payload must include title and body"
    );
    assert_eq!(
        parse_theme_change(Some(&json!({"mode": "dark", "theme": "x", "useSystemTheme": "no"})))
            .unwrap_err()
            .message,
        "broadcast-theme-change payload is invalid"
    );
    assert_eq!(parse_create_chat_window(None).unwrap().query, None);
    assert_eq!(
        parse_create_chat_window(Some(&json!({"query": ""}))).unwrap().query,
        None
    );
    assert_eq!(
        parse_create_chat_window(Some(&json!("text"))).unwrap_err().message,
        "Payload must be an object"
    );
}

/// **VALUE**: Every RPC channel resolves to some handler, and the
/// unimplemented ones fail with a precise, machine-readable error.
///
/// **WHY THIS MATTERS**: The UI probes optional features by calling them.
/// A hang or a generic error would be indistinguishable from a real bug.
///
/// **BUG THIS CATCHES**: Would catch a handler map that misses channels or
/// returns a different code or message for unimplemented ones.
#[tokio::test]
async fn given_unimplemented_rpc_channel_when_called_then_not_found_with_channel_detail() {
    // GIVEN: The RPC map over fake dependencies
    let handlers = create_rpc_handler_map(Arc::new(FakeRpc::default()));
    assert_eq!(handlers.channels().count(), RpcChannel::ALL.len());

    // WHEN: Calling a channel without an implementation
    let error = handlers
        .call(RpcChannel::GetSettings, None, EVENT)
        .await
        .unwrap_err();

    // THEN: The error is IPC_NOT_FOUND naming the channel
    assert_eq!(error.code, ProtocolErrorCode::IpcNotFound);
    assert_eq!(error.message, "IPC channel is not implemented: get-settings");
    assert_eq!(error.details.unwrap()["channel"], "get-settings");
}

#[tokio::test]
async fn given_read_file_without_object_payload_when_called_then_invalid_input_and_no_io() {
    // GIVEN: Fake dependencies recording every call
    let rpc = Arc::new(FakeRpc::default());
    let handlers = create_rpc_handler_map(Arc::clone(&rpc));

    // WHEN: read-file is called with a bare string
    let error = handlers
        .call(RpcChannel::ReadFile, Some(json!("/tmp/x")), EVENT)
        .await
        .unwrap_err();

    // THEN: Validation fails before the dependency runs
    assert_eq!(error, ProtocolError::invalid_input("Payload must be an object"));
    assert!(rpc.calls().is_empty());
}

#[tokio::test]
async fn given_valid_rpc_payloads_when_called_then_dependencies_receive_typed_values() {
    let rpc = Arc::new(FakeRpc::default());
    let handlers = create_rpc_handler_map(Arc::clone(&rpc));

    let read = handlers
        .call(RpcChannel::ReadFile, Some(json!({"filePath": "/tmp/a.md"})), EVENT)
        .await
        .unwrap();
    assert_eq!(read["filePath"], "/tmp/a.md");
    assert_eq!(read["error"], Value::Null);

    let listed = handlers
        .call(
            RpcChannel::ListFiles,
            Some(json!({"dirPath": "/tmp", "extension": ".md"})),
            EVENT,
        )
        .await
        .unwrap();
    assert_eq!(listed, json!(["a.md"]));

    let selected = handlers
        .call(RpcChannel::SelectFileOrDirectory, None, EVENT)
        .await
        .unwrap();
    assert_eq!(selected, Value::Null);

    let recent = handlers
        .call(RpcChannel::AddRecentDir, Some(json!({"dir": "/work"})), EVENT)
        .await
        .unwrap();
    assert_eq!(recent, Value::Null);

    assert_eq!(
        rpc.calls(),
        vec![
            "read_file:/tmp/a.md",
            "list_files:/tmp:.md",
            "select:",
            "add_recent_dir:/work",
        ]
    );
}

#[tokio::test]
async fn given_url_rpc_channels_when_called_then_allow_lists_differ() {
    let rpc = Arc::new(FakeRpc::default());
    let handlers = create_rpc_handler_map(Arc::clone(&rpc));

    // open-external accepts mailto, fetch-metadata does not
    handlers
        .call(RpcChannel::OpenExternal, Some(json!({"url": "mailto:a@b.c"})), EVENT)
        .await
        .unwrap();
    let rejected = handlers
        .call(RpcChannel::FetchMetadata, Some(json!({"url": "mailto:a@b.c"})), EVENT)
        .await
        .unwrap_err();
    assert_eq!(rejected.message, "URL protocol is not allowed");

    let content_type = handlers
        .call(RpcChannel::FetchMetadata, Some(json!({"url": "https://example.com"})), EVENT)
        .await
        .unwrap();
    assert_eq!(content_type, "text/plain");
    assert_eq!(
        rpc.calls(),
        vec!["open_external:mailto:a@b.c", "fetch_metadata:https://example.com/"]
    );
}

#[tokio::test]
async fn given_send_message_rpc_when_envelope_invalid_then_rejected_before_dependency() {
    let rpc = Arc::new(FakeRpc::default());
    let handlers = create_rpc_handler_map(Arc::clone(&rpc));

    let error = handlers
        .call(
            RpcChannel::DesktopSendMessage,
            Some(json!({"id": "", "topic": "", "sentAt": ""})),
            EVENT,
        )
        .await
        .unwrap_err();
    assert_eq!(error, ProtocolError::invalid_input("Invalid client message envelope"));

    let accepted = handlers
        .call(
            RpcChannel::DesktopSendMessage,
            Some(json!({"id": "m1", "topic": "runtime.ping", "sentAt": "t"})),
            EVENT,
        )
        .await
        .unwrap();
    assert_eq!(accepted, json!({"accepted": true}));
    assert_eq!(rpc.sent_messages.lock().unwrap().len(), 1);
}

#[test]
fn given_unimplemented_cmd_channel_when_called_then_no_op() {
    // GIVEN: A command map whose channels are all bound
    let sink = RecordingSink::new(1);
    let cmd = Arc::new(FakeCmd::default());
    let handlers = create_cmd_handler_map(Arc::clone(&cmd), ready_bus(&sink));
    assert_eq!(handlers.channels().count(), CmdChannel::ALL.len());

    // WHEN: Every command runs with an empty payload from an unknown sender
    let mut event = CmdEvent::new(99);
    handlers.call(CmdChannel::HideWindow, None, &mut event);
    handlers.call(CmdChannel::LogInfo, Some(json!(5)), &mut event);

    // THEN: Nothing happens and nothing is returned
    assert!(cmd.window.actions().is_empty());
    assert!(cmd.logs().is_empty());
    assert_eq!(event.return_value, None);
}

#[test]
fn given_invalid_notify_when_sent_then_rejection_logged_as_json() {
    let sink = RecordingSink::new(1);
    let cmd = Arc::new(FakeCmd::default());
    let handlers = create_cmd_handler_map(Arc::clone(&cmd), ready_bus(&sink));

    handlers.call(
        CmdChannel::Notify,
        Some(json!({"title": "only title"})),
        &mut CmdEvent::new(1),
    );

    assert!(cmd.notifications.lock().unwrap().is_empty());
    assert_eq!(
        cmd.logs(),
        vec![
            r#"notify rejected: {"code":"IPC_INVALID_INPUT","message":"notify payload must include title and body"}"#
        ]
    );
}

/// **VALUE**: `create-chat-window` drives three collaborators at once.
///
/// **BUG THIS CATCHES**: Would catch a handler that forgets to focus the
/// window, dispatches the wrong topic, or emits the initial message for an
/// empty query.
#[test]
fn given_create_chat_window_with_query_when_sent_then_window_message_and_event_produced() {
    // GIVEN: A ready renderer and fake window
    let sink = RecordingSink::new(1);
    let cmd = Arc::new(FakeCmd::default());
    let handlers = create_cmd_handler_map(Arc::clone(&cmd), ready_bus(&sink));

    // WHEN: The command carries a query
    handlers.call(
        CmdChannel::CreateChatWindow,
        Some(json!({"query": "hello"})),
        &mut CmdEvent::new(1),
    );

    // THEN: Window shown and focused, backend message dispatched, event emitted
    assert_eq!(cmd.window.actions(), vec!["show", "focus"]);
    let dispatched = cmd.dispatched.lock().unwrap().clone();
    assert_eq!(dispatched.len(), 1);
    assert_eq!(dispatched[0].0, ClientTopic::ChatWindowCreate);
    assert_eq!(dispatched[0].1["query"], "hello");
    assert_eq!(
        sink.sent(),
        vec![(EventChannel::SetInitialMessage.to_string(), Some(json!("hello")))]
    );
}

#[test]
fn given_window_commands_when_sent_by_owner_then_owner_window_acted_on() {
    let sink = RecordingSink::new(1);
    let cmd = Arc::new(FakeCmd::default());
    let handlers = create_cmd_handler_map(Arc::clone(&cmd), ready_bus(&sink));
    let mut event = CmdEvent::new(WINDOW_OWNER_ID);

    handlers.call(CmdChannel::HideWindow, None, &mut event);
    handlers.call(CmdChannel::ReloadApp, None, &mut event);
    handlers.call(CmdChannel::CloseWindow, None, &mut event);
    handlers.call(CmdChannel::RestartApp, None, &mut event);

    assert_eq!(cmd.window.actions(), vec!["hide", "reload", "close"]);
    assert_eq!(*cmd.restarts.lock().unwrap(), 1);
}

#[test]
fn given_theme_and_url_commands_when_sent_then_validated_before_acting() {
    let sink = RecordingSink::new(1);
    let cmd = Arc::new(FakeCmd::default());
    let handlers = create_cmd_handler_map(Arc::clone(&cmd), ready_bus(&sink));
    let mut event = CmdEvent::new(1);

    handlers.call(
        CmdChannel::BroadcastThemeChange,
        Some(json!({"mode": "light", "theme": "default", "useSystemTheme": true})),
        &mut event,
    );
    handlers.call(
        CmdChannel::OpenInChrome,
        Some(json!({"url": "javascript:alert(1)"})),
        &mut event,
    );
    handlers.call(CmdChannel::OpenInChrome, Some(json!({})), &mut event);
    handlers.call(
        CmdChannel::OpenInChrome,
        Some(json!({"url": "https://example.com/docs"})),
        &mut event,
    );

    assert_eq!(sink.sent()[0].0, "theme-changed");
    assert_eq!(
        *cmd.opened.lock().unwrap(),
        vec!["https://example.com/docs".to_string()]
    );
    let logs = cmd.logs();
    assert_eq!(logs.len(), 2);
    assert!(logs[0].starts_with("open-in-chrome rejected: "));
    assert!(logs[1].contains("URL is required"));
}

#[test]
fn given_get_app_version_when_sent_then_return_value_set() {
    let sink = RecordingSink::new(1);
    let handlers = create_cmd_handler_map(Arc::new(FakeCmd::default()), ready_bus(&sink));
    let mut event = CmdEvent::new(1);

    handlers.call(CmdChannel::GetAppVersion, None, &mut event);

    assert_eq!(event.return_value, Some(json!("1.2.3")));
}

#[test]
fn given_react_ready_when_sent_then_sender_marked_ready() {
    let bus = Arc::new(MainEventBus::new(|| None));
    let handlers = create_cmd_handler_map(Arc::new(FakeCmd::default()), Arc::clone(&bus));

    handlers.call(CmdChannel::ReactReady, None, &mut CmdEvent::new(4));

    assert!(bus.is_renderer_ready(4));
}

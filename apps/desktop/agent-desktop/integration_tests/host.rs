use agent_desktop::backend::HealthCheck;
use agent_desktop::host::{DesktopHost, RECENT_DIRS_LIMIT};

use desktop_ipc::config::DesktopConfig;
use desktop_ipc::contracts::{CmdChannel, EventChannel, RpcChannel};
use desktop_ipc::protocol::{ClientToServerMessage, ClientTopic, ProtocolErrorCode};

use common::RedactedSecret;

use serde_json::{Value, json};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use std::sync::{Arc, Mutex};
use std::time::Duration;

// ============================================================================
// Integration tests for the host wiring against a mock backend
// ============================================================================

const SECRET: &str = "host-secret";

fn config_for(server: &MockServer) -> DesktopConfig {
    DesktopConfig {
        backend_url: server.uri(),
        secret_key: RedactedSecret::from(SECRET),
        reconnect_delay: Duration::from_millis(20),
        ..DesktopConfig::default()
    }
}

fn quick_health_check() -> HealthCheck {
    HealthCheck {
        attempts: 3,
        interval: Duration::from_millis(10),
    }
}

async fn healthy_backend() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    server
}

async fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .is_ok()
}

/// **VALUE**: A started host publishes the backend in `desktop:get-state`.
///
/// **BUG THIS CATCHES**: Would catch the endpoint not being set after a
/// successful health check, leaving the UI showing no backend.
#[tokio::test]
async fn given_healthy_backend_when_host_started_then_state_reports_backend_url() {
    // GIVEN: A healthy backend
    let server = healthy_backend().await;
    let host = DesktopHost::build(config_for(&server), None)
        .unwrap()
        .with_health_check(quick_health_check());

    // WHEN: Starting the host
    let started = host.start().await;

    // THEN: The state carries the URL and no error
    assert!(started);
    let state = host.api().get_state().await.unwrap();
    assert_eq!(state.backend_url, server.uri());
    assert_eq!(state.backend_error, "");
    assert!(host.bridge().is_running());
    host.shutdown();
}

#[tokio::test]
async fn given_unreachable_backend_when_host_started_then_error_in_state_and_bridge_idle() {
    let server = MockServer::start().await;
    let host = DesktopHost::build(config_for(&server), None)
        .unwrap()
        .with_health_check(quick_health_check());

    let started = host.start().await;

    assert!(!started);
    let state = host.api().get_state().await.unwrap();
    assert_eq!(state.backend_url, "");
    assert_eq!(state.backend_error, "Backend health check timed out");
    assert!(!host.bridge().is_running());
}

/// **VALUE**: End to end, backend stream messages reach both the relay
/// subscription and, for declared events, the typed event listeners.
///
/// **WHY THIS MATTERS**: This is the only path backend events take to the
/// UI; it crosses the bridge, the event bus readiness gate and the router.
///
/// **BUG THIS CATCHES**: Would catch events emitted before `react-ready`
/// being lost, or the relay channel never being fed.
#[tokio::test]
async fn given_stream_events_when_renderer_ready_then_relay_and_event_listeners_receive_them() {
    // GIVEN: A backend streaming one forwarded event and one ack
    let server = healthy_backend().await;
    let body = [
        json!({
            "id": "m1",
            "topic": "event.forward",
            "sentAt": "2026-01-01T00:00:00.000Z",
            "payload": {"event": "set-view", "payload": {"view": "settings"}},
        }),
        json!({
            "id": "m2",
            "topic": "runtime.ack",
            "sentAt": "2026-01-01T00:00:00.000Z",
            "payload": {"requestId": "r1"},
        }),
    ]
    .iter()
    .map(|message| format!("data: {message}\n\n"))
    .collect::<String>();
    Mock::given(method("GET"))
        .and(path("/desktop/messages/stream"))
        .and(header("x-secret-key", SECRET))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&server)
        .await;
    let host = DesktopHost::build(config_for(&server), None)
        .unwrap()
        .with_health_check(quick_health_check());
    let api = host.api();

    let relayed = Arc::new(Mutex::new(Vec::<String>::new()));
    let relay_sink = Arc::clone(&relayed);
    let relay = api.subscribe_messages(move |message| {
        relay_sink.lock().unwrap().push(message.id().to_string())
    });
    let views = Arc::new(Mutex::new(Vec::<Option<Value>>::new()));
    let view_sink = Arc::clone(&views);
    let view = api.on(EventChannel::SetView, move |payload| {
        view_sink.lock().unwrap().push(payload)
    });

    // WHEN: The backend comes up and the renderer signals readiness later
    host.start().await;
    assert!(wait_until(|| relayed.lock().unwrap().len() >= 2).await);
    api.renderer_ready();

    // THEN: Relay saw both messages; the declared event reached its listener
    assert!(wait_until(|| !views.lock().unwrap().is_empty()).await);
    assert_eq!(&relayed.lock().unwrap()[..2], ["m1", "m2"]);
    assert_eq!(views.lock().unwrap()[0], Some(json!({"view": "settings"})));

    host.shutdown();
    relay.unsubscribe();
    view.unsubscribe();
}

#[tokio::test]
async fn given_started_host_when_sending_message_then_backend_receives_envelope() {
    let server = healthy_backend().await;
    Mock::given(method("POST"))
        .and(path("/desktop/messages"))
        .and(header("x-secret-key", SECRET))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&server)
        .await;
    let host = DesktopHost::build(config_for(&server), None)
        .unwrap()
        .with_health_check(quick_health_check());
    host.start().await;
    host.bridge().stop();

    let message = ClientToServerMessage::new(ClientTopic::RuntimePing, None);
    let accepted = host.api().send_message(&message).await.unwrap();

    assert!(accepted.accepted);
}

#[tokio::test]
async fn given_backend_not_started_when_sending_message_then_not_ready_error() {
    let server = MockServer::start().await;
    let host = DesktopHost::build(config_for(&server), None).unwrap();

    let message = ClientToServerMessage::new(ClientTopic::RuntimePing, None);
    let error = host.api().send_message(&message).await.unwrap_err();

    assert_eq!(error.code, ProtocolErrorCode::IpcInternal);
    assert_eq!(error.message, "Backend bridge is not ready");
}

#[tokio::test]
async fn given_started_host_when_sending_logs_then_backend_reply_returned() {
    let server = healthy_backend().await;
    Mock::given(method("POST"))
        .and(path("/reply"))
        .and(header("x-secret-key", SECRET))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "data: {\"ok\":true,\"message\":\"Logs sent\",\"artifactPath\":\"/tmp/logs.zip\"}\n\n",
        ))
        .mount(&server)
        .await;
    let host = DesktopHost::build(config_for(&server), None)
        .unwrap()
        .with_health_check(quick_health_check());
    host.start().await;
    host.bridge().stop();

    let result = host.api().send_logs().await.unwrap();

    assert!(result.ok);
    assert_eq!(result.message, "Logs sent");
    assert_eq!(result.artifact_path.as_deref(), Some("/tmp/logs.zip"));
}

#[tokio::test]
async fn given_backend_not_started_when_sending_logs_then_not_ready_result() {
    let server = MockServer::start().await;
    let host = DesktopHost::build(config_for(&server), None).unwrap();

    let result = host.api().send_logs().await.unwrap();

    assert!(!result.ok);
    assert_eq!(result.message, "Backend is not ready");
}

/// **VALUE**: `create-chat-window` shows the main window, seeds the UI with
/// the query and tells the backend about it.
///
/// **BUG THIS CATCHES**: Would catch the client message never leaving the
/// host because the dispatch was not spawned on the runtime.
#[tokio::test]
async fn given_query_when_creating_chat_window_then_ui_seeded_and_backend_told() {
    // GIVEN: A started host with a ready renderer
    let server = healthy_backend().await;
    Mock::given(method("POST"))
        .and(path("/desktop/messages"))
        .respond_with(ResponseTemplate::new(202))
        .mount(&server)
        .await;
    let host = DesktopHost::build(config_for(&server), None)
        .unwrap()
        .with_health_check(quick_health_check());
    host.start().await;
    host.bridge().stop();
    let api = host.api();
    let seeded = Arc::new(Mutex::new(Vec::<Option<Value>>::new()));
    let sink = Arc::clone(&seeded);
    api.on(EventChannel::SetInitialMessage, move |payload| {
        sink.lock().unwrap().push(payload)
    });
    api.renderer_ready();

    // WHEN: The UI asks for a chat window with a query
    api.send(CmdChannel::CreateChatWindow, Some(json!({"query": "hello"})));

    // THEN: The UI gets the query, the window is visible, the backend gets the topic
    assert_eq!(*seeded.lock().unwrap(), vec![Some(json!("hello"))]);
    assert!(host.main_window().is_visible());
    let posted = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let requests = server.received_requests().await.unwrap_or_default();
            if let Some(request) = requests.iter().find(|r| r.method.as_str() == "POST") {
                return request.body_json::<Value>().unwrap();
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("client message should be posted");
    assert_eq!(posted["topic"], "desktop.chat-window.create");
    assert_eq!(posted["payload"]["query"], "hello");
}

#[tokio::test]
async fn given_files_when_using_file_channels_then_round_trip_through_ipc() {
    let server = MockServer::start().await;
    let host = DesktopHost::build(config_for(&server), None).unwrap();
    let api = host.api();
    let temp_dir = tempfile::tempdir().unwrap();
    let file_path = temp_dir.path().join("notes/today.md").display().to_string();

    let written = api
        .invoke(
            RpcChannel::WriteFile,
            Some(json!({"filePath": file_path, "content": "# today"})),
        )
        .await
        .unwrap();
    let read = api
        .invoke(RpcChannel::ReadFile, Some(json!({"filePath": file_path})))
        .await
        .unwrap();
    let listed = api
        .invoke(
            RpcChannel::ListFiles,
            Some(json!({"dirPath": temp_dir.path().join("notes").display().to_string(), "extension": ".md"})),
        )
        .await
        .unwrap();

    assert_eq!(written, json!(true));
    assert_eq!(read["file"], "# today");
    assert_eq!(read["found"], true);
    assert_eq!(listed, json!(["today.md"]));
}

#[tokio::test]
async fn given_headless_host_when_choosing_directory_then_unsupported_platform() {
    let server = MockServer::start().await;
    let host = DesktopHost::build(config_for(&server), None).unwrap();

    let error = host
        .api()
        .invoke(RpcChannel::DirectoryChooser, None)
        .await
        .unwrap_err();

    assert_eq!(error.code, ProtocolErrorCode::IpcUnsupportedPlatform);
}

#[tokio::test]
async fn given_many_recent_dirs_when_added_then_most_recent_first_and_bounded() {
    let server = MockServer::start().await;
    let host = DesktopHost::build(config_for(&server), None).unwrap();
    let api = host.api();

    for index in 0..=RECENT_DIRS_LIMIT {
        api.invoke(RpcChannel::AddRecentDir, Some(json!({"dir": format!("/d{index}")})))
            .await
            .unwrap();
    }
    api.invoke(RpcChannel::AddRecentDir, Some(json!({"dir": "/d5"})))
        .await
        .unwrap();

    let recent = host.rpc().recent_dirs();
    assert_eq!(recent.len(), RECENT_DIRS_LIMIT);
    assert_eq!(recent[0], "/d5");
    assert_eq!(recent[1], format!("/d{RECENT_DIRS_LIMIT}"));
    assert!(!recent.contains(&"/d0".to_string()));
}

#[tokio::test]
async fn given_started_host_when_asking_host_port_then_parsed_from_endpoint() {
    let server = healthy_backend().await;
    let host = DesktopHost::build(config_for(&server), None)
        .unwrap()
        .with_health_check(quick_health_check());
    host.start().await;
    host.bridge().stop();

    let host_port = host
        .api()
        .invoke(RpcChannel::GetGoosedHostPort, None)
        .await
        .unwrap();

    let expected = server.uri().trim_start_matches("http://").to_string();
    assert_eq!(host_port, json!(expected));
}

#[tokio::test]
async fn given_renderer_when_requesting_restart_then_host_signals_restart() {
    let server = MockServer::start().await;
    let host = DesktopHost::build(config_for(&server), None).unwrap();

    host.api().send(CmdChannel::RestartApp, None);

    let signalled =
        tokio::time::timeout(Duration::from_secs(1), host.restart_requested()).await;
    assert!(signalled.is_ok());
}

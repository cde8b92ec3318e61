use crate::helpers::{
    FailingTransport, OverlapTrackingTransport, TEST_SECRET, ack_message, bridge_for,
    bridge_with_transport, forward_message, options_for, ready_bus, sse_frame,
};

use desktop_ipc::bridge::{
    DESKTOP_MESSAGES_PATH, DESKTOP_MESSAGES_STREAM_PATH, DesktopServerMessageBridge,
};
use desktop_ipc::protocol::{ClientToServerMessage, ClientTopic, ProtocolErrorCode};

use serde_json::{Map, json};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use std::sync::{Arc, Mutex};
use std::time::Duration;

fn ping_message() -> ClientToServerMessage {
    let mut payload = Map::new();
    payload.insert("requestId".to_string(), json!("req-1"));
    ClientToServerMessage::new(ClientTopic::RuntimePing, Some(payload))
}

// ----------------------------------------------------------------------------
// send()
// ----------------------------------------------------------------------------

/// **VALUE**: Verifies the outbound POST: path, secret header, content type
/// and the envelope as the JSON body.
///
/// **WHY THIS MATTERS**: The backend rejects requests without the shared
/// secret, and it decodes the body as the envelope verbatim.
///
/// **BUG THIS CATCHES**: Would catch if:
/// - The secret header name or value drifts
/// - The envelope is re-shaped (snake_case `sent_at`, wrapped payload)
/// - A non-2xx reply is treated as accepted
#[tokio::test]
async fn given_ready_backend_when_sending_message_then_envelope_posted_with_secret() {
    // GIVEN: A backend accepting messages
    let server = MockServer::start().await;
    let message = ping_message();
    Mock::given(method("POST"))
        .and(path(DESKTOP_MESSAGES_PATH))
        .and(header("x-secret-key", TEST_SECRET))
        .and(header("content-type", "application/json"))
        .and(body_json(serde_json::to_value(&message).unwrap()))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&server)
        .await;
    let (bus, _) = ready_bus();
    let bridge = bridge_for(&server.uri(), bus);

    // WHEN: Sending the message
    let accepted = bridge.send(&message).await.expect("send should succeed");

    // THEN: The backend saw exactly one matching request
    assert!(accepted.accepted);
}

#[tokio::test]
async fn given_server_error_when_sending_then_io_error_with_status_details() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    let (bus, _) = ready_bus();
    let bridge = bridge_for(&server.uri(), bus);

    let error = bridge.send(&ping_message()).await.unwrap_err();

    assert_eq!(error.code, ProtocolErrorCode::IpcIoError);
    assert_eq!(error.message, "Bridge POST failed with status 500");
    assert_eq!(error.details.unwrap()["status"], 500);
    assert_eq!(error.retryable, Some(false));
}

#[tokio::test]
async fn given_unavailable_backend_status_when_sending_then_error_is_retryable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    let (bus, _) = ready_bus();
    let bridge = bridge_for(&server.uri(), bus);

    let error = bridge.send(&ping_message()).await.unwrap_err();

    assert_eq!(error.retryable, Some(true));
}

#[tokio::test]
async fn given_invalid_envelope_when_sending_then_rejected_before_network() {
    // GIVEN: An envelope with an empty id
    let server = MockServer::start().await;
    let (bus, _) = ready_bus();
    let bridge = bridge_for(&server.uri(), bus);
    let mut message = ping_message();
    message.id = String::new();

    // WHEN: Sending it
    let error = bridge.send(&message).await.unwrap_err();

    // THEN: Invalid input, and the backend never heard about it
    assert_eq!(error.code, ProtocolErrorCode::IpcInvalidInput);
    assert_eq!(error.message, "Invalid client message envelope");
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn given_unset_endpoint_when_sending_then_not_ready() {
    let (bus, _) = ready_bus();
    let options = options_for("http://127.0.0.1:1", bus);
    options.endpoint.clear();
    let bridge = DesktopServerMessageBridge::new(options);

    let error = bridge.send(&ping_message()).await.unwrap_err();

    assert_eq!(error.code, ProtocolErrorCode::IpcInternal);
    assert_eq!(error.message, "Backend bridge is not ready");
}

#[tokio::test]
async fn given_refused_connection_when_sending_then_internal_error_with_cause() {
    let (bus, _) = ready_bus();
    let bridge = bridge_for("http://127.0.0.1:1", bus);

    let error = bridge.send(&ping_message()).await.unwrap_err();

    assert_eq!(error.code, ProtocolErrorCode::IpcInternal);
    assert!(
        error.message.to_lowercase().contains("refused"),
        "message should carry the connect failure, got: {}",
        error.message
    );
}

#[tokio::test]
async fn given_transport_throwing_when_sending_then_internal_error_carries_its_message() {
    let (bus, _) = ready_bus();
    let http = Arc::new(FailingTransport {
        message: "socket hang up",
    });
    let bridge = bridge_with_transport("http://127.0.0.1:43111", bus, http);

    let error = bridge.send(&ping_message()).await.unwrap_err();

    assert_eq!(error.code, ProtocolErrorCode::IpcInternal);
    assert_eq!(error.message, "socket hang up");
}

// ----------------------------------------------------------------------------
// poll_once()
// ----------------------------------------------------------------------------

/// **VALUE**: One stream read relays every valid message to the observer
/// and only declared event channels to the UI.
///
/// **BUG THIS CATCHES**: Would catch garbage frames aborting the whole
/// batch, or arbitrary backend event names reaching the UI.
#[tokio::test]
async fn given_stream_batch_when_polled_then_declared_events_forwarded_to_ui() {
    // GIVEN: A stream with a declared event, an undeclared event, an ack and garbage
    let server = MockServer::start().await;
    let body = [
        sse_frame(forward_message("m1", "set-view", json!({"view": "settings"}))),
        sse_frame(forward_message("m2", "backend.internal", json!({}))),
        sse_frame(ack_message("m3", "req-1")),
        "data: {not json}\n\n".to_string(),
        ": comment\n\n".to_string(),
    ]
    .concat();
    Mock::given(method("GET"))
        .and(path(DESKTOP_MESSAGES_STREAM_PATH))
        .and(header("x-secret-key", TEST_SECRET))
        .and(header("accept", "text/event-stream"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .mount(&server)
        .await;
    let (bus, renderer) = ready_bus();
    let observed = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&observed);
    let bridge = DesktopServerMessageBridge::new(
        options_for(&server.uri(), bus)
            .on_message(move |message| sink.lock().unwrap().push(message.id().to_string())),
    );

    // WHEN: Polling once
    let summary = bridge.poll_once().await.expect("poll should succeed");

    // THEN: Three messages parsed, all observed, one forwarded
    assert_eq!(summary.count, 3);
    assert_eq!(*observed.lock().unwrap(), vec!["m1", "m2", "m3"]);
    assert_eq!(
        renderer.delivered(),
        vec![("set-view".to_string(), Some(json!({"view": "settings"})))]
    );
}

#[tokio::test]
async fn given_stream_without_valid_frames_when_polled_then_count_is_zero() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("data: nope\n\n"))
        .mount(&server)
        .await;
    let (bus, renderer) = ready_bus();
    let bridge = bridge_for(&server.uri(), bus);

    let summary = bridge.poll_once().await.unwrap();

    assert_eq!(summary.count, 0);
    assert!(renderer.delivered().is_empty());
}

#[tokio::test]
async fn given_stream_unauthorized_when_polled_then_io_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    let (bus, _) = ready_bus();
    let bridge = bridge_for(&server.uri(), bus);

    let error = bridge.poll_once().await.unwrap_err();

    assert_eq!(error.code, ProtocolErrorCode::IpcIoError);
    assert_eq!(error.message, "Bridge stream failed with status 401");
}

/// **VALUE**: A network failure while reading the stream surfaces as
/// `IPC_INTERNAL` carrying the failure's own text.
///
/// **BUG THIS CATCHES**: Would catch a poll that swallows transport errors
/// into a generic message, leaving the loop's warning log useless.
#[tokio::test]
async fn given_transport_throwing_when_polled_then_internal_error_carries_its_message() {
    // GIVEN: A transport that fails every read
    let (bus, renderer) = ready_bus();
    let http = Arc::new(FailingTransport {
        message: "read ECONNRESET",
    });
    let bridge = bridge_with_transport("http://127.0.0.1:43111", bus, http);

    // WHEN: Polling once
    let error = bridge.poll_once().await.unwrap_err();

    // THEN: The thrown message is kept and nothing reaches the UI
    assert_eq!(error.code, ProtocolErrorCode::IpcInternal);
    assert_eq!(error.message, "read ECONNRESET");
    assert!(renderer.delivered().is_empty());
}

#[tokio::test]
async fn given_refused_connection_when_polled_then_internal_error_with_cause() {
    let (bus, _) = ready_bus();
    let bridge = bridge_for("http://127.0.0.1:1", bus);

    let error = bridge.poll_once().await.unwrap_err();

    assert_eq!(error.code, ProtocolErrorCode::IpcInternal);
    assert!(
        error.message.to_lowercase().contains("refused"),
        "message should carry the connect failure, got: {}",
        error.message
    );
}

/// **BUG THIS CATCHES**: Would catch an ack with loosely typed payload
/// fields being dropped from the batch even though it is a valid envelope.
#[tokio::test]
async fn given_ack_with_numeric_request_id_when_polled_then_counted_and_observed() {
    // GIVEN: A stream carrying one ack whose requestId is a number
    let server = MockServer::start().await;
    let ack = json!({
        "id": "a1",
        "topic": "runtime.ack",
        "sentAt": "2026-01-01T00:00:00.000Z",
        "payload": {"requestId": 5},
    });
    Mock::given(method("GET"))
        .and(path(DESKTOP_MESSAGES_STREAM_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(sse_frame(ack)))
        .mount(&server)
        .await;
    let (bus, _) = ready_bus();
    let observed = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&observed);
    let bridge = DesktopServerMessageBridge::new(
        options_for(&server.uri(), bus)
            .on_message(move |message| sink.lock().unwrap().push(message.id().to_string())),
    );

    // WHEN: Polling once
    let summary = bridge.poll_once().await.expect("poll should succeed");

    // THEN: The ack is part of the batch
    assert_eq!(summary.count, 1);
    assert_eq!(*observed.lock().unwrap(), vec!["a1"]);
}

// ----------------------------------------------------------------------------
// start() / stop()
// ----------------------------------------------------------------------------

/// **VALUE**: The loop keeps polling after each read and stops once asked.
///
/// **WHY THIS MATTERS**: The stream endpoint closes after each batch; a
/// loop that exits after one read silently stops all backend events.
///
/// **BUG THIS CATCHES**: Would catch a loop that breaks on success or
/// error, a double `start` spawning a second loop, or `stop` being ignored.
#[tokio::test]
async fn given_started_bridge_when_running_then_polls_repeatedly_until_stopped() {
    // GIVEN: A stream that always returns one event
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(DESKTOP_MESSAGES_STREAM_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(sse_frame(forward_message(
            "m1",
            "new-chat",
            json!({}),
        ))))
        .mount(&server)
        .await;
    let (bus, renderer) = ready_bus();
    let bridge = bridge_for(&server.uri(), bus);

    // WHEN: Starting twice and letting it run
    bridge.start();
    bridge.start();
    assert!(bridge.is_running());
    let polled_twice = tokio::time::timeout(Duration::from_secs(5), async {
        while renderer.delivered().len() < 2 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;

    // THEN: More than one poll happened, and stop ends the loop
    assert!(polled_twice.is_ok(), "bridge should poll more than once");
    bridge.stop();
    assert!(!bridge.is_running());
    tokio::time::sleep(Duration::from_millis(100)).await;
    let settled = server.received_requests().await.unwrap().len();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(server.received_requests().await.unwrap().len(), settled);
}

#[tokio::test]
async fn given_failing_stream_when_started_then_loop_keeps_retrying() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;
    let (bus, _) = ready_bus();
    let bridge = bridge_for(&server.uri(), bus);

    bridge.start();
    let retried = tokio::time::timeout(Duration::from_secs(5), async {
        while server.received_requests().await.unwrap().len() < 3 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;
    bridge.stop();

    assert!(retried.is_ok(), "bridge should keep polling after failures");
}

/// **VALUE**: `stop()` immediately followed by `start()` leaves exactly one
/// poll loop alive.
///
/// **WHY THIS MATTERS**: `stop()` does not abort the in-flight read, so the
/// old loop is still inside `poll_once` when the new one starts. If the old
/// loop resumed afterwards, every backend batch would be read twice.
///
/// **BUG THIS CATCHES**: Would catch a loop that only checks the running
/// flag, which the quick `start()` has already set back to true.
#[tokio::test]
async fn given_quick_restart_when_running_then_only_one_loop_keeps_polling() {
    // GIVEN: A running bridge with a read in flight
    let (bus, _) = ready_bus();
    let http = Arc::new(OverlapTrackingTransport::new(Duration::from_millis(50)));
    let bridge = bridge_with_transport("http://127.0.0.1:43111", bus, http.clone());
    bridge.start();
    let first_read = tokio::time::timeout(Duration::from_secs(5), async {
        while http.reads() == 0 {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    })
    .await;
    assert!(first_read.is_ok(), "bridge should start reading");

    // WHEN: Restarting while that read is still pending
    bridge.stop();
    bridge.start();
    assert!(bridge.is_running());

    // THEN: Once the old read has drained, reads never overlap again
    tokio::time::sleep(Duration::from_millis(150)).await;
    http.reset_max_in_flight();
    let reads_before = http.reads();
    tokio::time::sleep(Duration::from_millis(500)).await;
    bridge.stop();

    assert_eq!(http.max_in_flight(), 1, "a second loop is still polling");
    assert!(http.reads() > reads_before, "the new loop should keep polling");
}

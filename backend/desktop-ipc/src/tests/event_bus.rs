// Unit tests for readiness-gated event delivery.

use super::support::RecordingSink;
use crate::contracts::{DesktopEvent, EventChannel, EventMessage, SetView, ThemeChange, UpdaterEvent};
use crate::event_bus::{MainEventBus, RendererSink};
use crate::transport::{EventListener, IpcRouter, RendererTransport};

use serde_json::json;

use std::sync::mpsc;
use std::sync::{Arc, Mutex, OnceLock, Weak};
use std::thread;
use std::time::Duration;

fn bus_with_sink(sink: &Arc<RecordingSink>) -> MainEventBus {
    let sink = Arc::clone(sink);
    MainEventBus::new(move || Some(sink.clone() as Arc<dyn RendererSink>))
}

/// **VALUE**: Events emitted before `react-ready` are held, then delivered
/// once each and in emission order.
///
/// **WHY THIS MATTERS**: Startup events (initial message, theme) fire
/// before the UI has mounted its listeners. Delivering them early loses
/// them; delivering them out of order shows stale state.
///
/// **BUG THIS CATCHES**: Would catch a bus that sends to an unready sink,
/// drops queued events, or replays them out of order or twice.
#[test]
fn given_events_before_ready_when_renderer_marked_ready_then_flushed_in_order() {
    // GIVEN: A sink that is not yet ready and two emitted events
    let sink = RecordingSink::new(1);
    let bus = bus_with_sink(&sink);
    bus.emit(DesktopEvent::FocusInput);
    bus.emit(DesktopEvent::SetInitialMessage("hello".to_string()));
    assert!(sink.sent().is_empty(), "nothing delivered before readiness");

    // WHEN: The renderer signals readiness
    bus.mark_renderer_ready(1);

    // THEN: Both events arrive once, in order, with the right payloads
    assert_eq!(
        sink.sent(),
        vec![
            ("focus-input".to_string(), None),
            ("set-initial-message".to_string(), Some(json!("hello"))),
        ]
    );
    assert_eq!(bus.queued_len(), 0);
}

#[test]
fn given_ready_sink_when_emitting_then_delivered_immediately() {
    let sink = RecordingSink::new(1);
    let bus = bus_with_sink(&sink);
    bus.mark_renderer_ready(1);

    bus.emit(DesktopEvent::NewChat);

    assert_eq!(sink.sent(), vec![("new-chat".to_string(), None)]);
}

#[test]
fn given_no_sink_when_emitting_then_event_queued_without_error() {
    let bus = MainEventBus::new(|| None);

    bus.emit(DesktopEvent::NewChat);
    bus.mark_renderer_ready(1);

    assert_eq!(bus.queued_len(), 1);
}

#[test]
fn given_other_renderer_ready_when_flushing_then_current_sink_not_served() {
    // GIVEN: The current sink is renderer 2
    let sink = RecordingSink::new(2);
    let bus = bus_with_sink(&sink);
    bus.emit(DesktopEvent::NewChat);

    // WHEN: A different renderer id becomes ready
    bus.mark_renderer_ready(1);

    // THEN: Nothing is delivered and the queue is untouched
    assert!(sink.sent().is_empty());
    assert_eq!(bus.queued_len(), 1);
    assert!(bus.is_renderer_ready(1));
    assert!(!bus.is_renderer_ready(2));
}

#[test]
fn given_destroyed_sink_when_emitting_then_event_queued() {
    let sink = RecordingSink::new(1);
    let bus = bus_with_sink(&sink);
    bus.mark_renderer_ready(1);
    sink.destroy();

    bus.emit(DesktopEvent::NewChat);

    assert!(sink.sent().is_empty());
    assert_eq!(bus.queued_len(), 1);
}

/// **BUG THIS CATCHES**: Would catch a flush that keeps draining into a
/// sink that disappeared mid-flush, losing the remaining events.
#[test]
fn given_sink_disappears_mid_flush_when_flushing_then_remaining_events_stay_queued() {
    // GIVEN: A provider that hands out the sink only twice
    let sink = RecordingSink::new(1);
    let remaining = Arc::new(Mutex::new(2u32));
    let provider_sink = Arc::clone(&sink);
    let provider_budget = Arc::clone(&remaining);
    let bus = MainEventBus::new(move || {
        let mut budget = provider_budget.lock().unwrap();
        if *budget == 0 {
            return None;
        }
        *budget -= 1;
        Some(provider_sink.clone() as Arc<dyn RendererSink>)
    });

    // Emits each consume one provider call while queueing.
    *remaining.lock().unwrap() = 10;
    for _ in 0..3 {
        bus.emit(DesktopEvent::NewChat);
    }
    *remaining.lock().unwrap() = 2;

    // WHEN: Readiness triggers a flush that loses the sink after two items
    bus.mark_renderer_ready(1);

    // THEN: Two were delivered and one is kept for later
    assert_eq!(sink.sent().len(), 2);
    assert_eq!(bus.queued_len(), 1);
}

#[test]
fn given_pending_queue_when_ready_sink_emits_then_order_is_preserved() {
    // GIVEN: An event stuck while no sink existed
    let current: Arc<Mutex<Option<Arc<RecordingSink>>>> = Arc::new(Mutex::new(None));
    let provider = Arc::clone(&current);
    let bus = MainEventBus::new(move || {
        provider
            .lock()
            .unwrap()
            .clone()
            .map(|sink| sink as Arc<dyn RendererSink>)
    });
    bus.mark_renderer_ready(1);
    bus.emit(DesktopEvent::FindNext);

    // WHEN: A ready sink appears and a new event is emitted
    let sink = RecordingSink::new(1);
    *current.lock().unwrap() = Some(Arc::clone(&sink));
    bus.emit(DesktopEvent::FindPrevious);

    // THEN: The older event still goes first
    let channels: Vec<String> = sink.sent().into_iter().map(|(channel, _)| channel).collect();
    assert_eq!(channels, vec!["find-next", "find-previous"]);
}

/// **VALUE**: A renderer listener may emit into the bus while it is being
/// called.
///
/// **WHY THIS MATTERS**: Listeners are UI code, and CMD handlers such as
/// `create-chat-window` emit events. Delivering under the bus lock would
/// block the thread forever on the first re-entrant emit.
///
/// **BUG THIS CATCHES**: Would catch a bus that calls the sink while still
/// holding its queue lock, or that delivers the nested event ahead of older
/// queued ones.
#[test]
fn given_listener_emitting_back_into_bus_when_flushing_then_no_deadlock_and_order_kept() {
    // GIVEN: A router sink whose `new-chat` listener emits `focus-input`
    let router = Arc::new(IpcRouter::new(1));
    let weak_router: Weak<IpcRouter> = Arc::downgrade(&router);
    let bus = Arc::new(MainEventBus::new(move || {
        weak_router.upgrade().map(|router| router as Arc<dyn RendererSink>)
    }));
    let bus_slot: Arc<OnceLock<Weak<MainEventBus>>> = Arc::new(OnceLock::new());
    let _ = bus_slot.set(Arc::downgrade(&bus));

    let delivered = Arc::new(Mutex::new(Vec::new()));
    let reentrant_slot = Arc::clone(&bus_slot);
    let new_chat_log = Arc::clone(&delivered);
    let on_new_chat: EventListener = Arc::new(move |_| {
        new_chat_log.lock().unwrap().push("new-chat");
        if let Some(bus) = reentrant_slot.get().and_then(Weak::upgrade) {
            bus.emit(DesktopEvent::FocusInput);
        }
    });
    let focus_log = Arc::clone(&delivered);
    let on_focus: EventListener = Arc::new(move |_| focus_log.lock().unwrap().push("focus-input"));
    RendererTransport::on(&*router, "new-chat", on_new_chat);
    RendererTransport::on(&*router, "focus-input", on_focus);

    bus.emit(DesktopEvent::NewChat);
    bus.emit(DesktopEvent::FindNext);

    // WHEN: Readiness flushes the queue on another thread
    let (done_tx, done_rx) = mpsc::channel();
    let flushing_bus = Arc::clone(&bus);
    thread::spawn(move || {
        flushing_bus.mark_renderer_ready(1);
        let _ = done_tx.send(());
    });

    // THEN: The flush finishes and the nested event follows the older ones
    assert!(
        done_rx.recv_timeout(Duration::from_secs(3)).is_ok(),
        "flush did not finish"
    );
    assert_eq!(*delivered.lock().unwrap(), vec!["new-chat", "focus-input"]);
    assert_eq!(bus.queued_len(), 0);

    // A direct emit from a listener on a ready bus also completes
    bus.emit(DesktopEvent::NewChat);
    assert_eq!(
        *delivered.lock().unwrap(),
        vec!["new-chat", "focus-input", "new-chat", "focus-input"]
    );
}

#[test]
fn given_repeated_ready_calls_when_marking_then_idempotent_and_flush_retried() {
    let sink = RecordingSink::new(1);
    let bus = bus_with_sink(&sink);
    bus.mark_renderer_ready(1);
    bus.mark_renderer_ready(1);

    bus.emit_message(EventMessage::new(EventChannel::FatalError, Some(json!("boom"))));

    assert_eq!(sink.sent().len(), 1);
}

#[test]
fn given_theme_event_when_converted_then_payload_uses_wire_field_names() {
    let message: EventMessage = DesktopEvent::ThemeChanged(ThemeChange {
        mode: "dark".to_string(),
        use_system_theme: false,
        theme: "nord".to_string(),
    })
    .into();

    assert_eq!(message.channel, EventChannel::ThemeChanged);
    assert_eq!(
        message.payload,
        Some(json!({"mode": "dark", "useSystemTheme": false, "theme": "nord"}))
    );
}

#[test]
fn given_optional_payload_fields_when_converted_then_absent_ones_are_omitted() {
    // GIVEN: One view with a tab and one update without data
    let view: EventMessage = DesktopEvent::SetView(SetView {
        view: "settings".to_string(),
        tab: Some("models".to_string()),
    })
    .into();
    let update: EventMessage = DesktopEvent::UpdaterEvent(UpdaterEvent {
        event: "checking".to_string(),
        data: None,
    })
    .into();

    // WHEN / THEN: Present fields are written, absent ones left out
    assert_eq!(view.payload, Some(json!({"view": "settings", "tab": "models"})));
    assert_eq!(update.channel, EventChannel::UpdaterEvent);
    assert_eq!(update.payload, Some(json!({"event": "checking"})));
}

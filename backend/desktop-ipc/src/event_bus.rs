//! Readiness-gated delivery of main → UI events.
//!
//! Events emitted before the UI has signalled `react-ready` are queued and
//! flushed, in emission order, once the current sink's id is marked ready.
//! The queue has no size bound.

use crate::contracts::{DesktopEvent, EventMessage};

use log::{debug, trace};
use serde_json::Value;

use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;

/// The UI endpoint events are delivered to.
pub trait RendererSink: Send + Sync {
    fn id(&self) -> u32;

    fn send(&self, channel: &str, payload: Option<&Value>);

    fn is_destroyed(&self) -> bool {
        false
    }
}

type SinkProvider = Box<dyn Fn() -> Option<Arc<dyn RendererSink>> + Send + Sync>;

#[derive(Default)]
struct BusState {
    ready_renderer_ids: HashSet<u32>,
    queue: VecDeque<EventMessage>,
    flushing: bool,
}

/// Sinks are called without the bus lock held, so a listener may emit back
/// into the bus. Events emitted while a flush is running are appended to
/// the queue and delivered by that flush, after the older events.
pub struct MainEventBus {
    sink_provider: SinkProvider,
    state: Mutex<BusState>,
}

impl MainEventBus {
    /// `sink_provider` is asked for the current sink on every delivery; it
    /// may return `None` while no UI exists.
    pub fn new<F>(sink_provider: F) -> Self
    where
        F: Fn() -> Option<Arc<dyn RendererSink>> + Send + Sync + 'static,
    {
        Self {
            sink_provider: Box::new(sink_provider),
            state: Mutex::new(BusState::default()),
        }
    }

    pub fn emit(&self, event: DesktopEvent) {
        self.emit_message(event.into());
    }

    pub fn emit_message(&self, message: EventMessage) {
        let sink = (self.sink_provider)();
        let mut state = self.lock_state();

        let Some(sink) = sink.filter(|sink| Self::is_ready(&state, sink.as_ref())) else {
            trace!("Queueing {} until renderer is ready", message.channel);
            state.queue.push_back(message);
            return;
        };

        if state.queue.is_empty() && !state.flushing {
            drop(state);
            sink.send(message.channel.as_str(), message.payload.as_ref());
            return;
        }

        // Older events are still pending; keep emission order.
        state.queue.push_back(message);
        drop(state);
        self.flush(sink.id());
    }

    /// Marks `renderer_id` ready and flushes the queue to it. Calling this
    /// again for an already-ready id only retries the flush.
    pub fn mark_renderer_ready(&self, renderer_id: u32) {
        if self.lock_state().ready_renderer_ids.insert(renderer_id) {
            debug!("Renderer {renderer_id} is ready");
        }
        self.flush(renderer_id);
    }

    pub fn is_renderer_ready(&self, renderer_id: u32) -> bool {
        self.lock_state().ready_renderer_ids.contains(&renderer_id)
    }

    pub fn queued_len(&self) -> usize {
        self.lock_state().queue.len()
    }

    fn is_ready(state: &BusState, sink: &dyn RendererSink) -> bool {
        !sink.is_destroyed() && state.ready_renderer_ids.contains(&sink.id())
    }

    fn current_sink_for(&self, renderer_id: u32) -> Option<Arc<dyn RendererSink>> {
        (self.sink_provider)().filter(|sink| sink.id() == renderer_id && !sink.is_destroyed())
    }

    /// Drains the queue one event at a time, releasing the lock around each
    /// delivery. Only one flush runs at a time; a nested call returns and
    /// leaves the work to the running one.
    fn flush(&self, renderer_id: u32) {
        {
            let mut state = self.lock_state();
            if state.flushing {
                return;
            }
            state.flushing = true;
        }
        let _flushing = FlushingGuard { bus: self };

        let mut delivered = 0usize;
        loop {
            let next = {
                let mut state = self.lock_state();
                match state.queue.pop_front() {
                    Some(next) => next,
                    None => {
                        state.flushing = false;
                        break;
                    }
                }
            };
            let Some(sink) = self.current_sink_for(renderer_id) else {
                let mut state = self.lock_state();
                state.queue.push_front(next);
                state.flushing = false;
                break;
            };
            sink.send(next.channel.as_str(), next.payload.as_ref());
            delivered += 1;
        }

        if delivered > 0 {
            debug!(
                "Flushed {delivered} queued event(s) to renderer {renderer_id}, {} still queued",
                self.queued_len()
            );
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, BusState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

struct FlushingGuard<'a> {
    bus: &'a MainEventBus,
}

/// Releases the flushing flag if a listener panics mid-flush.
impl Drop for FlushingGuard<'_> {
    fn drop(&mut self) {
        if thread::panicking() {
            self.bus.lock_state().flushing = false;
        }
    }
}

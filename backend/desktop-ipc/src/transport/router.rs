use super::{EventListener, ListenerId, RendererTransport};
use crate::error::TransportError;
use crate::event_bus::RendererSink;
use crate::registry::{CmdEvent, CmdHandler, InvokeEvent, IpcMain, RpcHandler};
use crate::contracts::{CmdChannel, RpcChannel};

use common::ErrorLocation;

use log::{trace, warn};
use serde_json::Value;

use std::collections::HashMap;
use std::future::Future;
use std::panic::Location;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

type Listeners = HashMap<String, Vec<(ListenerId, EventListener)>>;

/// In-process IPC router for a single renderer.
///
/// Acts as the main process's [`IpcMain`], the renderer's
/// [`RendererTransport`], and the event bus's [`RendererSink`] at once.
pub struct IpcRouter {
    renderer_id: u32,
    destroyed: AtomicBool,
    rpc_handlers: RwLock<HashMap<RpcChannel, RpcHandler>>,
    cmd_handlers: RwLock<HashMap<CmdChannel, CmdHandler>>,
    listeners: RwLock<Listeners>,
    next_listener_id: AtomicU64,
}

impl IpcRouter {
    pub fn new(renderer_id: u32) -> Self {
        Self {
            renderer_id,
            destroyed: AtomicBool::new(false),
            rpc_handlers: RwLock::new(HashMap::new()),
            cmd_handlers: RwLock::new(HashMap::new()),
            listeners: RwLock::new(HashMap::new()),
            next_listener_id: AtomicU64::new(1),
        }
    }

    pub fn renderer_id(&self) -> u32 {
        self.renderer_id
    }

    /// Marks the renderer gone. Events stop being deliverable and start
    /// queueing on the bus.
    pub fn destroy(&self) {
        self.destroyed.store(true, Ordering::SeqCst);
    }

    fn command(&self, channel: &str, payload: Option<Value>) -> Option<Value> {
        let handler = channel
            .parse::<CmdChannel>()
            .ok()
            .and_then(|channel| read(&self.cmd_handlers).get(&channel).cloned());

        let Some(handler) = handler else {
            warn!("No command handler registered for '{channel}'");
            return None;
        };

        let mut event = CmdEvent::new(self.renderer_id);
        handler(payload, &mut event);
        event.return_value
    }
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

impl IpcMain for IpcRouter {
    fn handle(&self, channel: RpcChannel, handler: RpcHandler) {
        if write(&self.rpc_handlers).insert(channel, handler).is_some() {
            warn!("Replaced RPC handler for '{channel}'");
        }
    }

    fn on(&self, channel: CmdChannel, handler: CmdHandler) {
        if write(&self.cmd_handlers).insert(channel, handler).is_some() {
            warn!("Replaced command handler for '{channel}'");
        }
    }
}

impl RendererTransport for IpcRouter {
    fn invoke(
        &self,
        channel: &str,
        payload: Option<Value>,
    ) -> impl Future<Output = Result<Value, TransportError>> + Send {
        let handler = channel
            .parse::<RpcChannel>()
            .ok()
            .and_then(|channel| read(&self.rpc_handlers).get(&channel).cloned());
        let event = InvokeEvent {
            sender_id: self.renderer_id,
        };
        let location = ErrorLocation::from(Location::caller());
        let channel = channel.to_string();

        async move {
            let Some(handler) = handler else {
                return Err(TransportError::Failed {
                    message: format!("No handler registered for '{channel}'"),
                    location,
                });
            };

            handler(payload, event).await.map_err(TransportError::from)
        }
    }

    fn send(&self, channel: &str, payload: Option<Value>) {
        self.command(channel, payload);
    }

    fn send_sync(&self, channel: &str, payload: Option<Value>) -> Option<Value> {
        self.command(channel, payload)
    }

    fn on(&self, channel: &str, listener: EventListener) -> ListenerId {
        let id = ListenerId(self.next_listener_id.fetch_add(1, Ordering::SeqCst));
        write(&self.listeners)
            .entry(channel.to_string())
            .or_default()
            .push((id, listener));
        id
    }

    fn remove_listener(&self, channel: &str, id: ListenerId) -> bool {
        let mut listeners = write(&self.listeners);
        let Some(registered) = listeners.get_mut(channel) else {
            return false;
        };

        let before = registered.len();
        registered.retain(|(candidate, _)| *candidate != id);
        let removed = registered.len() != before;

        if registered.is_empty() {
            listeners.remove(channel);
        }
        removed
    }
}

impl RendererSink for IpcRouter {
    fn id(&self) -> u32 {
        self.renderer_id
    }

    fn send(&self, channel: &str, payload: Option<&Value>) {
        // Snapshot so listeners may (un)subscribe while being called.
        let listeners: Vec<EventListener> = read(&self.listeners)
            .get(channel)
            .map(|registered| registered.iter().map(|(_, listener)| listener.clone()).collect())
            .unwrap_or_default();

        if listeners.is_empty() {
            trace!("No listeners for '{channel}'");
        }

        for listener in listeners {
            listener(payload);
        }
    }

    fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::SeqCst)
    }
}

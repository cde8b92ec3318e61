//! Main-process IPC registry.
//!
//! Every channel in the inventory gets a handler: implemented channels run
//! their dependency, the rest fall back deterministically (`IPC_NOT_FOUND`
//! for RPC, a no-op for CMD).

mod cmd;
mod rpc;
pub mod validation;

pub use cmd::{CmdDependencies, WindowController, create_cmd_handler_map};
pub use rpc::{RpcDependencies, create_rpc_handler_map};

use crate::contracts::{CmdChannel, RpcChannel};
use crate::event_bus::MainEventBus;
use crate::protocol::{ProtocolError, ProtocolResult};

use futures_util::future::BoxFuture;
use log::{debug, trace};
use serde_json::Value;

use std::collections::HashMap;
use std::future;
use std::sync::Arc;

/// Metadata of an RPC call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvokeEvent {
    pub sender_id: u32,
}

/// Metadata of a CMD call. Handlers of synchronous commands write their
/// answer into `return_value`.
#[derive(Debug, Clone, PartialEq)]
pub struct CmdEvent {
    pub sender_id: u32,
    pub return_value: Option<Value>,
}

impl CmdEvent {
    pub fn new(sender_id: u32) -> Self {
        Self {
            sender_id,
            return_value: None,
        }
    }
}

pub type RpcFuture = BoxFuture<'static, ProtocolResult<Value>>;
pub type RpcHandler = Arc<dyn Fn(Option<Value>, InvokeEvent) -> RpcFuture + Send + Sync>;
pub type CmdHandler = Arc<dyn Fn(Option<Value>, &mut CmdEvent) + Send + Sync>;

/// Total map from every [`RpcChannel`] to a handler.
#[derive(Clone)]
pub struct RpcHandlerMap {
    handlers: HashMap<RpcChannel, RpcHandler>,
}

impl RpcHandlerMap {
    /// Fills every channel missing from `implemented` with the
    /// not-implemented handler.
    pub fn from_implemented(mut implemented: HashMap<RpcChannel, RpcHandler>) -> Self {
        let handlers = RpcChannel::ALL
            .iter()
            .map(|&channel| {
                let handler = implemented
                    .remove(&channel)
                    .unwrap_or_else(|| unsupported_rpc_handler(channel));
                (channel, handler)
            })
            .collect();

        Self { handlers }
    }

    pub fn get(&self, channel: RpcChannel) -> RpcHandler {
        match self.handlers.get(&channel) {
            Some(handler) => Arc::clone(handler),
            None => unsupported_rpc_handler(channel),
        }
    }

    pub async fn call(
        &self,
        channel: RpcChannel,
        payload: Option<Value>,
        event: InvokeEvent,
    ) -> ProtocolResult<Value> {
        (self.get(channel))(payload, event).await
    }

    pub fn channels(&self) -> impl Iterator<Item = RpcChannel> + '_ {
        self.handlers.keys().copied()
    }
}

/// Total map from every [`CmdChannel`] to a handler.
#[derive(Clone)]
pub struct CmdHandlerMap {
    handlers: HashMap<CmdChannel, CmdHandler>,
}

impl CmdHandlerMap {
    pub fn from_implemented(mut implemented: HashMap<CmdChannel, CmdHandler>) -> Self {
        let handlers = CmdChannel::ALL
            .iter()
            .map(|&channel| {
                let handler = implemented
                    .remove(&channel)
                    .unwrap_or_else(|| unsupported_cmd_handler(channel));
                (channel, handler)
            })
            .collect();

        Self { handlers }
    }

    pub fn get(&self, channel: CmdChannel) -> CmdHandler {
        match self.handlers.get(&channel) {
            Some(handler) => Arc::clone(handler),
            None => unsupported_cmd_handler(channel),
        }
    }

    pub fn call(&self, channel: CmdChannel, payload: Option<Value>, event: &mut CmdEvent) {
        (self.get(channel))(payload, event)
    }

    pub fn channels(&self) -> impl Iterator<Item = CmdChannel> + '_ {
        self.handlers.keys().copied()
    }
}

fn unsupported_rpc_handler(channel: RpcChannel) -> RpcHandler {
    Arc::new(move |_payload: Option<Value>, _event: InvokeEvent| -> RpcFuture {
        let result: ProtocolResult<Value> = Err(ProtocolError::not_found(format!(
            "IPC channel is not implemented: {channel}"
        ))
        .with_detail("channel", channel.as_str()));
        Box::pin(future::ready(result))
    })
}

fn unsupported_cmd_handler(channel: CmdChannel) -> CmdHandler {
    Arc::new(move |_payload: Option<Value>, _event: &mut CmdEvent| {
        trace!("Ignoring unimplemented command channel {channel}");
    })
}

/// The host's request/command dispatch primitive.
pub trait IpcMain {
    fn handle(&self, channel: RpcChannel, handler: RpcHandler);

    fn on(&self, channel: CmdChannel, handler: CmdHandler);
}

pub struct RegisteredHandlers {
    pub rpc: RpcHandlerMap,
    pub cmd: CmdHandlerMap,
}

/// Builds both handler maps and binds every channel on `ipc_main`.
pub fn register_desktop_ipc<M, R, C>(
    ipc_main: &M,
    rpc: Arc<R>,
    cmd: Arc<C>,
    event_bus: Arc<MainEventBus>,
) -> RegisteredHandlers
where
    M: IpcMain + ?Sized,
    R: RpcDependencies,
    C: CmdDependencies,
{
    let rpc = create_rpc_handler_map(rpc);
    let cmd = create_cmd_handler_map(cmd, event_bus);

    for &channel in RpcChannel::ALL {
        ipc_main.handle(channel, rpc.get(channel));
    }

    for &channel in CmdChannel::ALL {
        ipc_main.on(channel, cmd.get(channel));
    }

    debug!(
        "Registered {} RPC and {} CMD channels",
        RpcChannel::ALL.len(),
        CmdChannel::ALL.len()
    );

    RegisteredHandlers { rpc, cmd }
}

//! The renderer side of the IPC boundary.
//!
//! [`RendererTransport`] is the seam the UI-facing adapter talks to. In the
//! desktop shell it is backed by the platform's IPC; [`IpcRouter`] is the
//! in-process implementation used by headless hosts and tests.

mod router;

pub use router::IpcRouter;

use crate::error::TransportError;

use serde_json::Value;

use std::future::Future;
use std::sync::Arc;

pub type EventListener = Arc<dyn Fn(Option<&Value>) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

pub trait RendererTransport: Send + Sync + 'static {
    /// Request/response call. A handler rejection arrives as
    /// [`TransportError::Rejected`] carrying the serialized error.
    fn invoke(
        &self,
        channel: &str,
        payload: Option<Value>,
    ) -> impl Future<Output = Result<Value, TransportError>> + Send;

    fn send(&self, channel: &str, payload: Option<Value>);

    /// Synchronous command returning the handler's `return_value`.
    fn send_sync(&self, channel: &str, payload: Option<Value>) -> Option<Value>;

    fn on(&self, channel: &str, listener: EventListener) -> ListenerId;

    /// Returns `false` if the listener was already removed.
    fn remove_listener(&self, channel: &str, id: ListenerId) -> bool;
}

//! The IPC channel inventory and the payload shapes that travel over it.
//!
//! The three name lists are a boundary contract with already-built UI
//! bundles: they are exhaustive and must not drift.

mod channels;
pub mod events;
pub mod payloads;

pub use channels::{CmdChannel, EventChannel, RpcChannel};
pub use events::{DesktopEvent, EventMessage};
pub use payloads::{
    Accepted, AddRecentDirRequest, AppDirs, CreateChatWindowPayload, DesktopState,
    EnsureDirectoryRequest, FileReadResult, ListFilesRequest, NotifyPayload,
    OpenDirectoryRequest, ReadFileRequest, SelectFileOrDirectoryRequest, SendLogsResult, SetView,
    ThemeChange, UpdaterEvent, UrlRequest, WriteFileRequest,
};

/// Renderer-facing channel carrying every backend → UI protocol message.
pub const IPC_MESSAGE_EVENT_CHANNEL: &str = "desktop:message-event";

/// The complete channel inventory, in declaration order.
#[derive(Debug, Clone, Copy)]
pub struct IpcInventory {
    pub rpc: &'static [RpcChannel],
    pub cmd: &'static [CmdChannel],
    pub event: &'static [EventChannel],
}

pub const IPC_INVENTORY: IpcInventory = IpcInventory {
    rpc: RpcChannel::ALL,
    cmd: CmdChannel::ALL,
    event: EventChannel::ALL,
};

//! IPC boundary between the desktop UI process, the main process and the
//! locally spawned backend process.
//!
//! # Layers
//!
//! - [`protocol`]: wire envelopes, topic sets, structural guards, canonical errors
//! - [`error`]: crate error enums and the failure normalizer
//! - [`contracts`]: the RPC / CMD / event channel inventory and payload shapes
//! - [`event_bus`]: readiness-gated main → UI event queue
//! - [`registry`]: channel → handler maps, payload validation, registration
//! - [`transport`]: renderer-side transport seam and the in-process router
//! - [`client`]: UI-facing adapter (`invoke` / `send` / `on`)
//! - [`bridge`]: HTTP/SSE relay to the backend process
//!
//! Supporting services: [`notifications`] (dedup contract), [`send_logs`],
//! [`config`].

pub mod bridge;
pub mod client;
pub mod config;
pub mod contracts;
pub mod error;
pub mod event_bus;
pub mod notifications;
pub mod protocol;
pub mod registry;
pub mod send_logs;
pub mod transport;

#[cfg(test)]
mod tests;

pub const BACKEND_DEFAULT_HOSTNAME: &str = "127.0.0.1";
pub const BACKEND_DEFAULT_PORT: u16 = 43111;
pub const BACKEND_DEFAULT_BASE_URL: &str =
    const_format::concatcp!("http://", BACKEND_DEFAULT_HOSTNAME, ":", BACKEND_DEFAULT_PORT);

/// Header carrying the shared secret on every privileged backend call.
pub const SECRET_KEY_HEADER: &str = "x-secret-key";

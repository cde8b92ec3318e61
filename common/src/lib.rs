//! Shared building blocks for the agent desktop workspace.
//!
//! Everything here is leaf-level: no IPC semantics, no I/O. The
//! `desktop-ipc` core and the `agent-desktop` host both depend on it.
//!
//! - [`ErrorLocation`]: call-site capture for every error enum
//! - [`HttpStatusCode`]: status classification for the backend bridge
//! - [`RedactedSecret`]: the backend shared secret, never logged

pub mod error;
pub mod http_status;
pub mod redacted_secret;

pub use error::error_location::ErrorLocation;
pub use error::redact_error::RedactError;
pub use http_status::HttpStatusCode;
pub use redacted_secret::RedactedSecret;

#[cfg(test)]
mod tests;

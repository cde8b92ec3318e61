pub mod api;
pub mod config;
pub mod contract;
pub mod http;
pub mod normalize;
pub mod notification;
pub mod transport;

pub use api::DesktopApiError;
pub use config::ConfigError;
pub use contract::UnknownChannelError;
pub use http::HttpError;
pub use normalize::{normalize_error, normalize_ipc_error};
pub use notification::NotificationError;
pub use transport::TransportError;

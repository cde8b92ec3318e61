use thiserror::Error as ThisError;

#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
#[error("Unknown IPC channel: {channel}")]
pub struct UnknownChannelError {
    pub channel: String,
}

use common::ErrorLocation;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum NotificationError {
    #[error("Notification Error: {message} {location}")]
    Show {
        message: String,
        location: ErrorLocation,
    },
}

use common::ErrorLocation;

use thiserror::Error as ThisError;

use std::error::Error as StdError;
use std::panic::Location;

pub type BoxedSource = Box<dyn StdError + Send + Sync + 'static>;

#[derive(Debug, ThisError)]
pub enum HttpError {
    #[error("HTTP Error: {message} {location}")]
    Request {
        message: String,
        location: ErrorLocation,
        #[source]
        source: BoxedSource,
    },

    #[error("HTTP Body Error: {message} {location}")]
    Body {
        message: String,
        location: ErrorLocation,
    },
}

impl HttpError {
    #[track_caller]
    pub fn request(source: impl Into<BoxedSource>) -> Self {
        let source = source.into();
        HttpError::Request {
            message: source.to_string(),
            location: ErrorLocation::from(Location::caller()),
            source,
        }
    }
}

impl From<reqwest::Error> for HttpError {
    #[track_caller]
    fn from(error: reqwest::Error) -> Self {
        HttpError::Request {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
            source: Box::new(error),
        }
    }
}

use crate::SECRET_KEY_HEADER;
use crate::error::HttpError;

use common::HttpStatusCode;

use futures_util::future::BoxFuture;
use reqwest::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde_json::Value;

use std::time::Duration;

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const EVENT_STREAM_MIME: &str = "text/event-stream";
const JSON_MIME: &str = "application/json";

/// Status and fully-read body of an HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: HttpStatusCode,
    pub body: String,
}

/// The two HTTP calls the backend conversation needs. Both attach the
/// shared secret as [`SECRET_KEY_HEADER`].
pub trait HttpTransport: Send + Sync {
    fn post_json<'a>(
        &'a self,
        url: &'a str,
        secret: &'a str,
        body: &'a Value,
    ) -> BoxFuture<'a, Result<HttpReply, HttpError>>;

    fn get_event_stream<'a>(
        &'a self,
        url: &'a str,
        secret: &'a str,
    ) -> BoxFuture<'a, Result<HttpReply, HttpError>>;
}

#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Only connecting is time-limited; a stream read lasts as long as the
    /// backend keeps it open.
    pub fn new() -> Result<Self, HttpError> {
        let client = Client::builder()
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .build()?;

        Ok(Self { client })
    }
}

impl HttpTransport for ReqwestTransport {
    fn post_json<'a>(
        &'a self,
        url: &'a str,
        secret: &'a str,
        body: &'a Value,
    ) -> BoxFuture<'a, Result<HttpReply, HttpError>> {
        Box::pin(async move {
            let response = self
                .client
                .post(url)
                .header(CONTENT_TYPE, JSON_MIME)
                .header(SECRET_KEY_HEADER, secret)
                .json(body)
                .send()
                .await?;

            let status = HttpStatusCode::from(response.status().as_u16());
            let body = response.text().await?;
            Ok(HttpReply { status, body })
        })
    }

    fn get_event_stream<'a>(
        &'a self,
        url: &'a str,
        secret: &'a str,
    ) -> BoxFuture<'a, Result<HttpReply, HttpError>> {
        Box::pin(async move {
            let response = self
                .client
                .get(url)
                .header(ACCEPT, EVENT_STREAM_MIME)
                .header(SECRET_KEY_HEADER, secret)
                .send()
                .await?;

            let status = HttpStatusCode::from(response.status().as_u16());
            let body = response.text().await?;
            Ok(HttpReply { status, body })
        })
    }
}

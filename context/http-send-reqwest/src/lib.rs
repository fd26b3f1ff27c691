//! [`HttpSend`] implementation backed by [`reqwest`].
//!
//! Requests without a body are bounded by a short timeout, requests carrying a
//! body (uploads, large PUTs) get a long one.

use std::time::Duration;

use async_trait::async_trait;
use azrest_core::{Error, HttpSend, Result};
use bytes::Bytes;
use http_body_util::BodyExt;
use reqwest::{Client, Request};

/// Default timeout for requests without a body.
pub const DEFAULT_SHORT_TIMEOUT: Duration = Duration::from_secs(120);
/// Default timeout for requests carrying a body.
pub const DEFAULT_LONG_TIMEOUT: Duration = Duration::from_secs(3600);

/// Send http requests with a shared [`reqwest::Client`].
#[derive(Debug, Clone)]
pub struct ReqwestHttpSend {
    client: Client,
    short_timeout: Duration,
    long_timeout: Duration,
}

impl Default for ReqwestHttpSend {
    fn default() -> Self {
        Self::new(Client::new())
    }
}

impl ReqwestHttpSend {
    /// Create a new ReqwestHttpSend with a reqwest::Client.
    pub fn new(client: Client) -> Self {
        Self {
            client,
            short_timeout: DEFAULT_SHORT_TIMEOUT,
            long_timeout: DEFAULT_LONG_TIMEOUT,
        }
    }

    /// Set the timeout applied to requests without a body.
    pub fn with_short_timeout(mut self, timeout: Duration) -> Self {
        self.short_timeout = timeout;
        self
    }

    /// Set the timeout applied to requests with a body.
    pub fn with_long_timeout(mut self, timeout: Duration) -> Self {
        self.long_timeout = timeout;
        self
    }

    fn timeout_for(&self, body: &Bytes) -> Duration {
        if body.is_empty() {
            self.short_timeout
        } else {
            self.long_timeout
        }
    }
}

#[async_trait]
impl HttpSend for ReqwestHttpSend {
    async fn http_send(&self, req: http::Request<Bytes>) -> Result<http::Response<Bytes>> {
        let timeout = self.timeout_for(req.body());
        let mut req = Request::try_from(req)
            .map_err(|e| Error::request_invalid("failed to convert request").with_source(e))?;
        *req.timeout_mut() = Some(timeout);

        let method = req.method().clone();
        let url = req.url().clone();
        let resp = self.client.execute(req).await.map_err(|e| {
            log::warn!("{method} {url} failed: {e}");
            if e.is_timeout() {
                Error::timeout(format!("{method} {url} timed out after {timeout:?}")).with_source(e)
            } else {
                Error::unexpected(format!("failed to send {method} {url}")).with_source(e)
            }
        })?;
        let resp: http::Response<_> = resp.into();

        let (parts, body) = resp.into_parts();
        let bs = BodyExt::collect(body)
            .await
            .map(|buf| buf.to_bytes())
            .map_err(|e| Error::unexpected("failed to read response body").with_source(e))?;
        Ok(http::Response::from_parts(parts, bs))
    }
}

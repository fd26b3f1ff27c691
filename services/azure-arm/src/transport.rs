use async_trait::async_trait;
use azrest_core::utils::Redact;
use azrest_core::{Context, Error, HttpSend, Result};
use bytes::Bytes;
use http::header::AUTHORIZATION;
use http::Method;

/// Wrap the sender of a [`Context`] with the read-only gate and debug dumps.
///
/// Token requests pass through this sender too: POSTs to the token endpoints
/// are allowed in read-only mode.
#[derive(Debug)]
pub(crate) struct CheckedHttpSend {
    inner: Context,
    read_only: bool,
    debug: bool,
}

impl CheckedHttpSend {
    pub(crate) fn new(inner: Context, read_only: bool, debug: bool) -> Self {
        Self {
            inner,
            read_only,
            debug,
        }
    }
}

fn is_token_request(method: &Method, path: &str) -> bool {
    let path = path.trim_end_matches('/');
    method == Method::POST && (path.ends_with("oauth2/token") || path.ends_with("oauth2/v2.0/token"))
}

/// Read-only clients may only GET, plus POST to a token endpoint.
pub(crate) fn is_allowed_read_only(method: &Method, path: &str) -> bool {
    method == Method::GET || is_token_request(method, path)
}

#[async_trait]
impl HttpSend for CheckedHttpSend {
    async fn http_send(&self, req: http::Request<Bytes>) -> Result<http::Response<Bytes>> {
        let method = req.method().clone();
        let uri = req.uri().clone();

        if self.read_only && !is_allowed_read_only(&method, uri.path()) {
            return Err(Error::account_read_only(format!(
                "{method} {uri} is not allowed for a read only account"
            )));
        }

        // Token requests carry the client secret in their body.
        let dump = self.debug && !is_token_request(&method, uri.path());
        if dump {
            log::debug!("{method} {uri}");
            if let Some(auth) = req.headers().get(AUTHORIZATION) {
                log::debug!("Authorization: {}", Redact::from(auth));
            }
            if !req.body().is_empty() {
                log::debug!("request body: {}", String::from_utf8_lossy(req.body()));
            }
        }

        let resp = self.inner.http_send(req).await?;
        if dump {
            log::debug!(
                "{method} {uri} response {}: {}",
                resp.status(),
                String::from_utf8_lossy(resp.body())
            );
        }
        if resp.status().is_server_error() {
            log::warn!("{method} {uri} responded {}", resp.status());
        }
        Ok(resp)
    }
}

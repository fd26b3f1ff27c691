//! Poll long-running operations to completion.

use std::time::Duration;

use azrest_core::{Error, ErrorKind, Result};
use http::header::LOCATION;
use http::{HeaderMap, Method, StatusCode};
use serde_json::Value;
use tokio::time::Instant;

use crate::client::decode_json;
use crate::constants::*;
use crate::{error, AzureClient, Query};

/// Url to poll: `Azure-AsyncOperation` if set, else `Location`.
pub(crate) fn poll_url(headers: &HeaderMap) -> Option<String> {
    [AZURE_ASYNC_OPERATION, LOCATION.as_str()]
        .iter()
        .filter_map(|h| headers.get(*h))
        .filter_map(|v| v.to_str().ok())
        .map(str::trim)
        .find(|v| !v.is_empty())
        .map(str::to_string)
}

/// Seconds announced by `Retry-After`.
pub(crate) fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

/// Copy `api_version` into `url` unless it already carries one.
fn with_api_version(url: &str, api_version: Option<&str>) -> String {
    let Some(api_version) = api_version else {
        return url.to_string();
    };
    match url.split_once('?') {
        Some((_, query)) if Query::parse(query).contains(API_VERSION) => url.to_string(),
        Some(_) => format!("{url}&{API_VERSION}={api_version}"),
        None => format!("{url}?{API_VERSION}={api_version}"),
    }
}

fn has_content(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Object(m) => !m.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

fn is_os_provisioning(code: Option<&str>) -> bool {
    code.is_some_and(|c| OS_PROVISIONING_CODES.contains(&c))
}

enum Poll {
    Pending,
    Done(Value),
}

/// Decide what a poll body means.
fn interpret(body: Value, original: &Value) -> Result<Poll> {
    let status = body
        .get("status")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    match status.as_str() {
        "Succeeded" => {
            if let Some(output) = body.pointer("/properties/output").filter(|v| !v.is_null()) {
                return Ok(Poll::Done(output.clone()));
            }
            if has_content(original) {
                Ok(Poll::Done(original.clone()))
            } else {
                Ok(Poll::Done(body))
            }
        }
        "Failed" | "Canceled" => {
            let cause = body.get("error").and_then(error::from_error_object);
            if is_os_provisioning(cause.as_ref().and_then(|e| e.code())) {
                log::debug!("ignore os provisioning failure: {body}");
                return Ok(Poll::Done(body));
            }

            let mut err = Error::new(
                ErrorKind::OperationFailed,
                format!(
                    "operation {status}: {}",
                    cause.as_ref().map(|e| e.message()).unwrap_or_default()
                ),
            );
            if let Some(cause) = cause {
                if let Some(code) = cause.code() {
                    err = err.with_code(code);
                }
                err = err.with_details(cause.details().to_vec());
            }
            Err(err)
        }
        "" if has_content(&body) => Ok(Poll::Done(body)),
        "" => Ok(Poll::Done(original.clone())),
        _ => Ok(Poll::Pending),
    }
}

impl AzureClient {
    /// Poll `url` until the operation reaches a terminal state.
    pub(crate) async fn wait_for_operation(
        &self,
        url: &str,
        api_version: Option<&str>,
        original: Value,
    ) -> Result<Value> {
        let mut url = with_api_version(url, api_version);
        let deadline = Instant::now() + self.config().lro_timeout;

        loop {
            let resp = self
                .send_raw(
                    Method::GET,
                    &url,
                    self.arm_audience(),
                    None,
                    HeaderMap::new(),
                )
                .await?;
            let status = resp.status();
            let mut delay = retry_after(resp.headers()).unwrap_or(self.config().lro_poll_interval);

            if status == StatusCode::ACCEPTED {
                if let Some(next) = resp
                    .headers()
                    .get(LOCATION)
                    .and_then(|v| v.to_str().ok())
                    .filter(|v| !v.is_empty())
                {
                    url = with_api_version(next, api_version);
                }
            } else if status.is_success() {
                match interpret(decode_json(resp.body())?, &original)? {
                    Poll::Done(v) => return Ok(v),
                    Poll::Pending => log::debug!("operation {url} still in progress"),
                }
            } else if (status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error())
                && retry_after(resp.headers()).is_some()
            {
                log::warn!("polling {url} responded {status}, retry later");
            } else {
                let err = error::parse_error(status, resp.body());
                if is_os_provisioning(err.code()) {
                    log::debug!("ignore os provisioning failure: {err}");
                    return decode_json(resp.body());
                }
                return Err(err.with_context(format!("poll {url}")));
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(Error::timeout(format!(
                    "operation {url} did not finish within {:?}",
                    self.config().lro_timeout
                )));
            }
            if now + delay > deadline {
                delay = deadline - now;
            }
            tokio::time::sleep(delay).await;
        }
    }
}

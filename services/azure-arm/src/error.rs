//! Decode the error envelopes returned by ARM and Graph.

use azrest_core::{Error, ErrorDetail, ErrorKind};
use http::StatusCode;
use serde::Deserialize;

#[derive(Default, Deserialize)]
#[serde(default)]
struct Envelope {
    error: Option<ArmError>,
    #[serde(rename = "odata.error")]
    odata_error: Option<ODataError>,
    code: Option<String>,
    message: Option<String>,
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct ArmError {
    code: String,
    message: String,
    target: Option<String>,
    details: Vec<ArmErrorDetail>,
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct ArmErrorDetail {
    code: String,
    message: String,
    target: String,
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct ODataError {
    code: String,
    message: ODataMessage,
    #[serde(rename = "requestId")]
    request_id: String,
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct ODataMessage {
    value: String,
}

/// Codes meaning Azure rejected the bearer token.
fn is_access_key_error(code: &str) -> bool {
    code.starts_with("InvalidAuthenticationToken")
        || code == "ExpiredAuthenticationToken"
        || code == "AuthenticationFailed"
}

/// Build an error from an Azure error object: `{code, message, target?, details?}`.
pub(crate) fn from_error_object(value: &serde_json::Value) -> Option<Error> {
    let error: ArmError = serde_json::from_value(value.clone()).ok()?;
    if error.code.is_empty() {
        return None;
    }
    Some(arm_error(error))
}

fn arm_error(error: ArmError) -> Error {
    let details = error
        .details
        .into_iter()
        .map(|d| ErrorDetail {
            code: d.code,
            message: d.message,
            target: d.target,
        })
        .collect();
    let mut err = Error::service(&error.code, error.message).with_details(details);
    if let Some(target) = error.target.filter(|t| !t.is_empty()) {
        err = err.with_target(target);
    }
    err
}

/// Classify a non-2xx response.
///
/// 404 always becomes [`ErrorKind::NotFound`], regardless of the body.
pub(crate) fn parse_error(status: StatusCode, body: &[u8]) -> Error {
    let text = String::from_utf8_lossy(body);
    if status == StatusCode::NOT_FOUND {
        return Error::not_found(format!("resource not found: {text}")).with_status(status);
    }

    let envelope: Envelope = serde_json::from_slice(body).unwrap_or_default();
    let err = if let Some(error) = envelope.error.filter(|e| !e.code.is_empty()) {
        arm_error(error)
    } else if let Some(error) = envelope.odata_error.filter(|e| !e.code.is_empty()) {
        let message = if error.request_id.is_empty() {
            error.message.value
        } else {
            format!("{} (request id {})", error.message.value, error.request_id)
        };
        Error::service(error.code, message)
    } else if let (Some(code), Some(message)) = (
        envelope.code.filter(|c| !c.is_empty()),
        envelope.message.filter(|m| !m.is_empty()),
    ) {
        Error::service(code, message)
    } else {
        Error::new(
            ErrorKind::Service,
            format!("request failed with status {status}: {text}"),
        )
    };

    let code = err.code().map(str::to_string);
    let err = match code {
        Some(code) if is_access_key_error(&code) => {
            Error::new(ErrorKind::InvalidAccessKey, err.message())
                .with_code(code)
                .with_details(err.details().to_vec())
        }
        None if status == StatusCode::UNAUTHORIZED => {
            Error::invalid_access_key(err.message().to_string())
        }
        _ => err,
    };
    err.with_status(status)
}

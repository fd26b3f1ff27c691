use azrest_core::{Error, ErrorKind};
use http::StatusCode;

use crate::model::StorageError;

/// Classify a non-2xx storage response.
///
/// Bodies are `<Error><Code/><Message/></Error>` documents, HEAD responses
/// and some proxies return none at all.
pub(crate) fn parse_error(status: StatusCode, body: &[u8]) -> Error {
    let text = String::from_utf8_lossy(body);
    let parsed: StorageError = quick_xml::de::from_str(&text).unwrap_or_default();

    let err = if status == StatusCode::NOT_FOUND {
        Error::not_found(format!("blob resource not found: {}", parsed.message.trim()))
    } else if parsed.code.is_empty() {
        Error::new(
            ErrorKind::Service,
            format!("storage request failed with status {status}: {text}"),
        )
    } else if status == StatusCode::FORBIDDEN && parsed.code == "AuthenticationFailed" {
        Error::invalid_access_key(parsed.message.trim().to_string())
    } else {
        Error::service(parsed.code.as_str(), parsed.message.trim())
    };

    let err = if parsed.code.is_empty() {
        err
    } else {
        err.with_code(parsed.code)
    };
    err.with_status(status)
}

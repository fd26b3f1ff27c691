use std::fmt::Write;
use std::time::Duration;

use async_trait::async_trait;
use azrest_core::hash::{base64_decode, base64_hmac_sha256};
use azrest_core::time::{format_http_date, now, DateTime};
use azrest_core::{Context, Error, Result, SignRequest, SigningMethod, SigningRequest};
use chrono::TimeDelta;
use http::header::{self, HeaderName};
use http::request::Parts;
use http::HeaderValue;
use log::debug;
use percent_encoding::utf8_percent_encode;

use crate::account_sas::AccountSharedAccessSignature;
use crate::constants::*;
use crate::Credential;

/// Standard headers in the order they appear in a SharedKey string to sign.
const STANDARD_HEADERS: [HeaderName; 11] = [
    header::CONTENT_ENCODING,
    header::CONTENT_LANGUAGE,
    header::CONTENT_LENGTH,
    HeaderName::from_static("content-md5"),
    header::CONTENT_TYPE,
    header::DATE,
    header::IF_MODIFIED_SINCE,
    header::IF_MATCH,
    header::IF_NONE_MATCH,
    header::IF_UNMODIFIED_SINCE,
    header::RANGE,
];

/// Signer for the blob endpoint of a storage account.
///
/// Every request gets `x-ms-date`, and `x-ms-version` unless the caller set
/// one. Then, by credential:
///
/// - `SharedKey`: `Authorization: SharedKey`, or an account SAS in the query
///   when signing for a duration.
///   See [Authorize with Shared Key](https://learn.microsoft.com/en-us/rest/api/storageservices/authorize-with-shared-key).
/// - `SasToken`: the token is appended to the query.
/// - `BearerToken`: `Authorization: Bearer`, header signing only.
#[derive(Debug, Default)]
pub struct RequestSigner {
    time: Option<DateTime>,
}

impl RequestSigner {
    /// Signer using the current time.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pin the signing time.
    #[cfg(test)]
    pub fn with_time(mut self, time: DateTime) -> Self {
        self.time = Some(time);
        self
    }
}

#[async_trait]
impl SignRequest for RequestSigner {
    type Credential = Credential;

    async fn sign_request(
        &self,
        _: &Context,
        parts: &mut Parts,
        credential: Option<&Self::Credential>,
        expires_in: Option<Duration>,
    ) -> Result<()> {
        let cred =
            credential.ok_or_else(|| Error::request_invalid("storage credential is required"))?;
        let method = expires_in.map_or(SigningMethod::Header, SigningMethod::Query);
        let signed_at = self.time.unwrap_or_else(now);

        let mut req = SigningRequest::build(parts)?;
        req.headers
            .entry(X_MS_VERSION)
            .or_insert(HeaderValue::from_static(AZURE_VERSION));
        req.headers
            .insert(X_MS_DATE, format_http_date(signed_at).parse()?);

        // Already encoded, appended after the request query is encoded.
        let mut extra_query = Vec::new();
        match (cred, method) {
            (Credential::SasToken { token }, _) => extra_query.push(token.clone()),
            (Credential::BearerToken { .. }, SigningMethod::Query(_)) => {
                return Err(Error::request_invalid(
                    "bearer token can't be used to presign a url",
                ));
            }
            (Credential::BearerToken { token, .. }, SigningMethod::Header) => {
                req.headers
                    .insert(header::AUTHORIZATION, sensitive(format!("Bearer {token}"))?);
            }
            (
                Credential::SharedKey {
                    account_name,
                    account_key,
                },
                SigningMethod::Query(d),
            ) => {
                let d = TimeDelta::from_std(d)
                    .map_err(|e| Error::request_invalid("invalid SAS duration").with_source(e))?;
                let sas =
                    AccountSharedAccessSignature::new(account_name, account_key, signed_at + d);
                extra_query.extend(
                    sas.token()?
                        .into_iter()
                        .map(|(k, v)| format!("{k}={}", encode(&v))),
                );
            }
            (
                Credential::SharedKey {
                    account_name,
                    account_key,
                },
                SigningMethod::Header,
            ) => {
                let key = base64_decode(account_key).map_err(|e| {
                    Error::config_invalid("account key is not valid base64").with_source(e)
                })?;
                let signature =
                    base64_hmac_sha256(&key, string_to_sign(&req, account_name)?.as_bytes());
                req.headers.insert(
                    header::AUTHORIZATION,
                    sensitive(format!("SharedKey {account_name}:{signature}"))?,
                );
            }
        }

        for (_, v) in req.query.iter_mut() {
            *v = encode(v);
        }
        for q in extra_query {
            req.query_append(&q);
        }
        req.apply(parts)
    }
}

fn encode(v: &str) -> String {
    utf8_percent_encode(v, &AZURE_QUERY_ENCODE_SET).to_string()
}

fn sensitive(value: String) -> Result<HeaderValue> {
    let mut value = HeaderValue::try_from(value)?;
    value.set_sensitive(true);
    Ok(value)
}

/// SharedKey string to sign for the blob service.
///
/// ```text
/// VERB\n
/// <one line per standard header, Content-Length empty when 0>
/// CanonicalizedHeaders\n
/// CanonicalizedResource
/// ```
fn string_to_sign(req: &SigningRequest, account_name: &str) -> Result<String> {
    let mut s = String::with_capacity(256);
    writeln!(s, "{}", req.method)?;
    for name in &STANDARD_HEADERS {
        let value = req.header_str(name)?;
        if *name == header::CONTENT_LENGTH && value == "0" {
            s.push('\n');
        } else {
            writeln!(s, "{value}")?;
        }
    }

    for (k, v) in req.headers_with_prefix("x-ms-")? {
        writeln!(s, "{k}:{v}")?;
    }

    write!(s, "/{account_name}{}", req.path)?;
    for (k, values) in req.query_canonical() {
        write!(s, "\n{k}:{}", values.join(","))?;
    }

    debug!("storage string to sign: {s}");
    Ok(s)
}

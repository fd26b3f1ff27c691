use std::collections::BTreeMap;
use std::mem;
use std::time::Duration;

use http::header::HeaderName;
use http::request::Parts;
use http::uri::{Authority, PathAndQuery, Scheme};
use http::{HeaderMap, Method, Uri};

use crate::{Error, Result};

/// Request taken apart for signing.
///
/// [`SigningRequest::build`] moves the headers and the uri out of the request
/// parts, signers edit them in place and [`SigningRequest::apply`] puts them
/// back. Query values are kept decoded until `apply`.
#[derive(Debug)]
pub struct SigningRequest {
    /// HTTP method.
    pub method: Method,
    /// Scheme, `http` when the uri has none.
    pub scheme: Scheme,
    /// Host and port.
    pub authority: Authority,
    /// Path, still percent encoded.
    pub path: String,
    /// Query pairs in request order, values decoded.
    pub query: Vec<(String, String)>,
    /// Headers.
    pub headers: HeaderMap,
}

impl SigningRequest {
    /// Take `parts` apart. A uri without authority can't be signed.
    pub fn build(parts: &mut Parts) -> Result<Self> {
        let uri = mem::take(&mut parts.uri).into_parts();
        let authority = uri
            .authority
            .ok_or_else(|| Error::request_invalid("request without authority can't be signed"))?;
        let paq = uri
            .path_and_query
            .unwrap_or_else(|| PathAndQuery::from_static("/"));
        let query = match paq.query() {
            Some(q) => form_urlencoded::parse(q.as_bytes()).into_owned().collect(),
            None => Vec::new(),
        };

        Ok(SigningRequest {
            method: parts.method.clone(),
            scheme: uri.scheme.unwrap_or(Scheme::HTTP),
            authority,
            path: paq.path().to_string(),
            query,
            headers: mem::take(&mut parts.headers),
        })
    }

    /// Put the signed request back into `parts`.
    ///
    /// Pairs are joined with `&` as they are, so values must be encoded
    /// beforehand. A pair with an empty value is written as its key alone.
    pub fn apply(self, parts: &mut Parts) -> Result<()> {
        let mut paq = self.path;
        for (i, (k, v)) in self.query.iter().enumerate() {
            paq.push(if i == 0 { '?' } else { '&' });
            paq.push_str(k);
            if !v.is_empty() {
                paq.push('=');
                paq.push_str(v);
            }
        }

        let mut uri = mem::take(&mut parts.uri).into_parts();
        uri.scheme = Some(self.scheme);
        uri.authority = Some(self.authority);
        uri.path_and_query = Some(PathAndQuery::try_from(paq)?);

        parts.uri = Uri::from_parts(uri)?;
        parts.method = self.method;
        parts.headers = self.headers;
        Ok(())
    }

    /// Add a query pair.
    #[inline]
    pub fn query_push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.query.push((key.into(), value.into()));
    }

    /// Add an already encoded query string, a SAS token for example.
    #[inline]
    pub fn query_append(&mut self, query: &str) {
        self.query.push((query.to_string(), String::new()));
    }

    /// Query keys lowercased with their values sorted, keys in order.
    ///
    /// Repeated keys are merged into one entry.
    pub fn query_canonical(&self) -> BTreeMap<String, Vec<String>> {
        let mut merged: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (k, v) in &self.query {
            merged
                .entry(k.to_lowercase())
                .or_default()
                .push(v.clone());
        }
        for values in merged.values_mut() {
            values.sort();
        }
        merged
    }

    /// Value of header `key`, empty when absent.
    #[inline]
    pub fn header_str(&self, key: &HeaderName) -> Result<&str> {
        match self.headers.get(key) {
            Some(v) => Ok(v.to_str()?),
            None => Ok(""),
        }
    }

    /// Headers starting with `prefix` keyed by name, values trimmed.
    pub fn headers_with_prefix(&self, prefix: &str) -> Result<BTreeMap<String, String>> {
        self.headers
            .iter()
            .filter(|(k, _)| k.as_str().starts_with(prefix))
            .map(|(k, v)| Ok((k.as_str().to_string(), v.to_str()?.trim().to_string())))
            .collect()
    }
}

/// Where the signature goes.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum SigningMethod {
    /// `Authorization` header.
    Header,
    /// Query string, valid for the given duration.
    Query(Duration),
}

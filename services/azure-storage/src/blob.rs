use std::collections::HashMap;
use std::ops::RangeInclusive;

use azrest_core::{Context, Error, ProvideCredential, Result, Signer};
use bytes::Bytes;
use http::header::CONTENT_LENGTH;
use http::{HeaderMap, HeaderName, HeaderValue, Method, Request, Response, StatusCode};
use log::debug;
use percent_encoding::utf8_percent_encode;

use crate::constants::*;
use crate::error::parse_error;
use crate::model::{
    Blob, BlobEnumeration, BlobList, Container, ContainerAccess, ContainerEnumeration, CorsRule,
    ServiceProperties,
};
use crate::{Credential, RequestSigner};

/// Client of one blob service endpoint, such as `https://<account>.blob.core.windows.net`.
///
/// Every request is signed with the credential of its provider. Cloning is
/// cheap and clones share the cached credential.
#[derive(Clone, Debug)]
pub struct BlobClient {
    ctx: Context,
    endpoint: String,
    signer: Signer<Credential>,
}

/// Options of [`BlobClient::list_blobs`].
#[derive(Debug, Clone, Default)]
pub struct ListBlobsOptions {
    /// Only list blobs whose name starts with this prefix.
    pub prefix: Option<String>,
    /// Group names sharing a prefix up to this delimiter into `prefixes`.
    pub delimiter: Option<String>,
    /// Continue from the `next_marker` of a previous page.
    pub marker: Option<String>,
    /// Page size, the service caps it at 5000.
    pub max_results: Option<u32>,
}

impl BlobClient {
    /// Create a client for `endpoint` signing with credentials from `provider`.
    pub fn new(
        ctx: Context,
        endpoint: impl Into<String>,
        provider: impl ProvideCredential<Credential = Credential>,
    ) -> Self {
        let endpoint = endpoint.into().trim_end_matches('/').to_string();
        let signer = Signer::new(ctx.clone(), provider, RequestSigner::new());
        Self {
            ctx,
            endpoint,
            signer,
        }
    }

    /// Blob service endpoint without trailing slash.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Url of a blob, with the blob name escaped.
    pub fn blob_url(&self, container: &str, blob: &str) -> String {
        format!("{}{}", self.endpoint, encode_path(container, blob))
    }

    pub(crate) async fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        headers: HeaderMap,
        body: Bytes,
    ) -> Result<Response<Bytes>> {
        let mut url = format!("{}{path}", self.endpoint);
        if !query.is_empty() {
            let mut s = form_urlencoded::Serializer::new(String::new());
            s.extend_pairs(query);
            url.push('?');
            url.push_str(&s.finish());
        }

        let mut req = Request::builder()
            .method(method.clone())
            .uri(&url)
            .body(body)?;
        *req.headers_mut() = headers;
        if method == Method::PUT || method == Method::POST {
            let len = req.body().len();
            req.headers_mut().insert(CONTENT_LENGTH, HeaderValue::from(len));
        }

        let (mut parts, body) = req.into_parts();
        self.signer.sign(&mut parts, None).await?;
        let resp = self.ctx.http_send(Request::from_parts(parts, body)).await?;

        let status = resp.status();
        if !status.is_success() {
            debug!("{method} {url} responded {status}");
            return Err(parse_error(status, resp.body()));
        }
        Ok(resp)
    }

    /// Create a container.
    pub async fn create_container(&self, container: &str) -> Result<()> {
        validate_container_name(container)?;
        self.send(
            Method::PUT,
            &encode_path(container, ""),
            &[("restype", "container")],
            HeaderMap::new(),
            Bytes::new(),
        )
        .await?;
        Ok(())
    }

    /// Create a container unless it exists already.
    pub async fn ensure_container(&self, container: &str) -> Result<()> {
        match self.create_container(container).await {
            Err(err)
                if err.status() == Some(StatusCode::CONFLICT)
                    || err.code() == Some("ContainerAlreadyExists") =>
            {
                Ok(())
            }
            other => other,
        }
    }

    /// List every container of the account.
    pub async fn list_containers(&self) -> Result<Vec<Container>> {
        let mut containers = Vec::new();
        let mut marker = String::new();
        loop {
            let mut query = vec![("comp", "list"), ("maxresults", LIST_PAGE_SIZE)];
            if !marker.is_empty() {
                query.push(("marker", marker.as_str()));
            }
            let resp = self
                .send(Method::GET, "/", &query, HeaderMap::new(), Bytes::new())
                .await?;

            let page: ContainerEnumeration = from_xml(resp.body())?;
            containers.extend(page.containers.container);
            if page.next_marker.is_empty() {
                return Ok(containers);
            }
            marker = page.next_marker;
        }
    }

    /// Delete a container and every blob in it.
    pub async fn delete_container(&self, container: &str) -> Result<()> {
        self.send(
            Method::DELETE,
            &encode_path(container, ""),
            &[("restype", "container")],
            HeaderMap::new(),
            Bytes::new(),
        )
        .await?;
        Ok(())
    }

    /// Anonymous access level of `container`.
    pub async fn get_container_acl(&self, container: &str) -> Result<ContainerAccess> {
        let resp = self
            .send(
                Method::GET,
                &encode_path(container, ""),
                &[("restype", "container"), ("comp", "acl")],
                HeaderMap::new(),
                Bytes::new(),
            )
            .await?;
        let access = resp
            .headers()
            .get(X_MS_BLOB_PUBLIC_ACCESS)
            .and_then(|v| v.to_str().ok());
        Ok(ContainerAccess::from_header(access))
    }

    /// Set the anonymous access level of `container`.
    ///
    /// Stored access policies of the container are cleared.
    pub async fn set_container_acl(&self, container: &str, access: ContainerAccess) -> Result<()> {
        let mut headers = HeaderMap::new();
        if let Some(v) = access.header_value() {
            headers.insert(X_MS_BLOB_PUBLIC_ACCESS, HeaderValue::from_static(v));
        }
        self.send(
            Method::PUT,
            &encode_path(container, ""),
            &[("restype", "container"), ("comp", "acl")],
            headers,
            Bytes::from_static(EMPTY_SIGNED_IDENTIFIERS.as_bytes()),
        )
        .await?;
        Ok(())
    }

    /// List one page of blobs.
    pub async fn list_blobs(&self, container: &str, opts: &ListBlobsOptions) -> Result<BlobList> {
        let max_results = opts.max_results.map(|v| v.to_string());
        let mut query = vec![("restype", "container"), ("comp", "list")];
        for (k, v) in [
            ("prefix", opts.prefix.as_deref()),
            ("delimiter", opts.delimiter.as_deref()),
            ("marker", opts.marker.as_deref()),
            ("maxresults", max_results.as_deref()),
        ] {
            if let Some(v) = v.filter(|v| !v.is_empty()) {
                query.push((k, v));
            }
        }

        let resp = self
            .send(
                Method::GET,
                &encode_path(container, ""),
                &query,
                HeaderMap::new(),
                Bytes::new(),
            )
            .await?;
        Ok(from_xml::<BlobEnumeration>(resp.body())?.into())
    }

    /// List every blob under `prefix`, following markers.
    pub async fn list_all_blobs(&self, container: &str, prefix: &str) -> Result<Vec<Blob>> {
        let mut opts = ListBlobsOptions {
            prefix: Some(prefix.to_string()),
            ..Default::default()
        };
        let mut blobs = Vec::new();
        loop {
            let page = self.list_blobs(container, &opts).await?;
            blobs.extend(page.blobs);
            match page.next_marker {
                Some(marker) => opts.marker = Some(marker),
                None => return Ok(blobs),
            }
        }
    }

    /// Upload `data` as a block blob in a single request.
    pub async fn put_block_blob(
        &self,
        container: &str,
        blob: &str,
        data: Bytes,
        meta: &HashMap<String, String>,
    ) -> Result<()> {
        let mut headers = meta_headers(meta)?;
        headers.insert(X_MS_BLOB_TYPE, HeaderValue::from_static("BlockBlob"));
        self.send(
            Method::PUT,
            &encode_path(container, blob),
            &[],
            headers,
            data,
        )
        .await?;
        Ok(())
    }

    /// Download a blob, or the inclusive byte `range` of it.
    pub async fn get_blob(
        &self,
        container: &str,
        blob: &str,
        range: Option<RangeInclusive<u64>>,
    ) -> Result<Bytes> {
        let mut headers = HeaderMap::new();
        if let Some(range) = range {
            headers.insert(
                X_MS_RANGE,
                format!("bytes={}-{}", range.start(), range.end()).parse()?,
            );
        }
        let resp = self
            .send(
                Method::GET,
                &encode_path(container, blob),
                &[],
                headers,
                Bytes::new(),
            )
            .await?;
        Ok(resp.into_body())
    }

    /// Delete a blob with its snapshots.
    pub async fn delete_blob(&self, container: &str, blob: &str) -> Result<()> {
        let mut headers = HeaderMap::new();
        headers.insert(X_MS_DELETE_SNAPSHOTS, HeaderValue::from_static("include"));
        self.send(
            Method::DELETE,
            &encode_path(container, blob),
            &[],
            headers,
            Bytes::new(),
        )
        .await?;
        Ok(())
    }

    /// Server side copy of `source_url` into a blob.
    ///
    /// The copy may still be pending when this returns.
    pub async fn copy_blob(&self, container: &str, blob: &str, source_url: &str) -> Result<()> {
        let mut headers = HeaderMap::new();
        headers.insert(X_MS_COPY_SOURCE, source_url.parse()?);
        self.send(
            Method::PUT,
            &encode_path(container, blob),
            &[],
            headers,
            Bytes::new(),
        )
        .await?;
        Ok(())
    }

    /// CORS rules of the blob service.
    pub async fn get_cors(&self) -> Result<Vec<CorsRule>> {
        let resp = self
            .send(
                Method::GET,
                "/",
                &[("restype", "service"), ("comp", "properties")],
                HeaderMap::new(),
                Bytes::new(),
            )
            .await?;
        Ok(from_xml::<ServiceProperties>(resp.body())?.into_rules())
    }

    /// Replace the CORS rules of the blob service.
    pub async fn set_cors(&self, rules: &[CorsRule]) -> Result<()> {
        let body = to_xml(&ServiceProperties::from_rules(rules))?;
        self.send(
            Method::PUT,
            "/",
            &[("restype", "service"), ("comp", "properties")],
            HeaderMap::new(),
            body,
        )
        .await?;
        Ok(())
    }
}

/// `/<container>/<blob>` with the blob name escaped, `/<container>` without blob.
pub(crate) fn encode_path(container: &str, blob: &str) -> String {
    let mut path = format!(
        "/{}",
        utf8_percent_encode(container, &AZURE_QUERY_ENCODE_SET)
    );
    if !blob.is_empty() {
        path.push('/');
        path.extend(utf8_percent_encode(
            blob.trim_start_matches('/'),
            &AZURE_QUERY_ENCODE_SET,
        ));
    }
    path
}

pub(crate) fn from_xml<T: serde::de::DeserializeOwned>(body: &[u8]) -> Result<T> {
    let text = String::from_utf8_lossy(body);
    quick_xml::de::from_str(&text)
        .map_err(|e| Error::unexpected("failed to parse storage response").with_source(e))
}

pub(crate) fn to_xml<T: serde::Serialize>(value: &T) -> Result<Bytes> {
    let xml = quick_xml::se::to_string(value)
        .map_err(|e| Error::unexpected("failed to serialize storage request").with_source(e))?;
    Ok(Bytes::from(format!(
        r#"<?xml version="1.0" encoding="utf-8"?>{xml}"#
    )))
}

const EMPTY_SIGNED_IDENTIFIERS: &str =
    r#"<?xml version="1.0" encoding="utf-8"?><SignedIdentifiers></SignedIdentifiers>"#;

const BLOB_PROPERTY_HEADERS: [&str; 6] = [
    "cache-control",
    "content-type",
    "content-md5",
    "content-encoding",
    "content-language",
    "content-disposition",
];

/// Map blob metadata to request headers.
///
/// Standard properties go to `x-ms-blob-<name>`, anything else to
/// `x-ms-meta-<key>`. Empty values are skipped.
pub fn meta_headers(meta: &HashMap<String, String>) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    for (k, v) in meta {
        if v.is_empty() {
            continue;
        }
        let key = k.to_lowercase();
        let name = if BLOB_PROPERTY_HEADERS.contains(&key.as_str()) {
            format!("{X_MS_BLOB_PREFIX}{key}")
        } else {
            format!("{X_MS_META_PREFIX}{key}")
        };
        headers.insert(HeaderName::from_bytes(name.as_bytes())?, v.parse()?);
    }
    Ok(headers)
}

/// Check a container name: 3 to 63 lowercase letters, digits or single
/// hyphens, starting and ending with a letter or digit.
pub fn validate_container_name(name: &str) -> Result<()> {
    let valid = (3..=63).contains(&name.len())
        && name
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
        && !name.starts_with('-')
        && !name.ends_with('-')
        && !name.contains("--");
    if !valid {
        return Err(Error::invalid_argument(format!(
            "invalid container name {name:?}"
        )));
    }
    Ok(())
}

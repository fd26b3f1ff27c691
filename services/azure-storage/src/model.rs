//! XML documents of the blob service.

use serde::{Deserialize, Serialize};

/// A container of a storage account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Container {
    /// Container name.
    pub name: String,
    /// Container properties.
    pub properties: ContainerProperties,
}

/// Properties of a [`Container`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ContainerProperties {
    /// RFC 1123 time of the last change.
    #[serde(rename = "Last-Modified")]
    pub last_modified: String,
    /// Quoted etag.
    #[serde(rename = "Etag")]
    pub etag: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub(crate) struct ContainerEnumeration {
    pub containers: Containers,
    pub next_marker: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct Containers {
    #[serde(rename = "Container")]
    pub container: Vec<Container>,
}

/// A blob listed in a container.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Blob {
    /// Blob name within the container.
    pub name: String,
    /// Blob properties.
    pub properties: BlobProperties,
}

/// Properties of a [`Blob`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BlobProperties {
    #[serde(rename = "Last-Modified")]
    pub last_modified: String,
    #[serde(rename = "Etag")]
    pub etag: String,
    #[serde(rename = "Content-Length")]
    pub content_length: u64,
    #[serde(rename = "Content-Type")]
    pub content_type: String,
    #[serde(rename = "Content-MD5")]
    pub content_md5: String,
    /// `BlockBlob`, `PageBlob` or `AppendBlob`.
    #[serde(rename = "BlobType")]
    pub blob_type: String,
}

#[derive(Debug, Deserialize)]
struct BlobPrefix {
    #[serde(rename = "Name", default)]
    name: String,
}

/// Children of `<Blobs>`, in document order.
#[derive(Debug, Deserialize)]
enum BlobItem {
    Blob(Blob),
    BlobPrefix(BlobPrefix),
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Blobs {
    #[serde(rename = "$value")]
    items: Vec<BlobItem>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub(crate) struct BlobEnumeration {
    blobs: Blobs,
    next_marker: String,
}

/// One page of a blob listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlobList {
    /// Blobs of this page.
    pub blobs: Vec<Blob>,
    /// Virtual directories found with a delimiter.
    pub prefixes: Vec<String>,
    /// Marker of the next page, `None` on the last one.
    pub next_marker: Option<String>,
}

impl From<BlobEnumeration> for BlobList {
    fn from(value: BlobEnumeration) -> Self {
        let mut list = BlobList {
            next_marker: Some(value.next_marker).filter(|m| !m.is_empty()),
            ..Default::default()
        };
        for item in value.blobs.items {
            match item {
                BlobItem::Blob(b) => list.blobs.push(b),
                BlobItem::BlobPrefix(p) => list.prefixes.push(p.name),
            }
        }
        list
    }
}

/// A CORS rule of the blob service.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CorsRule {
    pub allowed_origins: Vec<String>,
    pub allowed_methods: Vec<String>,
    pub allowed_headers: Vec<String>,
    pub exposed_headers: Vec<String>,
    pub max_age_in_seconds: u32,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct XmlCorsRule {
    allowed_origins: String,
    allowed_methods: String,
    max_age_in_seconds: u32,
    exposed_headers: String,
    allowed_headers: String,
}

fn split_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}

impl From<XmlCorsRule> for CorsRule {
    fn from(v: XmlCorsRule) -> Self {
        CorsRule {
            allowed_origins: split_list(&v.allowed_origins),
            allowed_methods: split_list(&v.allowed_methods),
            allowed_headers: split_list(&v.allowed_headers),
            exposed_headers: split_list(&v.exposed_headers),
            max_age_in_seconds: v.max_age_in_seconds,
        }
    }
}

impl From<&CorsRule> for XmlCorsRule {
    fn from(v: &CorsRule) -> Self {
        XmlCorsRule {
            allowed_origins: v.allowed_origins.join(","),
            allowed_methods: v.allowed_methods.join(","),
            max_age_in_seconds: v.max_age_in_seconds,
            exposed_headers: v.exposed_headers.join(","),
            allowed_headers: v.allowed_headers.join(","),
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct Cors {
    #[serde(rename = "CorsRule")]
    rules: Vec<XmlCorsRule>,
}

/// `StorageServiceProperties` restricted to CORS, other settings are kept by the service.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename = "StorageServiceProperties", default)]
pub(crate) struct ServiceProperties {
    #[serde(rename = "Cors")]
    cors: Cors,
}

impl ServiceProperties {
    pub(crate) fn from_rules(rules: &[CorsRule]) -> Self {
        ServiceProperties {
            cors: Cors {
                rules: rules.iter().map(XmlCorsRule::from).collect(),
            },
        }
    }

    pub(crate) fn into_rules(self) -> Vec<CorsRule> {
        self.cors.rules.into_iter().map(CorsRule::from).collect()
    }
}

/// Anonymous access level of a container.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ContainerAccess {
    /// Every request must be authorized.
    #[default]
    Private,
    /// Blobs can be read anonymously, the container can not be listed.
    Blob,
    /// Blobs and the container listing can be read anonymously.
    Container,
}

impl ContainerAccess {
    /// Parse the `x-ms-blob-public-access` header, absent means private.
    pub(crate) fn from_header(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("container") => ContainerAccess::Container,
            Some(v) if v.eq_ignore_ascii_case("blob") => ContainerAccess::Blob,
            _ => ContainerAccess::Private,
        }
    }

    /// Value of `x-ms-blob-public-access`, private containers omit the header.
    pub(crate) fn header_value(self) -> Option<&'static str> {
        match self {
            ContainerAccess::Private => None,
            ContainerAccess::Blob => Some("blob"),
            ContainerAccess::Container => Some("container"),
        }
    }
}

/// Block list committed to finish a multipart upload.
#[derive(Debug, Serialize)]
#[serde(rename = "BlockList")]
pub(crate) struct BlockList<'a> {
    #[serde(rename = "Latest")]
    pub latest: &'a [String],
}

/// `<Error>` body returned by the storage service.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub(crate) struct StorageError {
    pub code: String,
    pub message: String,
}

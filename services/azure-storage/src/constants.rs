use percent_encoding::{AsciiSet, NON_ALPHANUMERIC};

// Headers used in azure storage.
pub const X_MS_DATE: &str = "x-ms-date";
pub const X_MS_VERSION: &str = "x-ms-version";
pub const X_MS_BLOB_TYPE: &str = "x-ms-blob-type";
pub const X_MS_BLOB_CONTENT_LENGTH: &str = "x-ms-blob-content-length";
pub const X_MS_BLOB_SEQUENCE_NUMBER: &str = "x-ms-blob-sequence-number";
pub const X_MS_PAGE_WRITE: &str = "x-ms-page-write";
pub const X_MS_RANGE: &str = "x-ms-range";
pub const X_MS_LEASE_ACTION: &str = "x-ms-lease-action";
pub const X_MS_LEASE_DURATION: &str = "x-ms-lease-duration";
pub const X_MS_LEASE_ID: &str = "x-ms-lease-id";
pub const X_MS_COPY_SOURCE: &str = "x-ms-copy-source";
pub const X_MS_SOURCE_RANGE: &str = "x-ms-source-range";
pub const X_MS_DELETE_SNAPSHOTS: &str = "x-ms-delete-snapshots";
pub const X_MS_BLOB_PUBLIC_ACCESS: &str = "x-ms-blob-public-access";
pub const X_MS_META_PREFIX: &str = "x-ms-meta-";
pub const X_MS_BLOB_PREFIX: &str = "x-ms-blob-";

/// Storage service version sent unless the request carries one.
pub const AZURE_VERSION: &str = "2019-12-12";

// Env values used by the storage credential providers.
pub const AZURE_STORAGE_ACCOUNT_NAME: &str = "AZURE_STORAGE_ACCOUNT_NAME";
pub const AZURE_STORAGE_ACCOUNT_KEY: &str = "AZURE_STORAGE_ACCOUNT_KEY";
pub const AZURE_STORAGE_SAS_TOKEN: &str = "AZURE_STORAGE_SAS_TOKEN";
pub const AZURE_STORAGE_BEARER_TOKEN: &str = "AZURE_STORAGE_BEARER_TOKEN";

/// Page blobs are written in pages of this many bytes.
pub const PAGE_SIZE: u64 = 512;
/// Size of the ranges a VHD upload is split into.
pub const PAGE_CHUNK_SIZE: u64 = 4 * 1024 * 1024;
pub const DEFAULT_UPLOAD_WORKERS: usize = 3;

pub const MAX_PART_SIZE: u64 = 100 * 1024 * 1024;
pub const MAX_PART_COUNT: usize = 50000;

/// Containers listed per page.
pub const LIST_PAGE_SIZE: &str = "5000";

/// Characters escaped in blob paths and query values.
pub static AZURE_QUERY_ENCODE_SET: AsciiSet = NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'/')
    .remove(b'~');

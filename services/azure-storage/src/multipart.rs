use std::collections::HashMap;

use azrest_core::hash::base64_url_encode;
use azrest_core::{Error, Result};
use bytes::Bytes;
use http::{HeaderMap, HeaderValue, Method};
use log::debug;

use crate::blob::{encode_path, meta_headers, to_xml};
use crate::constants::*;
use crate::model::BlockList;
use crate::BlobClient;

/// Split `<container>/<blob>` into its parts.
pub fn split_key(key: &str) -> Result<(&str, &str)> {
    match key.trim_start_matches('/').split_once('/') {
        Some((container, blob)) if !container.is_empty() && !blob.is_empty() => {
            Ok((container, blob))
        }
        _ => Err(Error::invalid_argument(format!(
            "key {key:?} must look like <container>/<blob>"
        ))),
    }
}

/// Block id of the part at `index`: URL safe base64 of the decimal index.
pub fn block_id(index: usize) -> String {
    base64_url_encode(index.to_string().as_bytes())
}

fn check_index(index: usize) -> Result<()> {
    if index >= MAX_PART_COUNT {
        return Err(Error::invalid_argument(format!(
            "part index {index} exceeds the limit of {MAX_PART_COUNT} parts"
        )));
    }
    Ok(())
}

fn check_size(size: u64) -> Result<()> {
    if size > MAX_PART_SIZE {
        return Err(Error::invalid_argument(format!(
            "part of {size} bytes exceeds the limit of {MAX_PART_SIZE} bytes"
        )));
    }
    Ok(())
}

fn lease_headers(action: &'static str, upload_id: &str) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(X_MS_LEASE_ACTION, HeaderValue::from_static(action));
    headers.insert(X_MS_LEASE_ID, upload_id.parse()?);
    Ok(headers)
}

/// Block blob uploads split into parts.
///
/// The destination blob is created empty and locked with an infinite lease,
/// the lease id serves as upload id for all later calls.
impl BlobClient {
    /// Start a multipart upload of `key`, returning the upload id.
    pub async fn new_multipart_upload(
        &self,
        key: &str,
        meta: &HashMap<String, String>,
    ) -> Result<String> {
        let (container, blob) = split_key(key)?;
        let path = encode_path(container, blob);

        let mut headers = meta_headers(meta)?;
        headers.insert(X_MS_BLOB_TYPE, HeaderValue::from_static("BlockBlob"));
        self.send(Method::PUT, &path, &[], headers, Bytes::new())
            .await?;

        let mut headers = HeaderMap::new();
        headers.insert(X_MS_LEASE_ACTION, HeaderValue::from_static("acquire"));
        headers.insert(X_MS_LEASE_DURATION, HeaderValue::from_static("-1"));
        let resp = self
            .send(Method::PUT, &path, &[("comp", "lease")], headers, Bytes::new())
            .await?;

        let lease_id = resp
            .headers()
            .get(X_MS_LEASE_ID)
            .map(|v| v.to_str())
            .transpose()?
            .filter(|v| !v.is_empty())
            .ok_or_else(|| Error::unexpected(format!("no lease id returned for {key}")))?;
        debug!("multipart upload of {key} started with lease {lease_id}");
        Ok(lease_id.to_string())
    }

    /// Upload part `index` and return its block id.
    pub async fn upload_part(
        &self,
        key: &str,
        upload_id: &str,
        index: usize,
        data: Bytes,
    ) -> Result<String> {
        let (container, blob) = split_key(key)?;
        check_index(index)?;
        check_size(data.len() as u64)?;

        let id = block_id(index);
        let mut headers = HeaderMap::new();
        headers.insert(X_MS_LEASE_ID, upload_id.parse()?);
        self.send(
            Method::PUT,
            &encode_path(container, blob),
            &[("comp", "block"), ("blockid", &id)],
            headers,
            data,
        )
        .await?;
        Ok(id)
    }

    /// Fill part `index` with `length` bytes of `src_url` starting at `offset`.
    ///
    /// The bytes are copied by the service, nothing is uploaded.
    pub async fn copy_part(
        &self,
        key: &str,
        upload_id: &str,
        index: usize,
        src_url: &str,
        offset: u64,
        length: u64,
    ) -> Result<String> {
        let (container, blob) = split_key(key)?;
        check_index(index)?;
        check_size(length)?;
        if length == 0 {
            return Err(Error::invalid_argument("copied part must not be empty"));
        }

        let id = block_id(index);
        let mut headers = HeaderMap::new();
        headers.insert(X_MS_COPY_SOURCE, src_url.parse()?);
        headers.insert(X_MS_LEASE_ID, upload_id.parse()?);
        headers.insert(
            X_MS_SOURCE_RANGE,
            format!("bytes={offset}-{}", offset + length - 1).parse()?,
        );
        self.send(
            Method::PUT,
            &encode_path(container, blob),
            &[("comp", "block"), ("blockid", &id)],
            headers,
            Bytes::new(),
        )
        .await?;
        Ok(id)
    }

    /// Commit `block_ids` in the given order and release the lease.
    pub async fn complete_multipart_upload(
        &self,
        key: &str,
        upload_id: &str,
        block_ids: &[String],
    ) -> Result<()> {
        let (container, blob) = split_key(key)?;
        if block_ids.len() > MAX_PART_COUNT {
            return Err(Error::invalid_argument(format!(
                "{} parts exceed the limit of {MAX_PART_COUNT} parts",
                block_ids.len()
            )));
        }
        let path = encode_path(container, blob);

        let body = to_xml(&BlockList { latest: block_ids })?;
        let mut headers = HeaderMap::new();
        headers.insert(X_MS_LEASE_ID, upload_id.parse()?);
        self.send(Method::PUT, &path, &[("comp", "blocklist")], headers, body)
            .await?;

        self.send(
            Method::PUT,
            &path,
            &[("comp", "lease")],
            lease_headers("release", upload_id)?,
            Bytes::new(),
        )
        .await?;
        Ok(())
    }

    /// Release the lease and delete the blob with its snapshots.
    pub async fn abort_multipart_upload(&self, key: &str, upload_id: &str) -> Result<()> {
        let (container, blob) = split_key(key)?;
        let path = encode_path(container, blob);

        self.send(
            Method::PUT,
            &path,
            &[("comp", "lease")],
            lease_headers("release", upload_id)?,
            Bytes::new(),
        )
        .await?;
        self.delete_blob(container, blob).await
    }
}

//! Read and write tags through the `Microsoft.Resources/tags/default` extension resource.

use std::collections::HashMap;

use azrest_core::{Error, Result};
use http::{HeaderMap, Method};
use serde_json::{json, Value};

use crate::constants::{API_VERSION, RESERVED_TAG_PREFIXES, TAGS_API_VERSION};
use crate::{AzureClient, Query};

fn tags_path(id: &str) -> String {
    format!(
        "/{}/providers/Microsoft.Resources/tags/default",
        id.trim_matches('/')
    )
}

fn tags_query() -> Query {
    Query::from([(API_VERSION, TAGS_API_VERSION)])
}

fn check_reserved(tags: &HashMap<String, String>) -> Result<()> {
    for key in tags.keys() {
        let lower = key.to_ascii_lowercase();
        if RESERVED_TAG_PREFIXES.iter().any(|p| lower.starts_with(p)) {
            return Err(Error::not_supported(format!(
                "tag key {key} uses a prefix reserved by azure"
            )));
        }
    }
    Ok(())
}

fn parse_tags(value: &Value) -> HashMap<String, String> {
    value
        .pointer("/properties/tags")
        .and_then(Value::as_object)
        .map(|m| {
            m.iter()
                .map(|(k, v)| {
                    let v = v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string());
                    (k.clone(), v)
                })
                .collect()
        })
        .unwrap_or_default()
}

impl AzureClient {
    /// Tags of the resource `id`, empty if it has none.
    pub async fn get_tags(&self, id: &str) -> Result<HashMap<String, String>> {
        Ok(self.get_tags_with_etag(id).await?.0)
    }

    /// Tags of the resource `id` together with the etag to guard a later write.
    pub async fn get_tags_with_etag(
        &self,
        id: &str,
    ) -> Result<(HashMap<String, String>, Option<String>)> {
        let value = self
            .json(Method::GET, &tags_path(id), None, tags_query())
            .await?;
        let etag = value
            .get("etag")
            .and_then(Value::as_str)
            .filter(|v| !v.is_empty())
            .map(str::to_string);
        Ok((parse_tags(&value), etag))
    }

    /// Write tags of the resource `id`.
    ///
    /// With `replace` the resource ends up with exactly `tags`, otherwise `tags`
    /// are merged over the current ones. An empty result deletes all tags.
    pub async fn set_tags(
        &self,
        id: &str,
        tags: &HashMap<String, String>,
        replace: bool,
    ) -> Result<()> {
        check_reserved(tags)?;

        let target = if replace {
            tags.clone()
        } else {
            let mut current = self.get_tags(id).await?;
            current.extend(tags.iter().map(|(k, v)| (k.clone(), v.clone())));
            current
        };
        self.write_tags(id, &target, HeaderMap::new()).await
    }

    /// Replace tags of the resource `id` unless they changed since `etag` was read.
    pub async fn set_tags_if_match(
        &self,
        id: &str,
        tags: &HashMap<String, String>,
        etag: &str,
    ) -> Result<()> {
        check_reserved(tags)?;
        self.write_tags(id, tags, AzureClient::if_match(etag)?).await
    }

    async fn write_tags(
        &self,
        id: &str,
        tags: &HashMap<String, String>,
        headers: HeaderMap,
    ) -> Result<()> {
        let path = tags_path(id);
        if tags.is_empty() {
            self.json_with_headers(Method::DELETE, &path, None, tags_query(), headers)
                .await?;
            return Ok(());
        }

        let body = json!({
            "operation": "replace",
            "properties": { "tags": tags },
        });
        self.json_with_headers(Method::PATCH, &path, Some(&body), tags_query(), headers)
            .await?;
        Ok(())
    }
}

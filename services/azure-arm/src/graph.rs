//! Microsoft Graph and the legacy AAD Graph.

use azrest_core::{Error, Result};
use http::{HeaderMap, Method};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::client::decode_json;
use crate::constants::{AAD_GRAPH_API_VERSION, API_VERSION, MICROSOFT_GRAPH_VERSION};
use crate::{AzureClient, Query};

impl AzureClient {
    fn graph_url(&self, resource: &str, query: &Query) -> String {
        let mut url = format!(
            "{}/{MICROSOFT_GRAPH_VERSION}/{}",
            self.endpoints().microsoft_graph.trim_end_matches('/'),
            resource.trim_start_matches('/')
        );
        if !query.is_empty() {
            url.push('?');
            url.push_str(&query.to_string());
        }
        url
    }

    async fn graph_send(&self, method: Method, url: &str, body: Option<&Value>) -> Result<Value> {
        let audience = self.endpoints().microsoft_graph.clone();
        let resp = self
            .send(method, url, &audience, body, HeaderMap::new())
            .await?;
        decode_json(resp.body())
    }

    /// Send a request to `<graph>/v1.0/<resource>`.
    pub async fn graph_json(
        &self,
        method: Method,
        resource: &str,
        body: Option<&Value>,
        query: Query,
    ) -> Result<Value> {
        let url = self.graph_url(resource, &query);
        self.graph_send(method, &url, body).await
    }

    /// GET a Graph object.
    pub async fn graph_get<T: DeserializeOwned>(&self, resource: &str, query: Query) -> Result<T> {
        let value = self.graph_json(Method::GET, resource, None, query).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// List a Graph collection following every `@odata.nextLink`.
    pub async fn graph_list<T: DeserializeOwned>(
        &self,
        resource: &str,
        query: Query,
    ) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut url = self.graph_url(resource, &query);
        loop {
            let mut page = self.graph_send(Method::GET, &url, None).await?;
            if let Some(Value::Array(values)) = page.get_mut("value").map(Value::take) {
                for v in values {
                    items.push(serde_json::from_value(v)?);
                }
            }
            match page.get("@odata.nextLink").and_then(Value::as_str) {
                Some(next) if !next.is_empty() && next != url => url = next.to_string(),
                _ => break,
            }
        }
        Ok(items)
    }

    /// POST a new Graph object.
    pub async fn graph_create(&self, resource: &str, body: &Value) -> Result<Value> {
        self.graph_json(Method::POST, resource, Some(body), Query::new())
            .await
    }

    /// PATCH a Graph object.
    pub async fn graph_patch(&self, resource: &str, body: &Value) -> Result<()> {
        self.graph_json(Method::PATCH, resource, Some(body), Query::new())
            .await?;
        Ok(())
    }

    /// DELETE a Graph object.
    pub async fn graph_delete(&self, resource: &str) -> Result<()> {
        self.graph_json(Method::DELETE, resource, None, Query::new())
            .await?;
        Ok(())
    }

    /// Send a request to the legacy AAD Graph: `<graph>/<tenant>/<resource>?api-version=1.6`.
    pub async fn aad_graph_json(
        &self,
        method: Method,
        resource: &str,
        body: Option<&Value>,
        mut query: Query,
    ) -> Result<Value> {
        let tenant = self
            .config()
            .tenant_id
            .clone()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::config_invalid("tenant_id is required for aad graph"))?;
        if !query.contains(API_VERSION) {
            query.set(API_VERSION, AAD_GRAPH_API_VERSION);
        }

        let audience = self.endpoints().graph.clone();
        let url = format!(
            "{}/{tenant}/{}?{query}",
            audience.trim_end_matches('/'),
            resource.trim_start_matches('/')
        );
        let resp = self
            .send(method, &url, &audience, body, HeaderMap::new())
            .await?;
        decode_json(resp.body())
    }
}

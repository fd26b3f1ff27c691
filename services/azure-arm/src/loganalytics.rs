use azrest_core::{Error, Result};
use http::{HeaderMap, Method};
use serde_json::{json, Value};

use crate::client::decode_json;
use crate::constants::{API_VERSION, LOG_ANALYTICS_API_VERSION};
use crate::AzureClient;

impl AzureClient {
    /// Run a KQL `query` against a Log Analytics workspace.
    ///
    /// `timespan` is an ISO 8601 duration or interval such as `PT1H`.
    pub async fn log_analytics_query(
        &self,
        workspace_id: &str,
        query: &str,
        timespan: Option<&str>,
    ) -> Result<Value> {
        let Some(endpoint) = self.endpoints().log_analytics.clone() else {
            return Err(Error::not_supported(format!(
                "log analytics is not available in {}",
                self.config().environment
            )));
        };

        let url = format!(
            "{}/v1/workspaces/{workspace_id}/query?{API_VERSION}={LOG_ANALYTICS_API_VERSION}",
            endpoint.trim_end_matches('/')
        );
        let mut body = json!({ "query": query });
        if let Some(timespan) = timespan {
            body["timespan"] = json!(timespan);
        }

        let resp = self
            .send(Method::POST, &url, &endpoint, Some(&body), HeaderMap::new())
            .await?;
        decode_json(resp.body())
    }
}

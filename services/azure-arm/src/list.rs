//! Walk paginated ARM listings.

use azrest_core::{Error, Result};
use http::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::constants::SKIP_TOKEN_KEYS;
use crate::{AzureClient, Query};

/// Resource listed per resource group taken from the `resourceGroups` query.
const FRONT_DOOR_POLICIES: &str = "Microsoft.Network/frontdoorWebApplicationFirewallPolicies";

/// Pick the continuation token of `next_link` that differs from `previous`.
fn next_skip_token(next_link: &str, previous: Option<&str>) -> Option<(&'static str, String)> {
    let (_, query) = next_link.split_once('?')?;
    let query = Query::parse(query);
    SKIP_TOKEN_KEYS.iter().find_map(|key| {
        query
            .get(key)
            .filter(|token| !token.is_empty() && Some(*token) != previous)
            .map(|token| (*key, token.to_string()))
    })
}

fn page_items(page: Value) -> Vec<Value> {
    let items = match page {
        Value::Object(mut m) => match m.remove("value") {
            Some(v) => v,
            None => Value::Object(m),
        },
        other => other,
    };
    match items {
        Value::Array(a) => a,
        Value::Null => Vec::new(),
        other => vec![other],
    }
}

/// Keep items whose `location` equals `region`, case and surrounding spaces ignored.
pub fn filter_by_location(items: Vec<Value>, region: &str) -> Vec<Value> {
    let region = region.trim();
    items
        .into_iter()
        .filter(|item| {
            item.get("location")
                .and_then(Value::as_str)
                .is_some_and(|l| l.trim().eq_ignore_ascii_case(region))
        })
        .collect()
}

/// Return the only item, `NotFound` on none and `Duplicate` on more.
pub fn one_of<T>(items: Vec<T>, what: &str) -> Result<T> {
    let mut items = items.into_iter();
    match (items.next(), items.next()) {
        (None, _) => Err(Error::not_found(format!("{what} not found"))),
        (Some(item), None) => Ok(item),
        (Some(_), Some(_)) => Err(Error::duplicate(format!("more than one {what} found"))),
    }
}

impl AzureClient {
    /// List `resource` following every `nextLink`.
    pub async fn list_all(&self, resource: &str, mut query: Query) -> Result<Vec<Value>> {
        let path = if resource.eq_ignore_ascii_case(FRONT_DOOR_POLICIES) {
            let resource_group = query.remove("resourceGroups").ok_or_else(|| {
                Error::invalid_argument(format!("listing {resource} requires resourceGroups"))
            })?;
            let sub = self.subscription_id().await?;
            format!("subscriptions/{sub}/resourceGroups/{resource_group}/providers/{resource}")
        } else {
            resource.to_string()
        };

        let mut items = Vec::new();
        let mut previous: Option<String> = None;
        loop {
            let page = self
                .json(Method::GET, &path, None, query.clone())
                .await?;
            let next_link = page
                .get("nextLink")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            items.extend(page_items(page));

            let Some((key, token)) = next_skip_token(&next_link, previous.as_deref()) else {
                break;
            };
            for k in SKIP_TOKEN_KEYS {
                query.remove(k);
            }
            query.set(key, token.clone());
            previous = Some(token);
        }
        Ok(items)
    }

    /// List `resource` and deserialize every item.
    pub async fn list<T: DeserializeOwned>(&self, resource: &str, query: Query) -> Result<Vec<T>> {
        self.list_all(resource, query)
            .await?
            .into_iter()
            .map(|v| Ok(serde_json::from_value(v)?))
            .collect()
    }

    /// List `resource` keeping items in `region` only.
    pub async fn list_in_location<T: DeserializeOwned>(
        &self,
        resource: &str,
        region: &str,
        query: Query,
    ) -> Result<Vec<T>> {
        filter_by_location(self.list_all(resource, query).await?, region)
            .into_iter()
            .map(|v| Ok(serde_json::from_value(v)?))
            .collect()
    }
}

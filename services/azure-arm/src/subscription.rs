use azrest_core::{Error, Result};
use serde::{Deserialize, Serialize};

use crate::client::BoxFuture;
use crate::{AzureClient, Query};

/// An Azure subscription visible to the service principal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Subscription {
    /// `/subscriptions/<subscription_id>`.
    pub id: String,
    /// Subscription id.
    pub subscription_id: String,
    /// Display name.
    pub display_name: String,
    /// `Enabled`, `Disabled`, `Warned`, `PastDue` or `Deleted`.
    pub state: String,
    /// Tenant owning the subscription.
    pub tenant_id: String,
}

/// A resource group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceGroup {
    /// Resource id.
    pub id: String,
    /// Name.
    pub name: String,
    /// Region.
    pub location: String,
}

impl AzureClient {
    /// List subscriptions, cached after the first call.
    pub async fn list_subscriptions(&self) -> Result<Vec<Subscription>> {
        let mut cache = self.subscription_cache().lock().await;
        if let Some(subs) = cache.as_ref() {
            return Ok(subs.clone());
        }

        let subs = self.fetch_subscriptions().await?;
        *cache = Some(subs.clone());
        Ok(subs)
    }

    /// Boxed listing of `subscriptions`, the engine resolves the subscription through it.
    fn fetch_subscriptions(&self) -> BoxFuture<'_, Result<Vec<Subscription>>> {
        Box::pin(self.list("subscriptions", Query::new()))
    }

    /// The subscription in use.
    ///
    /// Defaults to the first enabled subscription when none is configured.
    pub async fn subscription_id(&self) -> Result<String> {
        if let Some(id) = self.selected_subscription()? {
            return Ok(id);
        }

        let subs = self.list_subscriptions().await?;
        let id = subs
            .into_iter()
            .find(|s| s.state == "Enabled")
            .map(|s| s.subscription_id)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| Error::no_subscription("no enabled subscription available"))?;
        self.select_subscription(Some(id.clone()))?;
        Ok(id)
    }

    /// Switch to another subscription.
    pub fn set_subscription(&self, subscription_id: impl Into<String>) -> Result<()> {
        let id = subscription_id.into();
        if id.is_empty() {
            return Err(Error::invalid_argument("empty subscription id"));
        }
        self.select_subscription(Some(id))
    }

    /// List resource groups of the subscription in use.
    pub async fn list_resource_groups(&self) -> Result<Vec<ResourceGroup>> {
        self.list("resourcegroups", Query::new()).await
    }
}

//! Register resource providers on demand.

use azrest_core::{Error, Result};
use http::{HeaderMap, Method};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::client::BoxFuture;
use crate::constants::REGISTRABLE_NAMESPACES;
use crate::{AzureClient, Query};

/// A resource provider and its registration state within a subscription.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProviderService {
    /// Resource id of the provider.
    pub id: String,
    /// Namespace such as `Microsoft.Network`.
    pub namespace: String,
    /// `Registered`, `Registering`, `NotRegistered` or `Unregistering`.
    pub registration_state: String,
}

/// Namespace to register for a request on `path`.
pub(crate) fn namespace_of(path: &str) -> Option<&'static str> {
    let lower = path.to_ascii_lowercase();
    REGISTRABLE_NAMESPACES
        .iter()
        .find(|ns| lower.contains(&ns.to_ascii_lowercase()))
        .copied()
}

impl AzureClient {
    /// List resource providers of the current subscription.
    pub async fn list_services(&self) -> Result<Vec<ProviderService>> {
        self.list("providers", Query::new()).await
    }

    /// Register `namespace` and wait until Azure reports it as `Registered`.
    pub async fn register_service(&self, namespace: &str) -> Result<()> {
        let sub = self.subscription_id().await?;
        log::info!("registering {namespace} for subscription {sub}");
        self.request(
            Method::POST,
            &format!("subscriptions/{sub}/providers/{namespace}/register"),
            None,
            Query::new(),
            HeaderMap::new(),
            false,
        )
        .await
        .map_err(|e| e.with_context(format!("register {namespace}")))?;

        let interval = self.config().register_poll_interval;
        let deadline = Instant::now() + self.config().register_timeout;
        loop {
            let state = self
                .list_services()
                .await?
                .into_iter()
                .find(|s| s.namespace.eq_ignore_ascii_case(namespace))
                .map(|s| s.registration_state)
                .unwrap_or_default();
            if state == "Registered" {
                return Ok(());
            }
            log::debug!("service {namespace} registration state: {state}");

            if Instant::now() + interval > deadline {
                return Err(Error::timeout(format!(
                    "service {namespace} not registered within {:?}",
                    self.config().register_timeout
                )));
            }
            tokio::time::sleep(interval).await;
        }
    }

    /// Boxed [`AzureClient::register_service`], called from within the request engine.
    pub(crate) fn register_service_boxed<'a>(&'a self, namespace: &'a str) -> BoxFuture<'a, Result<()>> {
        Box::pin(self.register_service(namespace))
    }
}

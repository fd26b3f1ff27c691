use std::sync::Arc;

use azrest_azure_arm::{AzureClient, Query};
use azrest_core::{Error, Result};
use log::debug;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::OnceCell;

use crate::{AccountKeyCredentialProvider, BlobClient, ContainerAccess, VhdUpload};

/// A storage account reached through Azure Resource Manager.
///
/// The shared key is fetched on first use with `listKeys` and cached in the
/// handle, clones share the cache.
#[derive(Clone, Debug)]
pub struct StorageAccount {
    client: AzureClient,
    id: String,
    name: String,
    location: String,
    blob_endpoint: String,
    key: Arc<OnceCell<String>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AccountResource {
    id: String,
    name: String,
    location: String,
    properties: AccountProperties,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct AccountProperties {
    primary_endpoints: PrimaryEndpoints,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PrimaryEndpoints {
    blob: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct AccountKeys {
    keys: Vec<AccountKey>,
    primary_key: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct AccountKey {
    key_name: String,
    value: String,
    permissions: String,
}

impl AccountKeys {
    fn into_key(self) -> Option<String> {
        self.keys
            .into_iter()
            .find(|k| k.permissions.eq_ignore_ascii_case("full") && !k.value.is_empty())
            .map(|k| {
                debug!("using storage key {}", k.key_name);
                k.value
            })
            .or_else(|| Some(self.primary_key).filter(|k| !k.is_empty()))
    }
}

/// Check a storage account name: 3 to 24 lowercase letters or digits.
pub fn validate_account_name(name: &str) -> Result<()> {
    let valid = (3..=24).contains(&name.len())
        && name
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit());
    if !valid {
        return Err(Error::invalid_argument(format!(
            "invalid storage account name {name:?}"
        )));
    }
    Ok(())
}

impl StorageAccount {
    /// Handle of the account `name` with resource id `id`.
    pub fn new(
        client: AzureClient,
        id: impl Into<String>,
        name: impl Into<String>,
        location: impl Into<String>,
    ) -> Result<Self> {
        let name = name.into();
        validate_account_name(&name)?;
        let blob_endpoint = client.endpoints().blob_endpoint(&name);
        Ok(Self {
            client,
            id: id.into(),
            name,
            location: location.into(),
            blob_endpoint,
            key: Arc::new(OnceCell::new()),
        })
    }

    /// Handle built from an ARM `Microsoft.Storage/storageAccounts` resource.
    pub fn from_resource(client: AzureClient, resource: &Value) -> Result<Self> {
        let res: AccountResource = serde_json::from_value(resource.clone())?;
        let endpoint = res.properties.primary_endpoints.blob;
        let account = Self::new(client, res.id, res.name, res.location)?;
        if endpoint.is_empty() {
            Ok(account)
        } else {
            Ok(account.with_blob_endpoint(endpoint))
        }
    }

    /// Storage accounts of the subscription in use.
    pub async fn list(client: &AzureClient) -> Result<Vec<Self>> {
        client
            .list_all("Microsoft.Storage/storageAccounts", Query::new())
            .await?
            .iter()
            .map(|v| Self::from_resource(client.clone(), v))
            .collect()
    }

    /// Override the blob service endpoint.
    pub fn with_blob_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.blob_endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    /// ARM resource id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Account name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Region of the account.
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Blob service endpoint without trailing slash.
    pub fn blob_endpoint(&self) -> &str {
        &self.blob_endpoint
    }

    pub(crate) fn client(&self) -> &AzureClient {
        &self.client
    }

    /// Shared key of the account.
    pub async fn key(&self) -> Result<String> {
        let key = self
            .key
            .get_or_try_init(|| async {
                let path = format!("{}/listKeys", self.id.trim_end_matches('/'));
                let keys: AccountKeys = serde_json::from_value(self.client.post(&path, None).await?)?;
                keys.into_key().ok_or_else(|| {
                    Error::not_found(format!("storage account {} has no key", self.name))
                })
            })
            .await?;
        Ok(key.clone())
    }

    /// Blob client signing with the shared key of this account.
    pub fn blob_client(&self) -> BlobClient {
        BlobClient::new(
            self.client.context().clone(),
            self.blob_endpoint.clone(),
            AccountKeyCredentialProvider::new(self.clone()),
        )
    }

    /// Access level shared by every container.
    ///
    /// Private when the account has no container or the containers disagree.
    pub async fn get_acl(&self) -> Result<ContainerAccess> {
        let blobs = self.blob_client();
        let mut common = None;
        for container in blobs.list_containers().await? {
            let access = blobs.get_container_acl(&container.name).await?;
            match common {
                None => common = Some(access),
                Some(c) if c != access => return Ok(ContainerAccess::Private),
                Some(_) => {}
            }
        }
        Ok(common.unwrap_or_default())
    }

    /// Set the access level of every container.
    pub async fn set_acl(&self, access: ContainerAccess) -> Result<()> {
        let blobs = self.blob_client();
        for container in blobs.list_containers().await? {
            blobs
                .set_container_acl(&container.name, access)
                .await
                .map_err(|e| e.with_context(format!("set acl of container {}", container.name)))?;
        }
        Ok(())
    }

    /// Upload a VHD into `container`, creating the container when missing.
    pub async fn upload_vhd(&self, container: &str, upload: &VhdUpload) -> Result<String> {
        let blobs = self.blob_client();
        blobs.ensure_container(container).await?;
        blobs.upload_page_blob(container, upload).await
    }
}

use async_trait::async_trait;
use azrest_core::{Context, ProvideCredential, Result};

use crate::credential::Credential;
use crate::StorageAccount;

/// Provide the shared key of a storage account fetched from Azure Resource Manager.
#[derive(Clone, Debug)]
pub struct AccountKeyCredentialProvider {
    account: StorageAccount,
}

impl AccountKeyCredentialProvider {
    /// Create a provider for `account`.
    pub fn new(account: StorageAccount) -> Self {
        Self { account }
    }
}

#[async_trait]
impl ProvideCredential for AccountKeyCredentialProvider {
    type Credential = Credential;

    async fn provide_credential(&self, _ctx: &Context) -> Result<Option<Self::Credential>> {
        let key = self.account.key().await?;
        Ok(Some(Credential::with_shared_key(self.account.name(), &key)))
    }
}

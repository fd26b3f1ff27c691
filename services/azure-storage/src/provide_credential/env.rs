use async_trait::async_trait;
use azrest_core::{Context, ProvideCredential, Result};

use crate::constants::*;
use crate::credential::Credential;

/// Load a storage credential from the environment.
///
/// Tried in order:
///
/// - `AZURE_STORAGE_ACCOUNT_NAME` with `AZURE_STORAGE_ACCOUNT_KEY`
/// - `AZURE_STORAGE_SAS_TOKEN`
/// - `AZURE_STORAGE_BEARER_TOKEN`
#[derive(Clone, Debug, Default)]
pub struct EnvCredentialProvider {}

impl EnvCredentialProvider {
    /// Create a new env provider.
    pub fn new() -> Self {
        Self {}
    }
}

#[async_trait]
impl ProvideCredential for EnvCredentialProvider {
    type Credential = Credential;

    async fn provide_credential(&self, ctx: &Context) -> Result<Option<Self::Credential>> {
        let get = |k: &str| ctx.env_value(k);

        if let (Some(account_name), Some(account_key)) = (
            get(AZURE_STORAGE_ACCOUNT_NAME),
            get(AZURE_STORAGE_ACCOUNT_KEY),
        ) {
            return Ok(Some(Credential::with_shared_key(&account_name, &account_key)));
        }

        if let Some(sas_token) = get(AZURE_STORAGE_SAS_TOKEN) {
            return Ok(Some(Credential::with_sas_token(&sas_token)));
        }

        if let Some(bearer_token) = get(AZURE_STORAGE_BEARER_TOKEN) {
            return Ok(Some(Credential::with_bearer_token(&bearer_token, None)));
        }

        Ok(None)
    }
}

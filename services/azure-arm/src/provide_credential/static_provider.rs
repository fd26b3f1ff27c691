use async_trait::async_trait;
use azrest_core::{Context, ProvideCredential, Result};

use crate::Token;

/// Serve a token obtained elsewhere.
///
/// Once the token expires the signer reports that no valid credential is available.
#[derive(Clone, Debug)]
pub struct StaticCredentialProvider {
    token: Token,
}

impl StaticCredentialProvider {
    /// Create a provider always returning `token`.
    pub fn new(token: Token) -> Self {
        Self { token }
    }
}

#[async_trait]
impl ProvideCredential for StaticCredentialProvider {
    type Credential = Token;

    async fn provide_credential(&self, _ctx: &Context) -> Result<Option<Self::Credential>> {
        Ok(Some(self.token.clone()))
    }
}

use std::collections::HashMap;
use std::sync::Mutex;

use azrest_core::{Context, Error, Result, Signer};

use crate::provide_credential::{ClientSecretCredentialProvider, StaticCredentialProvider, TokenEndpoint};
use crate::sign_request::BearerRequestSigner;
use crate::{Config, Endpoints, Token};

/// Tokens of one client, keyed by audience.
///
/// The map lock is only held to look up the signer of an audience. Each signer
/// serializes its own loading, so audiences refresh in parallel while callers
/// of the same audience wait for a single acquisition.
#[derive(Debug)]
pub(crate) struct TokenCache {
    ctx: Context,
    tenant_id: Option<String>,
    client_id: Option<String>,
    client_secret: Option<String>,
    endpoints: Endpoints,
    signers: Mutex<HashMap<String, Signer<Token>>>,
}

impl TokenCache {
    pub(crate) fn new(ctx: Context, config: &Config, endpoints: Endpoints) -> Self {
        Self {
            ctx,
            tenant_id: config.tenant_id.clone(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            endpoints,
            signers: Mutex::new(HashMap::new()),
        }
    }

    /// Token endpoint serving `audience`.
    ///
    /// Microsoft Graph is only served by the v2 endpoint, everything else goes through v1.
    fn token_endpoint(&self, audience: &str) -> TokenEndpoint {
        if audience == self.endpoints.microsoft_graph {
            TokenEndpoint::V2 {
                authority_host: self.endpoints.microsoft_graph_login.clone(),
                scope: format!("{}/.default", audience.trim_end_matches('/')),
            }
        } else {
            TokenEndpoint::V1 {
                authority_host: self.endpoints.active_directory.clone(),
                resource: audience.to_string(),
            }
        }
    }

    fn signer(&self, audience: &str) -> Result<Signer<Token>> {
        let mut signers = self
            .signers
            .lock()
            .map_err(|_| Error::unexpected("token cache lock poisoned"))?;
        let signer = signers.entry(audience.to_string()).or_insert_with(|| {
            let mut provider = ClientSecretCredentialProvider::new(self.token_endpoint(audience));
            if let Some(v) = &self.tenant_id {
                provider = provider.with_tenant_id(v);
            }
            if let Some(v) = &self.client_id {
                provider = provider.with_client_id(v);
            }
            if let Some(v) = &self.client_secret {
                provider = provider.with_client_secret(v);
            }
            Signer::new(self.ctx.clone(), provider, BearerRequestSigner)
        });
        Ok(signer.clone())
    }

    /// Serve `token` for its audience instead of asking Azure AD.
    pub(crate) fn insert_static(&self, token: Token) -> Result<()> {
        let audience = token.audience.clone();
        let signer = Signer::new(
            self.ctx.clone(),
            StaticCredentialProvider::new(token),
            BearerRequestSigner,
        );
        self.signers
            .lock()
            .map_err(|_| Error::unexpected("token cache lock poisoned"))?
            .insert(audience, signer);
        Ok(())
    }

    /// Return a token for `audience` valid for at least one more second.
    pub(crate) async fn token(&self, audience: &str) -> Result<Token> {
        self.signer(audience)?.credential().await
    }

    /// Forget the token of `audience`, the next request acquires a new one.
    pub(crate) async fn invalidate(&self, audience: &str) -> Result<()> {
        self.signer(audience)?.invalidate().await;
        Ok(())
    }

    /// Set the `Authorization` header of `parts` for `audience`.
    pub(crate) async fn authorize(
        &self,
        audience: &str,
        parts: &mut http::request::Parts,
    ) -> Result<()> {
        self.signer(audience)?.sign(parts, None).await
    }
}

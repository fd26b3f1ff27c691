use crate::{Context, Error, ProvideCredential, Result, SignRequest, SigningCredential};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Signer is the main struct used to sign the request.
///
/// It caches the credential returned by its provider and only asks the provider
/// again once the cached credential is no longer valid. Concurrent callers that
/// find the cache empty wait for the first one to finish loading instead of
/// loading the credential twice.
#[derive(Clone, Debug)]
pub struct Signer<K: SigningCredential> {
    ctx: Context,
    loader: Arc<dyn ProvideCredential<Credential = K>>,
    builder: Arc<dyn SignRequest<Credential = K>>,
    credential: Arc<Mutex<Option<K>>>,
}

impl<K: SigningCredential> Signer<K> {
    /// Create a new signer.
    pub fn new(
        ctx: Context,
        loader: impl ProvideCredential<Credential = K>,
        builder: impl SignRequest<Credential = K>,
    ) -> Self {
        Self {
            ctx,
            loader: Arc::new(loader),
            builder: Arc::new(builder),
            credential: Arc::new(Mutex::new(None)),
        }
    }

    /// Return a valid credential, loading a new one if the cached one expired.
    pub async fn credential(&self) -> Result<K> {
        let mut cached = self.credential.lock().await;
        if let Some(cred) = cached.as_ref() {
            if cred.is_valid() {
                return Ok(cred.clone());
            }
        }

        let loaded = self
            .loader
            .provide_credential(&self.ctx)
            .await?
            .ok_or_else(|| Error::config_invalid("no valid credential found"))?;
        *cached = Some(loaded.clone());
        Ok(loaded)
    }

    /// Drop the cached credential so the next call loads a fresh one.
    pub async fn invalidate(&self) {
        *self.credential.lock().await = None;
    }

    /// Signing request.
    pub async fn sign(
        &self,
        req: &mut http::request::Parts,
        expires_in: Option<Duration>,
    ) -> Result<()> {
        let credential = self.credential().await?;

        self.builder
            .sign_request(&self.ctx, req, Some(&credential), expires_in)
            .await
    }
}

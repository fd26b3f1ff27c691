use std::fmt::Debug;
use std::time::Duration;

use http::request::Parts;

use crate::{Context, Result};

/// Credential cached by a [`Signer`](crate::Signer).
pub trait SigningCredential: Clone + Debug + Send + Sync + Unpin + 'static {
    /// Whether the credential can still sign.
    ///
    /// Tokens must turn invalid shortly before they expire, the signer then
    /// asks its provider for a new one.
    fn is_valid(&self) -> bool;
}

/// Source of credentials: environment, token endpoint, control plane.
#[async_trait::async_trait]
pub trait ProvideCredential: Debug + Send + Sync + Unpin + 'static {
    /// Credential produced.
    type Credential: Send + Sync + Unpin + 'static;

    /// Produce a credential, `Ok(None)` when this source is not configured.
    async fn provide_credential(&self, ctx: &Context) -> Result<Option<Self::Credential>>;
}

/// Attach a credential to a request.
#[async_trait::async_trait]
pub trait SignRequest: Debug + Send + Sync + Unpin + 'static {
    /// Credential consumed.
    type Credential: Send + Sync + Unpin + 'static;

    /// Sign `req` in place.
    ///
    /// `expires_in` asks for a presigned request valid that long instead of an
    /// `Authorization` header. Signers that can't presign return
    /// [`ErrorKind::RequestInvalid`](crate::ErrorKind::RequestInvalid).
    async fn sign_request(
        &self,
        ctx: &Context,
        req: &mut Parts,
        credential: Option<&Self::Credential>,
        expires_in: Option<Duration>,
    ) -> Result<()>;
}

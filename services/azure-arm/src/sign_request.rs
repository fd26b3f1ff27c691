use std::time::Duration;

use async_trait::async_trait;
use azrest_core::{Context, Error, Result, SignRequest};
use http::header::AUTHORIZATION;
use http::HeaderValue;

use crate::Token;

/// Set `Authorization: <token_type> <access_token>` on requests.
#[derive(Debug, Default, Clone, Copy)]
pub struct BearerRequestSigner;

#[async_trait]
impl SignRequest for BearerRequestSigner {
    type Credential = Token;

    async fn sign_request(
        &self,
        _ctx: &Context,
        req: &mut http::request::Parts,
        credential: Option<&Self::Credential>,
        expires_in: Option<Duration>,
    ) -> Result<()> {
        let Some(token) = credential else {
            return Err(Error::config_invalid("no token available to sign request"));
        };
        if expires_in.is_some() {
            return Err(Error::not_supported(
                "bearer tokens cannot presign requests",
            ));
        }

        let mut value = HeaderValue::from_str(&token.authorization())?;
        value.set_sensitive(true);
        req.headers.insert(AUTHORIZATION, value);
        Ok(())
    }
}

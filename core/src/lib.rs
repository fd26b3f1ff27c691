//! Shared building blocks of the azrest crates.
//!
//! - [`Context`] carries the http sender and environment every client goes through.
//! - [`Signer`] caches a credential from a [`ProvideCredential`] and signs
//!   requests with a [`SignRequest`].
//! - [`Error`] and [`ErrorKind`] are returned by every crate in the workspace.
//!
//! Service crates (`azrest-azure-arm`, `azrest-azure-storage`) provide the
//! credentials and signers, this crate only wires them together.
//!
//! ## Example
//!
//! A signer attaching a fixed AAD token:
//!
//! ```no_run
//! use async_trait::async_trait;
//! use azrest_core::{Context, ProvideCredential, Result, SignRequest, Signer, SigningCredential};
//! use http::request::Parts;
//! use std::time::Duration;
//!
//! #[derive(Clone, Debug)]
//! struct AadToken(String);
//!
//! impl SigningCredential for AadToken {
//!     fn is_valid(&self) -> bool {
//!         !self.0.is_empty()
//!     }
//! }
//!
//! #[derive(Debug)]
//! struct FixedToken;
//!
//! #[async_trait]
//! impl ProvideCredential for FixedToken {
//!     type Credential = AadToken;
//!
//!     async fn provide_credential(&self, ctx: &Context) -> Result<Option<AadToken>> {
//!         Ok(ctx.env_value("AZURE_ACCESS_TOKEN").map(AadToken))
//!     }
//! }
//!
//! #[derive(Debug)]
//! struct Bearer;
//!
//! #[async_trait]
//! impl SignRequest for Bearer {
//!     type Credential = AadToken;
//!
//!     async fn sign_request(
//!         &self,
//!         _: &Context,
//!         req: &mut Parts,
//!         credential: Option<&AadToken>,
//!         _: Option<Duration>,
//!     ) -> Result<()> {
//!         if let Some(token) = credential {
//!             req.headers.insert(
//!                 http::header::AUTHORIZATION,
//!                 format!("Bearer {}", token.0).parse()?,
//!             );
//!         }
//!         Ok(())
//!     }
//! }
//!
//! # async fn example() -> Result<()> {
//! let signer = Signer::new(Context::new().with_env(azrest_core::OsEnv), FixedToken, Bearer);
//! let mut parts = http::Request::get("https://management.azure.com/subscriptions")
//!     .body(())?
//!     .into_parts()
//!     .0;
//! signer.sign(&mut parts, None).await?;
//! # Ok(())
//! # }
//! ```

// Make sure all our public APIs have docs.
#![warn(missing_docs)]

pub mod hash;
pub mod time;
pub mod utils;

mod context;
pub use context::{Context, Env, HttpSend, NoopHttpSend, OsEnv, StaticEnv};

mod error;
pub use error::{Error, ErrorDetail, ErrorKind, Result};

mod api;
pub use api::{ProvideCredential, SignRequest, SigningCredential};
mod request;
pub use request::{SigningMethod, SigningRequest};
mod signer;
pub use signer::Signer;

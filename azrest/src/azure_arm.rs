//! Azure Resource Manager support with convenience APIs.

pub use azrest_azure_arm::*;

#[cfg(feature = "default-context")]
use crate::{default_context, Result};

/// Create an [`AzureClient`] configured from `AZURE_*` environment variables.
///
/// The client sends through [`default_context`].
///
/// # Example
///
/// ```no_run
/// # #[tokio::main]
/// # async fn main() -> azrest::Result<()> {
/// let client = azrest::azure_arm::default_client()?;
/// let subscription = client.subscription_id().await?;
/// println!("using subscription {subscription}");
/// # Ok(())
/// # }
/// ```
#[cfg(feature = "default-context")]
pub fn default_client() -> Result<AzureClient> {
    AzureClient::from_env(default_context())
}

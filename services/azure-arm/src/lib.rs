//! Azure Resource Manager client core.
//!
//! This crate talks to the token authenticated Azure REST APIs:
//!
//! - Azure Resource Manager, with api-version routing, long-running operation
//!   polling, pagination and on demand provider registration
//! - Microsoft Graph and the legacy AAD Graph
//! - Log Analytics
//!
//! Tokens are acquired with the client credentials flow and cached per audience.
//!
//! # Example
//!
//! ```rust,no_run
//! use azrest_azure_arm::{AzureClient, Config, Query};
//! use azrest_core::{Context, Result};
//! use serde_json::Value;
//!
//! async fn example(ctx: Context) -> Result<()> {
//!     let config = Config::default().from_env(&ctx)?;
//!     let client = AzureClient::new(ctx, config);
//!
//!     let vms: Vec<Value> = client
//!         .list("Microsoft.Compute/virtualMachines", Query::new())
//!         .await?;
//!     for vm in vms {
//!         println!("{}", vm["name"]);
//!     }
//!     Ok(())
//! }
//! ```

mod constants;

mod environment;
pub use environment::{AzureEnvironment, Endpoints};

mod config;
pub use config::Config;

mod credential;
pub use credential::Token;

mod provide_credential;
pub use provide_credential::*;

mod sign_request;
pub use sign_request::BearerRequestSigner;

mod query;
pub use query::Query;

pub mod api_version;

mod client;
pub use client::AzureClient;

mod error;
mod graph;
mod list;
pub use list::{filter_by_location, one_of};
mod loganalytics;
mod lro;
mod path;
mod registrar;
pub use registrar::ProviderService;
mod subscription;
pub use subscription::{ResourceGroup, Subscription};
mod tags;
mod token;
mod transport;

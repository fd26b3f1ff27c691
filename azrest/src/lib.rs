#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub use azrest_core::*;

#[cfg(feature = "default-context")]
mod context;
#[cfg(feature = "default-context")]
pub use context::default_context;

#[cfg(feature = "azure-arm")]
pub mod azure_arm;

#[cfg(feature = "azure-storage")]
pub mod azure_storage {
    pub use azrest_azure_storage::*;
}

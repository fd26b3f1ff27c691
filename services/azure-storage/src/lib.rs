//! Azure Storage blob data plane.
//!
//! - Requests signed with Shared Key, SAS tokens or bearer tokens
//! - Containers, container ACLs, blobs and CORS rules of the blob service
//! - Multipart block blob uploads guarded by a lease
//! - Sparse VHD uploads into page blobs with a bounded worker pool
//! - Storage accounts resolved through Azure Resource Manager, with lazily
//!   fetched keys and presigned urls
//!
//! # Example
//!
//! ```rust,no_run
//! use azrest_azure_storage::{BlobClient, StaticCredentialProvider, VhdUpload};
//! use azrest_core::{Context, Result};
//!
//! async fn example(ctx: Context) -> Result<()> {
//!     let client = BlobClient::new(
//!         ctx,
//!         "https://myaccount.blob.core.windows.net",
//!         StaticCredentialProvider::new_shared_key("myaccount", "bXlrZXk="),
//!     );
//!
//!     client.ensure_container("vhds").await?;
//!     let upload = VhdUpload::new("/tmp/disk.vhd")
//!         .with_progress(|percent| println!("{percent:.1}%"));
//!     let url = client.upload_page_blob("vhds", &upload).await?;
//!     println!("uploaded to {url}");
//!     Ok(())
//! }
//! ```

mod account_sas;
mod constants;
mod error;

mod credential;
pub use credential::Credential;

mod sign_request;
pub use sign_request::RequestSigner;

mod provide_credential;
pub use provide_credential::*;

mod model;
pub use model::{
    Blob, BlobList, BlobProperties, Container, ContainerAccess, ContainerProperties, CorsRule,
};

mod blob;
pub use blob::{meta_headers, validate_container_name, BlobClient, ListBlobsOptions};

mod multipart;
pub use multipart::{block_id, split_key};

mod page_blob;
pub use page_blob::{PageRange, ProgressFn, VhdUpload};

mod account;
pub use account::{validate_account_name, StorageAccount};

mod sas;

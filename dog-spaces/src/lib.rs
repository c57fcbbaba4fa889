//! # dog-spaces: Digital Ocean Spaces upload provider
//!
//! `dog-spaces` stores uploaded files in a Digital Ocean Space (or any other
//! S3-compatible bucket) on behalf of a content-management host.
//!
//! ## Key Features
//!
//! - **Deterministic keys**: `<digest><ext>`, `<directory>/<digest><ext>` or
//!   `<folder>/<subfolder>/<digest><ext>` from a `folder_subfolder_name` filename
//! - **Per-folder ACLs**: folder rules override the default canned ACL
//! - **CDN URLs**: public URLs rewritten to a CDN host over https
//! - **Windowed reads**: objects streamed with sequential ranged GETs
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dog_spaces::prelude::*;
//!
//! # #[tokio::main]
//! # async fn main() -> SpacesResult<()> {
//! let config = SpacesConfig::new("key", "secret", "fra1.digitaloceanspaces.com", "media")
//!     .with_cdn("https://cdn.example.com")
//!     .with_acl("public-read")
//!     .with_folder("invoices", "private");
//!
//! let provider = dog_spaces::plugin::init(config).await?;
//!
//! let file = FileDescriptor::from_buffer("invoices_2024_march", "a1b2c3", ".pdf", "application/pdf", b"%PDF".to_vec());
//! let receipt = provider.upload(file, UploadOverrides::default()).await?;
//! println!("stored at {}", receipt.url);
//!
//! let info = provider.get_file_info(&receipt.file).await?;
//! assert_eq!(info.content_length, 4);
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
pub mod location;
mod memory_store;
pub mod plugin;
mod provider;
pub mod range;
mod receipt;
mod s3_store;
pub mod store;
mod types;

pub use config::{FolderRule, FolderRules, SpacesConfig, DEFAULT_ACL, DEFAULT_CACHE_CONTROL, DEFAULT_REGION};
pub use error::{SpacesError, SpacesResult};
pub use location::{md5_hex, LocationResolver};
pub use memory_store::{MemoryObjectStore, StoredObject};
pub use provider::{SpacesProvider, UploadProvider};
pub use range::DEFAULT_WINDOW;
pub use receipt::{FileInfo, RangedRead, UploadReceipt};
pub use s3_store::SpacesStore;
pub use store::{ObjectHead, ObjectStore, PutObject, PutOutput};
pub use types::{ByteStream, FileBody, FileDescriptor, FileRef, UploadOverrides};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        FileDescriptor, FileRef, SpacesConfig, SpacesError, SpacesProvider, SpacesResult,
        UploadOverrides, UploadProvider, UploadReceipt,
    };
}

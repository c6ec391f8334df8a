//! Name-addressed blob storage behind a backend-agnostic [`BlobStore`] trait,
//! with a local-disk implementation in [`DiskBlobStore`].
//!
//! ```no_run
//! # async fn demo() -> blob_store::BlobResult<()> {
//! use blob_store::{BlobStore, Context, DiskBlobStore};
//!
//! let store = DiskBlobStore::with_prefix("/var/lib/blobs", "cache")?;
//! let ctx = Context::background();
//! store.write_blob(&ctx, "greeting", b"hello").await?;
//! assert_eq!(store.read_blob(&ctx, "greeting").await?, b"hello");
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod context;
pub mod errors;
pub mod local_store;
pub mod name;
pub mod store;

pub use config::DiskBlobStoreConfig;
pub use context::Context;
pub use errors::{BlobErrorKind, BlobResult, BlobStoreError, CancelReason};
pub use local_store::DiskBlobStore;
pub use name::BlobName;
pub use store::BlobStore;

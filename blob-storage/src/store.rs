use async_trait::async_trait;

use crate::context::Context;
pub use crate::errors::BlobResult;

/// Name-addressed byte storage, implemented by each storage backend.
///
/// Callers identify blobs purely by name and must not assume anything about
/// how a backend lays them out.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Stores `data` under `name`, replacing any existing blob. Returns the
    /// number of bytes written.
    async fn write_blob(&self, ctx: &Context, name: &str, data: &[u8]) -> BlobResult<usize>;

    /// Retrieves the full contents of a blob.
    async fn read_blob(&self, ctx: &Context, name: &str) -> BlobResult<Vec<u8>>;

    /// A missing blob is `Ok(false)`, not an error.
    async fn blob_exists(&self, ctx: &Context, name: &str) -> BlobResult<bool>;

    async fn delete_blob(&self, ctx: &Context, name: &str) -> BlobResult<()>;
}

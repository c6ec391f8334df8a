use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::config::DiskBlobStoreConfig;
use crate::context::Context;
use crate::errors::{is_absent, BlobResult, BlobStoreError};
use crate::name::BlobName;
use crate::store::BlobStore;

/// A [`BlobStore`] that keeps each blob as a regular file at
/// `root/[prefix/]name`.
///
/// Writes go to a uniquely named temp file next to the target and are renamed
/// into place, so readers only ever see complete blobs. The store holds no
/// file handles or locks between calls; any number of instances may share a
/// directory.
#[derive(Clone, Debug)]
pub struct DiskBlobStore {
    root: PathBuf,
    prefix: String,
    effective_root: PathBuf,
}

impl DiskBlobStore {
    /// Opens a store rooted directly at `root`, creating it if needed.
    pub fn new(root: impl Into<PathBuf>) -> BlobResult<Self> {
        Self::with_prefix(root, "")
    }

    /// Opens a store whose blobs all live under `root/prefix`. An empty
    /// prefix is the same as [`DiskBlobStore::new`]; one trailing `/` is
    /// ignored.
    pub fn with_prefix(root: impl Into<PathBuf>, prefix: &str) -> BlobResult<Self> {
        let root = root.into();
        let prefix = prefix.strip_suffix('/').unwrap_or(prefix);
        let effective_root = if prefix.is_empty() {
            root.clone()
        } else {
            BlobName::parse(prefix)?.to_path(&root)
        };

        std::fs::create_dir_all(&effective_root)
            .map_err(|e| BlobStoreError::io(&effective_root, e))?;
        ensure_writable_dir(&effective_root)?;

        tracing::debug!("opened disk blob store at {}", effective_root.display());
        Ok(Self {
            root,
            prefix: prefix.to_string(),
            effective_root,
        })
    }

    pub fn from_config(config: &DiskBlobStoreConfig) -> BlobResult<Self> {
        Self::with_prefix(config.root_dir.clone(), &config.path_prefix)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// `root` joined with `prefix`; the directory every blob lives under.
    pub fn effective_root(&self) -> &Path {
        &self.effective_root
    }

    fn blob_path(&self, name: &BlobName<'_>) -> PathBuf {
        name.to_path(&self.effective_root)
    }

    /// Writes `data` to `tmp` and renames it over `path`. The caller owns
    /// cleanup of `tmp` on error.
    async fn commit(&self, ctx: &Context, tmp: &Path, path: &Path, data: &[u8]) -> BlobResult<()> {
        let mut file = match create_new(tmp).await {
            // a concurrent delete pruned the freshly created parent
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                if let Some(dir) = tmp.parent() {
                    fs::create_dir_all(dir)
                        .await
                        .map_err(|e| BlobStoreError::io(dir, e))?;
                }
                create_new(tmp).await
            }
            other => other,
        }
        .map_err(|e| BlobStoreError::io(tmp, e))?;

        file.write_all(data)
            .await
            .map_err(|e| BlobStoreError::io(tmp, e))?;
        file.flush().await.map_err(|e| BlobStoreError::io(tmp, e))?;
        file.sync_all()
            .await
            .map_err(|e| BlobStoreError::io(tmp, e))?;
        drop(file);

        // last point at which a canceled write leaves no trace
        ctx.check()?;

        fs::rename(tmp, path)
            .await
            .map_err(|e| BlobStoreError::io(path, e))
    }

    async fn discard(&self, tmp: &Path) {
        match fs::remove_file(tmp).await {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!("failed to remove temp blob {}: {}", tmp.display(), e),
        }
    }

    /// Removes directories left empty by deleting `path`, stopping at the
    /// effective root or the first directory that still has entries.
    async fn prune_empty_parents(&self, path: &Path) {
        let mut dir = path.parent();
        while let Some(current) = dir {
            if current == self.effective_root || !current.starts_with(&self.effective_root) {
                break;
            }
            if let Err(e) = fs::remove_dir(current).await {
                tracing::trace!("stopped pruning at {}: {}", current.display(), e);
                break;
            }
            dir = current.parent();
        }
    }
}

async fn create_new(path: &Path) -> io::Result<File> {
    OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await
}

/// Temp names have a fixed length so any legal blob file name can be written.
fn temp_path(dir: &Path) -> PathBuf {
    dir.join(format!(".{}.tmp", Uuid::new_v4()))
}

fn ensure_writable_dir(dir: &Path) -> BlobResult<()> {
    let meta = std::fs::metadata(dir).map_err(|e| BlobStoreError::io(dir, e))?;
    if !meta.is_dir() {
        return Err(BlobStoreError::io(
            dir,
            io::Error::new(io::ErrorKind::Other, "blob store root is not a directory"),
        ));
    }

    let probe = temp_path(dir);
    std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&probe)
        .map_err(|e| BlobStoreError::io(dir, e))?;
    std::fs::remove_file(&probe).map_err(|e| BlobStoreError::io(&probe, e))
}

#[async_trait]
impl BlobStore for DiskBlobStore {
    async fn write_blob(&self, ctx: &Context, name: &str, data: &[u8]) -> BlobResult<usize> {
        let name = BlobName::parse(name)?;
        ctx.check()?;

        let path = self.blob_path(&name);
        let dir = path
            .parent()
            .unwrap_or(self.effective_root.as_path())
            .to_path_buf();
        if dir != self.effective_root {
            fs::create_dir_all(&dir)
                .await
                .map_err(|e| BlobStoreError::io(&dir, e))?;
        }

        let tmp = temp_path(&dir);
        if let Err(e) = self.commit(ctx, &tmp, &path, data).await {
            self.discard(&tmp).await;
            return Err(e);
        }

        tracing::debug!("wrote blob {} ({} bytes)", name.as_str(), data.len());
        Ok(data.len())
    }

    async fn read_blob(&self, ctx: &Context, name: &str) -> BlobResult<Vec<u8>> {
        let name = BlobName::parse(name)?;
        ctx.check()?;

        let path = self.blob_path(&name);
        let data = fs::read(&path)
            .await
            .map_err(|e| BlobStoreError::from_io(name.as_str(), &path, e))?;
        ctx.check()?;

        tracing::debug!("read blob {} ({} bytes)", name.as_str(), data.len());
        Ok(data)
    }

    async fn blob_exists(&self, ctx: &Context, name: &str) -> BlobResult<bool> {
        let name = BlobName::parse(name)?;
        ctx.check()?;

        let path = self.blob_path(&name);
        let exists = match fs::metadata(&path).await {
            Ok(meta) => meta.is_file(),
            Err(e) if is_absent(&e) => false,
            Err(e) => return Err(BlobStoreError::io(&path, e)),
        };
        ctx.check()?;
        Ok(exists)
    }

    async fn delete_blob(&self, ctx: &Context, name: &str) -> BlobResult<()> {
        let name = BlobName::parse(name)?;
        ctx.check()?;

        let path = self.blob_path(&name);
        match fs::remove_file(&path).await {
            Ok(()) => {
                tracing::debug!("deleted blob {}", name.as_str());
                self.prune_empty_parents(&path).await;
                Ok(())
            }
            Err(e) if is_absent(&e) => {
                tracing::debug!("blob {} already absent", name.as_str());
                Ok(())
            }
            Err(e) => Err(BlobStoreError::io(&path, e)),
        }
    }
}

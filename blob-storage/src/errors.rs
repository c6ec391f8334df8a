use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Why a [`crate::context::Context`] stopped an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    Canceled,
    DeadlineExceeded,
}

impl std::fmt::Display for CancelReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CancelReason::Canceled => write!(f, "context canceled"),
            CancelReason::DeadlineExceeded => write!(f, "context deadline exceeded"),
        }
    }
}

/// Coarse classification of a [`BlobStoreError`], stable across backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlobErrorKind {
    InvalidName,
    NotFound,
    PermissionDenied,
    Io,
    Canceled,
}

#[derive(Debug, Error)]
pub enum BlobStoreError {
    #[error("invalid blob name {name:?}: {reason}")]
    InvalidName { name: String, reason: &'static str },

    #[error("blob {name:?} not found")]
    NotFound { name: String },

    #[error("permission denied accessing {}", path.display())]
    PermissionDenied {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("I/O error at {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("operation aborted: {0}")]
    Canceled(CancelReason),
}

pub type BlobResult<T> = Result<T, BlobStoreError>;

/// True when `err` means nothing exists at the path. A name whose parent
/// segment is a regular file fails with ENOTDIR, which is also absence.
pub(crate) fn is_absent(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::NotFound | io::ErrorKind::NotADirectory
    )
}

impl BlobStoreError {
    pub(crate) fn invalid_name(name: &str, reason: &'static str) -> Self {
        BlobStoreError::InvalidName {
            name: name.to_string(),
            reason,
        }
    }

    /// Maps an io error against `path` into the taxonomy. `name` is what the
    /// caller asked for and is reported on NotFound.
    pub(crate) fn from_io(name: &str, path: &Path, source: io::Error) -> Self {
        if is_absent(&source) {
            return BlobStoreError::NotFound {
                name: name.to_string(),
            };
        }
        Self::io(path, source)
    }

    /// Classifies an io error without ever producing NotFound. Used where a
    /// missing path is a setup failure rather than a missing blob.
    pub fn io(path: &Path, source: io::Error) -> Self {
        match source.kind() {
            io::ErrorKind::PermissionDenied => BlobStoreError::PermissionDenied {
                path: path.to_path_buf(),
                source,
            },
            _ => BlobStoreError::Io {
                path: path.to_path_buf(),
                source,
            },
        }
    }

    pub fn kind(&self) -> BlobErrorKind {
        match self {
            BlobStoreError::InvalidName { .. } => BlobErrorKind::InvalidName,
            BlobStoreError::NotFound { .. } => BlobErrorKind::NotFound,
            BlobStoreError::PermissionDenied { .. } => BlobErrorKind::PermissionDenied,
            BlobStoreError::Io { .. } => BlobErrorKind::Io,
            BlobStoreError::Canceled(_) => BlobErrorKind::Canceled,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == BlobErrorKind::NotFound
    }

    pub fn is_canceled(&self) -> bool {
        self.kind() == BlobErrorKind::Canceled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(kind: io::ErrorKind) -> BlobErrorKind {
        BlobStoreError::from_io("a", Path::new("/tmp/blobs/a"), io::Error::from(kind)).kind()
    }

    #[test]
    fn test_io_error_classification() {
        assert_eq!(classify(io::ErrorKind::NotFound), BlobErrorKind::NotFound);
        assert_eq!(classify(io::ErrorKind::NotADirectory), BlobErrorKind::NotFound);
        assert_eq!(
            classify(io::ErrorKind::PermissionDenied),
            BlobErrorKind::PermissionDenied
        );
        assert_eq!(classify(io::ErrorKind::Other), BlobErrorKind::Io);
    }

    #[test]
    fn test_setup_io_never_reports_not_found() {
        let err = BlobStoreError::io(Path::new("/nope"), io::Error::from(io::ErrorKind::NotFound));
        assert_eq!(err.kind(), BlobErrorKind::Io);

        let err = BlobStoreError::io(
            Path::new("/root/out.bin"),
            io::Error::from(io::ErrorKind::PermissionDenied),
        );
        assert_eq!(err.kind(), BlobErrorKind::PermissionDenied);
    }

    #[test]
    fn test_canceled_message() {
        let err = BlobStoreError::Canceled(CancelReason::DeadlineExceeded);
        assert!(err.is_canceled());
        assert_eq!(
            err.to_string(),
            "operation aborted: context deadline exceeded"
        );
    }
}

use std::path::PathBuf;

use clap::Args;

/// Construction parameters for [`crate::local_store::DiskBlobStore`].
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct DiskBlobStoreConfig {
    /// Directory under which all blobs are stored.
    #[clap(long, env = "BLOB_STORE_ROOT_DIR")]
    pub root_dir: PathBuf,

    /// Optional sub-path of `root_dir` shared by every blob in the store. A
    /// single trailing `/` is ignored.
    #[clap(long, env = "BLOB_STORE_PATH_PREFIX", default_value = "")]
    pub path_prefix: String,
}

impl DiskBlobStoreConfig {
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
            path_prefix: String::new(),
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.path_prefix = prefix.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Cli {
        #[clap(flatten)]
        store: DiskBlobStoreConfig,
    }

    #[test]
    fn test_parse_flags() {
        let cli = Cli::parse_from([
            "test",
            "--root-dir",
            "/var/blobs",
            "--path-prefix",
            "cache",
        ]);
        assert_eq!(
            cli.store,
            DiskBlobStoreConfig::new("/var/blobs").with_prefix("cache")
        );
    }

    #[test]
    fn test_prefix_defaults_to_empty() {
        let cli = Cli::parse_from(["test", "--root-dir", "/var/blobs"]);
        assert_eq!(cli.store.path_prefix, "");
    }
}

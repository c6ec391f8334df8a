use std::path::{Component, Path, PathBuf};

use crate::errors::{BlobResult, BlobStoreError};

/// A blob name that has passed path-safety validation.
///
/// A valid name is a `/`-separated relative path made only of normal
/// components, so joining it onto the effective root can never resolve
/// outside of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobName<'a> {
    raw: &'a str,
}

impl<'a> BlobName<'a> {
    pub fn parse(raw: &'a str) -> BlobResult<Self> {
        validate_relative(raw)?;
        Ok(Self { raw })
    }

    pub fn as_str(&self) -> &'a str {
        self.raw
    }

    /// The final path segment; the file the blob lives in.
    pub fn file_name(&self) -> &'a str {
        self.raw.rsplit('/').next().unwrap_or(self.raw)
    }

    pub fn to_path(&self, effective_root: &Path) -> PathBuf {
        self.raw
            .split('/')
            .fold(effective_root.to_path_buf(), |path, segment| path.join(segment))
    }
}

fn validate_relative(raw: &str) -> BlobResult<()> {
    if raw.is_empty() {
        return Err(BlobStoreError::invalid_name(raw, "name is empty"));
    }
    if raw.contains('\0') {
        return Err(BlobStoreError::invalid_name(raw, "name contains a NUL byte"));
    }
    if raw.contains('\\') {
        return Err(BlobStoreError::invalid_name(raw, "name contains a backslash"));
    }
    if raw.starts_with('/') {
        return Err(BlobStoreError::invalid_name(raw, "name is an absolute path"));
    }
    for segment in raw.split('/') {
        let reason = match segment {
            "" => Some("name contains an empty path segment"),
            "." => Some("name contains a current-directory component"),
            ".." => Some("name contains a parent-directory component"),
            _ => None,
        };
        if let Some(reason) = reason {
            return Err(BlobStoreError::invalid_name(raw, reason));
        }
        // catches platform prefixes such as `C:` that the checks above miss
        let mut components = Path::new(segment).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => {}
            _ => {
                return Err(BlobStoreError::invalid_name(
                    raw,
                    "name does not resolve to a relative path",
                ))
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::BlobErrorKind;

    fn rejected(raw: &str) -> bool {
        matches!(BlobName::parse(raw), Err(e) if e.kind() == BlobErrorKind::InvalidName)
    }

    #[test]
    fn test_accepts_plain_and_nested_names() {
        assert!(BlobName::parse("test_blob").is_ok());
        assert!(BlobName::parse("ac/0f3e9a").is_ok());
        assert!(BlobName::parse("..hidden").is_ok());
        assert!(BlobName::parse("a.b..c").is_ok());
    }

    #[test]
    fn test_rejects_traversal() {
        assert!(rejected(".."));
        assert!(rejected("../escape"));
        assert!(rejected("a/../../escape"));
        assert!(rejected("a/.."));
        assert!(rejected("./a"));
    }

    #[test]
    fn test_rejects_absolute_and_malformed() {
        assert!(rejected(""));
        assert!(rejected("/etc/passwd"));
        assert!(rejected("a//b"));
        assert!(rejected("a/"));
        assert!(rejected("a\\..\\b"));
        assert!(rejected("nul\0byte"));
    }

    #[test]
    fn test_path_and_file_name() {
        let name = BlobName::parse("ab/cd/blob").unwrap();
        assert_eq!(name.file_name(), "blob");
        assert_eq!(
            name.to_path(Path::new("/data")),
            PathBuf::from("/data/ab/cd/blob")
        );
    }
}

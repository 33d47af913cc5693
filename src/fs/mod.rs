//! Filesystem access module
//!
//! The walker never touches `std::fs` directly. Everything goes through the
//! [`FilesystemPort`] trait so the coordinator can be driven by the local
//! filesystem in production and by an in-memory tree in tests.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                  DirectoryVisitor                    │
//! │  - One read_dir per admitted task                   │
//! │  - Runs on the blocking pool                        │
//! └─────────────────────────┬───────────────────────────┘
//!                           │
//!                           ▼
//! ┌─────────────────────────────────────────────────────┐
//! │                  FilesystemPort                      │
//! │  - read_dir: children + lstat metadata, sorted      │
//! │  - stat: follows symlinks (used for the root)       │
//! └─────────────────────────────────────────────────────┘
//! ```

mod local;
#[cfg(test)]
pub(crate) mod memory;
pub mod types;

pub use local::LocalFs;
pub use types::{DirEntry, EntryMeta, EntryType, FileRecord};

use crate::error::{FsError, FsResult};
use std::io;
use std::path::{Component, Path, PathBuf};

/// Synchronous, fallible filesystem primitives used by the walker
pub trait FilesystemPort: Send + Sync + 'static {
    /// List the immediate children of `dir`
    ///
    /// Children are described by their own metadata; symlinks are not
    /// followed. Fails as a whole when the directory cannot be read.
    fn read_dir(&self, dir: &Path) -> io::Result<Vec<DirEntry>>;

    /// Metadata for `path`, following symlinks
    fn stat(&self, path: &Path) -> io::Result<EntryMeta>;
}

/// Make `path` absolute and lexically clean
///
/// `.` components are dropped and `..` pops the previous component. Symlinks
/// are not resolved. An empty path is the current directory.
pub fn resolve(path: &Path) -> FsResult<PathBuf> {
    let path = if path.as_os_str().is_empty() {
        Path::new(".")
    } else {
        path
    };

    let absolute = std::path::absolute(path).map_err(|source| FsError::ResolveFailed {
        path: path.to_path_buf(),
        source,
    })?;

    let mut clean = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // `/..` stays `/`
                if clean.parent().is_some() {
                    clean.pop();
                }
            }
            other => clean.push(other.as_os_str()),
        }
    }
    Ok(clean)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_is_absolute() {
        let resolved = resolve(Path::new("some/relative")).unwrap();
        assert!(resolved.is_absolute());
        assert!(resolved.ends_with("some/relative"));
    }

    #[cfg(unix)]
    #[test]
    fn test_resolve_cleans_dots() {
        assert_eq!(
            resolve(Path::new("/a/./b/../c")).unwrap(),
            PathBuf::from("/a/c")
        );
        assert_eq!(resolve(Path::new("/../..")).unwrap(), PathBuf::from("/"));
        assert_eq!(resolve(Path::new("/a/b/")).unwrap(), PathBuf::from("/a/b"));
    }

    #[test]
    fn test_resolve_empty_is_current_dir() {
        let cwd = std::env::current_dir().unwrap();
        assert_eq!(resolve(Path::new("")).unwrap(), resolve(&cwd).unwrap());
        assert_eq!(resolve(Path::new("")).unwrap(), resolve(Path::new(".")).unwrap());
    }
}

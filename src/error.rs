//! Error types for parfind
//!
//! This module defines the error hierarchy for:
//! - Root resolution failures (the only fatal condition of a walk)
//! - Filesystem port failures (unreadable directories, unresolvable entries)
//! - Result stream misuse (push after close, consumer gone)
//!
//! Design philosophy:
//! - Use thiserror for structured error types in library code
//! - Only root errors abort a walk; everything else is logged and counted
//! - Preserve error chains for debugging

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for a parfind walk
#[derive(Error, Debug)]
pub enum WalkerError {
    /// The root path could not be resolved or stat'ed
    #[error("Cannot walk '{path}'")]
    Root {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Writing records to the output sink failed
    #[error("Failed to write output")]
    Output(#[source] io::Error),

    /// A background task died before reporting back
    #[error("Task {name} failed: {message}")]
    Task { name: &'static str, message: String },
}

/// Filesystem port and path errors
///
/// The message names the path only; the I/O cause is the error source.
#[derive(Error, Debug)]
pub enum FsError {
    /// Listing a directory failed
    #[error("Failed to read directory '{path}'")]
    ReadDirFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A child's absolute path could not be computed
    #[error("Failed to resolve '{path}'")]
    ResolveFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl FsError {
    /// The underlying I/O error
    pub fn io(&self) -> &io::Error {
        match self {
            FsError::ReadDirFailed { source, .. } | FsError::ResolveFailed { source, .. } => source,
        }
    }

    /// Check if the path simply vanished (common on live filesystems)
    pub fn is_not_found(&self) -> bool {
        self.io().kind() == io::ErrorKind::NotFound
    }

    /// Unwrap the underlying I/O error
    pub fn into_io(self) -> io::Error {
        match self {
            FsError::ReadDirFailed { source, .. } | FsError::ResolveFailed { source, .. } => source,
        }
    }
}

/// Result stream errors
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamError {
    /// A record was pushed after the coordinator closed the stream
    #[error("record pushed after the result stream was closed")]
    Closed,

    /// The consumer dropped its receiver
    #[error("result consumer is gone")]
    ConsumerGone,
}

/// Result type alias for WalkerError
pub type Result<T> = std::result::Result<T, WalkerError>;

/// Result type alias for FsError
pub type FsResult<T> = std::result::Result<T, FsError>;

/// Represents the outcome of visiting a single directory
#[derive(Debug)]
pub enum VisitOutcome {
    /// Directory was listed and every child handled
    Visited {
        path: PathBuf,
        entries: usize,
        subdirs: usize,
    },

    /// Skipped because the walk is shutting down
    Skipped { path: PathBuf },

    /// Listing failed; the subtree contributes nothing
    Failed { path: PathBuf, error: FsError },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fs_error_not_found() {
        let missing = FsError::ReadDirFailed {
            path: "/missing".into(),
            source: io::Error::from(io::ErrorKind::NotFound),
        };
        assert!(missing.is_not_found());

        let denied = FsError::ReadDirFailed {
            path: "/secret".into(),
            source: io::Error::from(io::ErrorKind::PermissionDenied),
        };
        assert!(!denied.is_not_found());
        assert_eq!(denied.into_io().kind(), io::ErrorKind::PermissionDenied);
    }

    #[test]
    fn test_root_error_message_names_path() {
        let err = WalkerError::Root {
            path: "/nope".into(),
            source: io::Error::from(io::ErrorKind::NotFound),
        };
        assert_eq!(err.to_string(), "Cannot walk '/nope'");
    }

    #[test]
    fn test_error_chain_prints_cause_once() {
        let err = anyhow::Error::new(WalkerError::Output(io::Error::other("pipe closed")));
        assert_eq!(format!("{:#}", err), "Failed to write output: pipe closed");

        let err = anyhow::Error::new(FsError::ReadDirFailed {
            path: "/locked".into(),
            source: io::Error::other("denied"),
        });
        assert_eq!(format!("{:#}", err), "Failed to read directory '/locked': denied");
    }
}

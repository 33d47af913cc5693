//! Directory visitor - lists one directory and fans out
//!
//! For each child of the directory the visitor:
//! 1. resolves the absolute path (skipping the child on failure)
//! 2. schedules a recursive visit if the child is a real directory
//! 3. pushes a [`FileRecord`] onto the result stream
//!
//! Scheduling happens before the push and before the visit returns, so the
//! child's task is always accounted for while its parent is still in flight.

use crate::error::{FsError, VisitOutcome};
use crate::fs::{resolve, FileRecord, FilesystemPort};
use crate::walker::stats::WalkStats;
use crate::walker::stream::ResultStream;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task;
use tracing::{debug, error, warn};

/// Something that can register a directory visit
///
/// Implementations must account for the new task before returning.
pub trait TaskScheduler {
    fn schedule(&self, dir: PathBuf);
}

/// Visits directories on behalf of a scheduler
pub struct DirectoryVisitor<'a, S: TaskScheduler + ?Sized> {
    fs: Arc<dyn FilesystemPort>,
    stream: &'a ResultStream,
    scheduler: &'a S,
    stats: &'a WalkStats,
}

impl<'a, S: TaskScheduler + ?Sized> DirectoryVisitor<'a, S> {
    pub fn new(
        fs: Arc<dyn FilesystemPort>,
        stream: &'a ResultStream,
        scheduler: &'a S,
        stats: &'a WalkStats,
    ) -> Self {
        Self {
            fs,
            stream,
            scheduler,
            stats,
        }
    }

    /// Visit `dir`: one listing, then schedule and emit per child
    pub async fn visit(&self, dir: &Path) -> VisitOutcome {
        let entries = match self.list(dir).await {
            Ok(entries) => entries,
            Err(error) => {
                self.stats.record_read_error();
                // Vanishing directories are routine on live filesystems
                if error.is_not_found() {
                    debug!("{}: {}", error, error.io());
                } else {
                    warn!("{}: {}", error, error.io());
                }
                return VisitOutcome::Failed {
                    path: dir.to_path_buf(),
                    error,
                };
            }
        };

        self.stats.record_dir();

        let mut emitted = 0;
        let mut subdirs = 0;

        for entry in entries {
            let path = match resolve(&dir.join(&entry.name)) {
                Ok(path) => path,
                Err(e) => {
                    self.stats.record_resolve_error();
                    warn!("{}: {}", e, e.io());
                    continue;
                }
            };

            if entry.meta.is_traversable_dir() {
                self.scheduler.schedule(path.clone());
                subdirs += 1;
            }

            let record = FileRecord::new(path, &entry.meta);
            let size = record.size;
            match self.stream.push(record).await {
                Ok(()) => {
                    self.stats.record_entry(size);
                    emitted += 1;
                }
                Err(e) => {
                    error!(dir = %dir.display(), error = %e, "Dropping record");
                }
            }
        }

        VisitOutcome::Visited {
            path: dir.to_path_buf(),
            entries: emitted,
            subdirs,
        }
    }

    /// Run the synchronous listing on the blocking pool
    async fn list(&self, dir: &Path) -> Result<Vec<crate::fs::DirEntry>, FsError> {
        let fs = Arc::clone(&self.fs);
        let path = dir.to_path_buf();

        let _reading = self.stats.begin_read();
        let listing = task::spawn_blocking(move || fs.read_dir(&path)).await;

        match listing {
            Ok(result) => result.map_err(|source| FsError::ReadDirFailed {
                path: dir.to_path_buf(),
                source,
            }),
            Err(join_error) => Err(FsError::ReadDirFailed {
                path: dir.to_path_buf(),
                source: std::io::Error::other(join_error.to_string()),
            }),
        }
    }
}

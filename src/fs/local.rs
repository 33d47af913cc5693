//! Local filesystem port backed by `std::fs`

use super::types::{DirEntry, EntryMeta};
use super::FilesystemPort;
use chrono::{DateTime, Utc};
use std::fs::{self, Metadata};
use std::io;
use std::path::Path;
use std::time::UNIX_EPOCH;
use tracing::debug;

/// Reads the filesystem the process is running on
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

impl FilesystemPort for LocalFs {
    fn read_dir(&self, dir: &Path) -> io::Result<Vec<DirEntry>> {
        let mut entries = Vec::new();

        for entry in fs::read_dir(dir)? {
            let entry = entry?;

            // The entry can disappear between the listing and the lstat
            let metadata = match entry.metadata() {
                Ok(metadata) => metadata,
                Err(e) => {
                    debug!(path = %entry.path().display(), error = %e, "Entry vanished during listing");
                    continue;
                }
            };

            entries.push(DirEntry {
                name: entry.file_name(),
                meta: entry_meta(&metadata),
            });
        }

        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    fn stat(&self, path: &Path) -> io::Result<EntryMeta> {
        fs::metadata(path).map(|metadata| entry_meta(&metadata))
    }
}

fn entry_meta(metadata: &Metadata) -> EntryMeta {
    let modified: DateTime<Utc> = metadata.modified().unwrap_or(UNIX_EPOCH).into();

    EntryMeta {
        mode: raw_mode(metadata),
        size: metadata.len(),
        modified,
    }
}

#[cfg(unix)]
fn raw_mode(metadata: &Metadata) -> u32 {
    use std::os::unix::fs::MetadataExt;
    metadata.mode()
}

/// Platforms without mode bits get a synthesized type field
#[cfg(not(unix))]
fn raw_mode(metadata: &Metadata) -> u32 {
    let file_type = metadata.file_type();
    if file_type.is_symlink() {
        0o120000
    } else if file_type.is_dir() {
        0o040000
    } else if file_type.is_file() {
        0o100000
    } else {
        0
    }
}

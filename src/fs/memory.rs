//! In-memory filesystem port for unit tests
//!
//! Paths are plain absolute strings. Reads can be slowed down, made to fail,
//! and are counted so tests can check the admission bound.

use super::types::{DirEntry, EntryMeta};
use super::FilesystemPort;
use chrono::{TimeZone, Utc};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashSet};
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub(crate) const DIR_MODE: u32 = 0o040755;
pub(crate) const FILE_MODE: u32 = 0o100644;
pub(crate) const LINK_MODE: u32 = 0o120777;

#[derive(Default)]
pub(crate) struct MemoryFs {
    nodes: BTreeMap<PathBuf, EntryMeta>,
    failing: HashSet<PathBuf>,
    read_delay: Option<Duration>,
    active_reads: AtomicUsize,
    peak_reads: AtomicUsize,
    reads: Mutex<Vec<PathBuf>>,
}

impl MemoryFs {
    pub(crate) fn new() -> Self {
        let mut fs = Self::default();
        fs.insert("/", DIR_MODE, 0);
        fs
    }

    fn insert(&mut self, path: &str, mode: u32, size: u64) {
        let meta = EntryMeta {
            mode,
            size,
            modified: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
        };
        self.nodes.insert(PathBuf::from(path), meta);
    }

    pub(crate) fn dir(mut self, path: &str) -> Self {
        self.insert(path, DIR_MODE, 4096);
        self
    }

    pub(crate) fn file(mut self, path: &str, size: u64) -> Self {
        self.insert(path, FILE_MODE, size);
        self
    }

    pub(crate) fn symlink(mut self, path: &str) -> Self {
        self.insert(path, LINK_MODE, 1);
        self
    }

    pub(crate) fn node(mut self, path: &str, mode: u32) -> Self {
        self.insert(path, mode, 0);
        self
    }

    /// Make listing `path` fail with permission denied
    pub(crate) fn failing(mut self, path: &str) -> Self {
        self.failing.insert(PathBuf::from(path));
        self
    }

    pub(crate) fn with_read_delay(mut self, delay: Duration) -> Self {
        self.read_delay = Some(delay);
        self
    }

    /// Build a `width`-ary tree of directories `depth` levels deep under
    /// `/tree`, with one file per directory
    pub(crate) fn wide_tree(mut self, width: usize, depth: usize) -> Self {
        fn fill(fs: &mut MemoryFs, base: &str, width: usize, depth: usize) {
            fs.insert(&format!("{base}/file"), FILE_MODE, 1);
            if depth == 0 {
                return;
            }
            for i in 0..width {
                let child = format!("{base}/d{i}");
                fs.insert(&child, DIR_MODE, 4096);
                fill(fs, &child, width, depth - 1);
            }
        }
        self.insert("/tree", DIR_MODE, 4096);
        fill(&mut self, "/tree", width, depth);
        self
    }

    /// Number of nodes at or below `root`, root included
    pub(crate) fn count_under(&self, root: &str) -> usize {
        let root = Path::new(root);
        self.nodes.keys().filter(|p| p.starts_with(root)).count()
    }

    pub(crate) fn peak_reads(&self) -> usize {
        self.peak_reads.load(Ordering::SeqCst)
    }

    pub(crate) fn reads(&self) -> Vec<PathBuf> {
        self.reads.lock().clone()
    }
}

impl FilesystemPort for MemoryFs {
    fn read_dir(&self, dir: &Path) -> io::Result<Vec<DirEntry>> {
        let active = self.active_reads.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_reads.fetch_max(active, Ordering::SeqCst);
        self.reads.lock().push(dir.to_path_buf());

        if let Some(delay) = self.read_delay {
            std::thread::sleep(delay);
        }

        let result = if self.failing.contains(dir) {
            Err(io::Error::from(io::ErrorKind::PermissionDenied))
        } else if self.nodes.get(dir).map(|m| m.is_traversable_dir()) != Some(true) {
            Err(io::Error::from(io::ErrorKind::NotFound))
        } else {
            Ok(self
                .nodes
                .iter()
                .filter(|(path, _)| path.parent() == Some(dir))
                .map(|(path, meta)| DirEntry {
                    name: path.file_name().map(OsString::from).unwrap_or_default(),
                    meta: meta.clone(),
                })
                .collect())
        };

        self.active_reads.fetch_sub(1, Ordering::SeqCst);
        result
    }

    fn stat(&self, path: &Path) -> io::Result<EntryMeta> {
        self.nodes
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::from(io::ErrorKind::NotFound))
    }
}

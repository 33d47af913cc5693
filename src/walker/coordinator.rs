//! Traversal coordinator - bounded fan-out with termination detection
//!
//! The coordinator is responsible for:
//! - Accounting every directory task from the moment it is scheduled
//! - Admitting at most `worker_count` tasks to read at once
//! - Closing the result stream exactly once, when the last task finishes
//!
//! There is no central work queue. Every task spawns its children directly,
//! and the in-flight counter is incremented by the scheduling task *before*
//! the child is spawned. A task decrements only after its visit returned, so
//! the counter can only reach zero once no task exists that could still
//! schedule more work. The task whose decrement moves the counter from 1 to 0
//! is the unique closer of the stream.
//!
//! ```text
//! schedule(dir) ──► in_flight += 1 ──► spawn ──► acquire permit
//!                                                  │
//!                              visit(dir) ◄────────┘
//!                      (schedules children first)
//!                                  │
//!            release permit ◄──────┘
//!                  │
//!            in_flight -= 1 ──► was 1? ──► close result stream
//! ```

use crate::error::VisitOutcome;
use crate::fs::{FileRecord, FilesystemPort};
use crate::walker::stats::WalkStats;
use crate::walker::stream::ResultStream;
use crate::walker::visitor::{DirectoryVisitor, TaskScheduler};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

struct Shared {
    fs: Arc<dyn FilesystemPort>,

    /// Admission permits, one per worker
    admission: Arc<Semaphore>,
    worker_count: usize,

    /// Tasks scheduled but not yet finished
    in_flight: AtomicU64,

    stream: ResultStream,
    stats: Arc<WalkStats>,
    shutdown: Arc<AtomicBool>,

    /// Set once `seed` ran
    seeded: AtomicBool,
}

/// Coordinates the recursive directory fan-out (cheap to clone)
#[derive(Clone)]
pub struct TraversalCoordinator {
    shared: Arc<Shared>,
}

impl TraversalCoordinator {
    /// Create a coordinator admitting `worker_count` concurrent reads
    pub fn new(
        fs: Arc<dyn FilesystemPort>,
        worker_count: usize,
        stream: ResultStream,
        stats: Arc<WalkStats>,
        shutdown: Arc<AtomicBool>,
    ) -> Self {
        let worker_count = worker_count.max(1);
        Self {
            shared: Arc::new(Shared {
                fs,
                admission: Arc::new(Semaphore::new(worker_count)),
                worker_count,
                in_flight: AtomicU64::new(0),
                stream,
                stats,
                shutdown,
                seeded: AtomicBool::new(false),
            }),
        }
    }

    /// Start the traversal at `root`
    ///
    /// Emits the root's own record, then schedules the first task if the
    /// root is a directory. A non-directory root closes the stream right
    /// away. Must be called once, from within a tokio runtime.
    pub async fn seed(&self, root: FileRecord) {
        if self.shared.seeded.swap(true, Ordering::SeqCst) {
            error!(root = %root.path.display(), "Traversal already seeded");
            return;
        }

        info!(root = %root.path.display(), workers = self.worker_count(), "Starting walk");

        let is_dir = root.entry_type.is_dir();
        let path = root.path.clone();
        let size = root.size;

        match self.shared.stream.push(root).await {
            Ok(()) => self.shared.stats.record_entry(size),
            Err(e) => error!(root = %path.display(), error = %e, "Dropping root record"),
        }

        if is_dir {
            self.schedule(path);
        } else {
            // Nothing to list; counted like a failed read of the root
            self.shared.stats.record_read_error();
            warn!(root = %path.display(), "Root is not a directory, nothing to traverse");
            self.close_stream();
        }
    }

    /// Number of admission permits
    pub fn worker_count(&self) -> usize {
        self.shared.worker_count
    }

    /// Tasks scheduled but not yet finished
    pub fn in_flight(&self) -> u64 {
        self.shared.in_flight.load(Ordering::SeqCst)
    }

    /// Whether the walk has drained and the stream is closed
    pub fn is_drained(&self) -> bool {
        self.shared.stream.is_closed()
    }

    async fn run_task(self, dir: PathBuf) {
        // Dropped last: releases the in-flight count even if the visit panics
        let _task = TaskGuard { coordinator: &self };

        let permit = match Arc::clone(&self.shared.admission).acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => {
                error!(dir = %dir.display(), "Admission semaphore closed");
                return;
            }
        };

        let outcome = if self.shared.shutdown.load(Ordering::Relaxed) {
            self.shared.stats.record_skip();
            VisitOutcome::Skipped { path: dir }
        } else {
            DirectoryVisitor::new(
                Arc::clone(&self.shared.fs),
                &self.shared.stream,
                &self,
                &self.shared.stats,
            )
            .visit(&dir)
            .await
        };

        drop(permit);

        match &outcome {
            VisitOutcome::Visited {
                path,
                entries,
                subdirs,
            } => debug!(dir = %path.display(), entries, subdirs, "Directory visited"),
            VisitOutcome::Skipped { path } => debug!(dir = %path.display(), "Directory skipped"),
            VisitOutcome::Failed { path, error } => {
                debug!(dir = %path.display(), error = %error, "Directory failed")
            }
        }
    }

    /// Account for a finished task; the last one closes the stream
    fn finish_task(&self) {
        self.shared.stats.record_finished();
        if self.shared.in_flight.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.close_stream();
        }
    }

    fn close_stream(&self) {
        if self.shared.stream.close() {
            let stats = self.shared.stats.snapshot();
            info!(
                dirs = stats.dirs,
                entries = stats.entries,
                errors = stats.errors(),
                "Walk drained"
            );
        } else {
            error!("Result stream closed twice");
        }
    }
}

impl TaskScheduler for TraversalCoordinator {
    /// Register a visit of `dir`
    ///
    /// The in-flight counter is bumped here, on the caller's task, before
    /// the new task exists.
    fn schedule(&self, dir: PathBuf) {
        self.shared.in_flight.fetch_add(1, Ordering::AcqRel);
        self.shared.stats.record_scheduled();

        let coordinator = self.clone();
        tokio::spawn(coordinator.run_task(dir));
    }
}

struct TaskGuard<'a> {
    coordinator: &'a TraversalCoordinator,
}

impl Drop for TaskGuard<'_> {
    fn drop(&mut self) {
        self.coordinator.finish_task();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::memory::MemoryFs;
    use crate::fs::EntryType;
    use crate::walker::stream::{result_stream, RecordReceiver};
    use std::collections::HashSet;
    use std::path::Path;
    use std::time::Duration;

    struct Harness {
        coordinator: TraversalCoordinator,
        receiver: RecordReceiver,
        stats: Arc<WalkStats>,
        shutdown: Arc<AtomicBool>,
    }

    fn harness(fs: Arc<dyn FilesystemPort>, workers: usize, capacity: usize) -> Harness {
        let (stream, receiver) = result_stream(capacity);
        let stats = Arc::new(WalkStats::default());
        let shutdown = Arc::new(AtomicBool::new(false));
        let coordinator =
            TraversalCoordinator::new(fs, workers, stream, Arc::clone(&stats), Arc::clone(&shutdown));
        Harness {
            coordinator,
            receiver,
            stats,
            shutdown,
        }
    }

    async fn root_record(fs: &dyn FilesystemPort, root: &str) -> FileRecord {
        let meta = fs.stat(Path::new(root)).unwrap();
        FileRecord::new(PathBuf::from(root), &meta)
    }

    async fn drain(receiver: &mut RecordReceiver) -> Vec<FileRecord> {
        let mut records = Vec::new();
        while let Some(record) = receiver.recv().await {
            records.push(record);
        }
        records
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_walk_emits_every_entry_once() {
        let memory = Arc::new(MemoryFs::new().wide_tree(3, 3));
        let expected = memory.count_under("/tree");
        let fs: Arc<dyn FilesystemPort> = memory;

        let mut h = harness(Arc::clone(&fs), 4, 4);
        h.coordinator.seed(root_record(fs.as_ref(), "/tree").await).await;
        let records = drain(&mut h.receiver).await;

        assert_eq!(records.len(), expected);
        let unique: HashSet<_> = records.iter().map(|r| r.path.clone()).collect();
        assert_eq!(unique.len(), expected);

        assert!(h.coordinator.is_drained());
        assert_eq!(h.coordinator.in_flight(), 0);
        assert_eq!(h.stats.snapshot().in_flight, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_termination_is_stable_across_runs() {
        for workers in [1, 2, 7, 128] {
            let memory = Arc::new(MemoryFs::new().wide_tree(4, 2));
            let expected = memory.count_under("/tree");
            let fs: Arc<dyn FilesystemPort> = memory;

            let mut h = harness(Arc::clone(&fs), workers, workers);
            h.coordinator.seed(root_record(fs.as_ref(), "/tree").await).await;
            let records = tokio::time::timeout(Duration::from_secs(10), drain(&mut h.receiver))
                .await
                .expect("walk did not terminate");
            assert_eq!(records.len(), expected, "workers = {workers}");
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_admission_bounds_concurrent_reads() {
        let memory = Arc::new(
            MemoryFs::new()
                .wide_tree(6, 2)
                .with_read_delay(Duration::from_millis(5)),
        );
        let fs: Arc<dyn FilesystemPort> = Arc::clone(&memory) as Arc<dyn FilesystemPort>;

        let mut h = harness(Arc::clone(&fs), 3, 8);
        h.coordinator.seed(root_record(fs.as_ref(), "/tree").await).await;
        drain(&mut h.receiver).await;

        assert!(memory.peak_reads() <= 3, "peak = {}", memory.peak_reads());
        assert!(h.stats.peak_reads() <= 3);
        assert!(memory.peak_reads() >= 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_failed_directory_does_not_leak_in_flight() {
        let memory = Arc::new(
            MemoryFs::new()
                .dir("/r")
                .dir("/r/ok")
                .file("/r/ok/f", 1)
                .dir("/r/locked")
                .file("/r/locked/hidden", 1)
                .failing("/r/locked"),
        );
        let fs: Arc<dyn FilesystemPort> = memory;

        let mut h = harness(Arc::clone(&fs), 2, 2);
        h.coordinator.seed(root_record(fs.as_ref(), "/r").await).await;
        let paths: HashSet<_> = drain(&mut h.receiver)
            .await
            .into_iter()
            .map(|r| r.path)
            .collect();

        let expected: HashSet<_> = ["/r", "/r/ok", "/r/ok/f", "/r/locked"]
            .iter()
            .map(PathBuf::from)
            .collect();
        assert_eq!(paths, expected);
        assert_eq!(h.stats.snapshot().read_errors, 1);
        assert_eq!(h.coordinator.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_symlink_dir_yields_one_record() {
        let memory = Arc::new(
            MemoryFs::new()
                .dir("/r")
                .dir("/r/a")
                .file("/r/a/f.txt", 10)
                .symlink("/r/b"),
        );
        let fs: Arc<dyn FilesystemPort> = Arc::clone(&memory) as Arc<dyn FilesystemPort>;

        let mut h = harness(Arc::clone(&fs), 16, 16);
        h.coordinator.seed(root_record(fs.as_ref(), "/r").await).await;
        let records = drain(&mut h.receiver).await;

        assert_eq!(records.len(), 4);
        let link = records.iter().find(|r| r.path == Path::new("/r/b")).unwrap();
        assert_eq!(link.entry_type, EntryType::Symlink);
        assert_eq!(memory.reads(), vec![PathBuf::from("/r"), PathBuf::from("/r/a")]);
    }

    #[tokio::test]
    async fn test_non_directory_root_closes_immediately() {
        let fs: Arc<dyn FilesystemPort> = Arc::new(MemoryFs::new().file("/file", 5));

        let mut h = harness(Arc::clone(&fs), 4, 4);
        h.coordinator.seed(root_record(fs.as_ref(), "/file").await).await;
        let records = drain(&mut h.receiver).await;

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].entry_type, EntryType::File);
        assert_eq!(h.stats.snapshot().dirs, 0);
        assert_eq!(h.stats.snapshot().read_errors, 1);
        assert_eq!(h.stats.tasks_scheduled.load(Ordering::Relaxed), 0);
    }

    #[tokio::test]
    async fn test_second_seed_is_ignored() {
        let fs: Arc<dyn FilesystemPort> = Arc::new(MemoryFs::new().file("/file", 5));

        let mut h = harness(Arc::clone(&fs), 4, 4);
        let root = root_record(fs.as_ref(), "/file").await;
        h.coordinator.seed(root.clone()).await;
        h.coordinator.seed(root).await;

        assert_eq!(drain(&mut h.receiver).await.len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_shutdown_skips_pending_directories() {
        let memory = Arc::new(MemoryFs::new().wide_tree(3, 3));
        let fs: Arc<dyn FilesystemPort> = memory;

        let mut h = harness(Arc::clone(&fs), 2, 2);
        h.shutdown.store(true, Ordering::SeqCst);
        h.coordinator.seed(root_record(fs.as_ref(), "/tree").await).await;
        let records = tokio::time::timeout(Duration::from_secs(10), drain(&mut h.receiver))
            .await
            .expect("cancelled walk did not terminate");

        // Only the root record; its own listing was skipped
        assert_eq!(records.len(), 1);
        assert_eq!(h.stats.snapshot().skipped, 1);
        assert!(h.coordinator.is_drained());
    }

    /// Port whose listings always panic
    struct PanickingFs(MemoryFs);

    impl FilesystemPort for PanickingFs {
        fn read_dir(&self, dir: &Path) -> std::io::Result<Vec<crate::fs::DirEntry>> {
            panic!("listing {} blew up", dir.display());
        }

        fn stat(&self, path: &Path) -> std::io::Result<crate::fs::EntryMeta> {
            self.0.stat(path)
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_panicking_listing_releases_accounting() {
        let fs: Arc<dyn FilesystemPort> =
            Arc::new(PanickingFs(MemoryFs::new().dir("/r").file("/r/f", 1)));

        let mut h = harness(Arc::clone(&fs), 2, 2);
        h.coordinator.seed(root_record(fs.as_ref(), "/r").await).await;
        let records = tokio::time::timeout(Duration::from_secs(10), drain(&mut h.receiver))
            .await
            .expect("walk hung after a panicking listing");

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].path, PathBuf::from("/r"));
        assert_eq!(h.stats.snapshot().read_errors, 1);
        assert_eq!(h.coordinator.in_flight(), 0);
        assert!(h.coordinator.is_drained());
    }
}

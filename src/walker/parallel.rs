//! Parallel walker - wires the pieces of one walk together
//!
//! A walk resolves and stats the root, starts the output consumer, seeds the
//! coordinator and then waits for the consumer to report that the result
//! stream was drained. Only a bad root fails the walk before it starts.

use crate::config::WalkConfig;
use crate::error::{Result, WalkerError};
use crate::fs::{resolve, EntryMeta, FileRecord, FilesystemPort, LocalFs};
use crate::output::OutputConsumer;
use crate::walker::coordinator::TraversalCoordinator;
use crate::walker::stats::{WalkProgress, WalkStats};
use crate::walker::stream::result_stream;
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

/// Final statistics of a walk
#[derive(Debug, Clone, Default)]
pub struct WalkResult {
    /// Records written to the sink
    pub entries_written: u64,

    /// Directories successfully listed
    pub dirs: u64,

    /// Sum of emitted entry sizes
    pub bytes: u64,

    /// Unreadable directories plus unresolvable entries
    pub errors: u64,

    /// Directories skipped after shutdown was requested
    pub skipped: u64,

    /// Highest number of directory reads running at once
    pub peak_reads: usize,

    pub duration: Duration,

    /// False if the walk was cancelled
    pub completed: bool,
}

/// Walks a tree with bounded parallelism and writes one record per entry
pub struct ParallelWalker {
    config: WalkConfig,
    fs: Arc<dyn FilesystemPort>,
    shutdown: Arc<AtomicBool>,
    stats: Arc<WalkStats>,
}

impl ParallelWalker {
    /// Walker over the local filesystem
    pub fn new(config: WalkConfig) -> Self {
        Self::with_filesystem(config, Arc::new(LocalFs))
    }

    /// Walker over an arbitrary filesystem port
    pub fn with_filesystem(config: WalkConfig, fs: Arc<dyn FilesystemPort>) -> Self {
        Self {
            config,
            fs,
            shutdown: Arc::new(AtomicBool::new(false)),
            stats: Arc::new(WalkStats::default()),
        }
    }

    /// Flag that cancels the walk once set
    pub fn shutdown_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    /// Live counters of this walker's walk
    pub fn stats(&self) -> Arc<WalkStats> {
        Arc::clone(&self.stats)
    }

    /// Walk the configured root, writing records to `sink`
    ///
    /// Returns once every scheduled directory has finished and the sink has
    /// been flushed. A walker runs once; its counters and shutdown flag
    /// belong to that single walk.
    pub async fn run<W: Write + Send + 'static>(self, sink: W) -> Result<WalkResult> {
        let start = Instant::now();
        let (root, meta) = self.stat_root()?;

        let (stream, receiver) = result_stream(self.config.stream_capacity);
        let consumer = OutputConsumer::new(sink, self.config.output_format)
            .with_cancel(Arc::clone(&self.shutdown))
            .spawn(receiver);

        let coordinator = TraversalCoordinator::new(
            Arc::clone(&self.fs),
            self.config.worker_count,
            stream,
            Arc::clone(&self.stats),
            Arc::clone(&self.shutdown),
        );
        coordinator.seed(FileRecord::new(root, &meta)).await;

        let output = consumer.await.map_err(|e| WalkerError::Task {
            name: "output",
            message: e.to_string(),
        })?;
        if let Some(e) = output.error {
            return Err(WalkerError::Output(e));
        }

        let snapshot = self.stats.snapshot();
        let result = WalkResult {
            entries_written: output.written,
            dirs: snapshot.dirs,
            bytes: snapshot.bytes,
            errors: snapshot.errors(),
            skipped: snapshot.skipped,
            peak_reads: snapshot.peak_reads,
            duration: start.elapsed(),
            completed: !self.shutdown.load(Ordering::Relaxed),
        };

        info!(
            entries = result.entries_written,
            dirs = result.dirs,
            errors = result.errors,
            completed = result.completed,
            "Walk finished in {:.2?}",
            result.duration
        );

        Ok(result)
    }

    /// Like [`run`](Self::run), calling `progress_callback` every 100ms
    pub async fn run_with_progress<W, F>(self, sink: W, progress_callback: F) -> Result<WalkResult>
    where
        W: Write + Send + 'static,
        F: Fn(WalkProgress) + Send + 'static,
    {
        let start = Instant::now();
        let done = Arc::new(AtomicBool::new(false));

        let ticker = {
            let done = Arc::clone(&done);
            let stats = Arc::clone(&self.stats);
            let total_workers = self.config.worker_count;

            tokio::spawn(async move {
                let mut interval = tokio::time::interval(Duration::from_millis(100));
                loop {
                    interval.tick().await;
                    if done.load(Ordering::Relaxed) {
                        break;
                    }
                    progress_callback(WalkProgress::from_stats(&stats, total_workers, start.elapsed()));
                }
            })
        };

        let result = self.run(sink).await;

        done.store(true, Ordering::SeqCst);
        let _ = ticker.await;

        result
    }

    /// Resolve the root and stat it, following symlinks
    fn stat_root(&self) -> Result<(PathBuf, EntryMeta)> {
        let root = resolve(&self.config.root).map_err(|e| WalkerError::Root {
            path: self.config.root.clone(),
            source: e.into_io(),
        })?;

        let meta = self.fs.stat(&root).map_err(|source| WalkerError::Root {
            path: root.clone(),
            source,
        })?;

        Ok((root, meta))
    }
}

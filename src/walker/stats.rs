//! Live walk counters and progress snapshots

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

/// Statistics collected during the walk
#[derive(Debug, Default)]
pub struct WalkStats {
    pub tasks_scheduled: AtomicU64,
    pub tasks_finished: AtomicU64,
    pub dirs_read: AtomicU64,
    pub entries: AtomicU64,
    pub bytes: AtomicU64,
    pub read_errors: AtomicU64,
    pub resolve_errors: AtomicU64,
    pub skipped: AtomicU64,
    active_reads: AtomicUsize,
    peak_reads: AtomicUsize,
}

impl WalkStats {
    pub fn record_scheduled(&self) {
        self.tasks_scheduled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_finished(&self) {
        self.tasks_finished.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dir(&self) {
        self.dirs_read.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_entry(&self, size: u64) {
        self.entries.fetch_add(1, Ordering::Relaxed);
        self.bytes.fetch_add(size, Ordering::Relaxed);
    }

    pub fn record_read_error(&self) {
        self.read_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_resolve_error(&self) {
        self.resolve_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_skip(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }

    /// Mark a directory read as running until the guard drops
    pub fn begin_read(&self) -> ReadGuard<'_> {
        let active = self.active_reads.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_reads.fetch_max(active, Ordering::SeqCst);
        ReadGuard { stats: self }
    }

    /// Reads running right now
    pub fn active_reads(&self) -> usize {
        self.active_reads.load(Ordering::SeqCst)
    }

    /// Highest number of reads ever running at once
    pub fn peak_reads(&self) -> usize {
        self.peak_reads.load(Ordering::SeqCst)
    }

    /// Point-in-time copy of the counters
    pub fn snapshot(&self) -> StatsSnapshot {
        let scheduled = self.tasks_scheduled.load(Ordering::Relaxed);
        let finished = self.tasks_finished.load(Ordering::Relaxed);

        StatsSnapshot {
            dirs: self.dirs_read.load(Ordering::Relaxed),
            entries: self.entries.load(Ordering::Relaxed),
            bytes: self.bytes.load(Ordering::Relaxed),
            read_errors: self.read_errors.load(Ordering::Relaxed),
            resolve_errors: self.resolve_errors.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            in_flight: scheduled.saturating_sub(finished),
            active_reads: self.active_reads(),
            peak_reads: self.peak_reads(),
        }
    }
}

/// RAII guard for an active directory read
pub struct ReadGuard<'a> {
    stats: &'a WalkStats,
}

impl Drop for ReadGuard<'_> {
    fn drop(&mut self) {
        self.stats.active_reads.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Copy of [`WalkStats`] at one moment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub dirs: u64,
    pub entries: u64,
    pub bytes: u64,
    pub read_errors: u64,
    pub resolve_errors: u64,
    pub skipped: u64,
    pub in_flight: u64,
    pub active_reads: usize,
    pub peak_reads: usize,
}

impl StatsSnapshot {
    /// All non-fatal errors
    pub fn errors(&self) -> u64 {
        self.read_errors + self.resolve_errors
    }
}

/// Progress information for display
#[derive(Debug, Clone, Default)]
pub struct WalkProgress {
    pub stats: StatsSnapshot,
    pub total_workers: usize,
    pub elapsed: Duration,
}

impl WalkProgress {
    /// Snapshot `stats` for a walk with `total_workers` admission slots
    pub fn from_stats(stats: &WalkStats, total_workers: usize, elapsed: Duration) -> Self {
        Self {
            stats: stats.snapshot(),
            total_workers,
            elapsed,
        }
    }

    /// Calculate entries per second rate
    pub fn entries_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.stats.entries as f64 / secs
        } else {
            0.0
        }
    }
}

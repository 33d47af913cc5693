//! Progress reporting for the walker
//!
//! Everything here writes to stderr; stdout carries only records.

use crate::walker::{WalkProgress, WalkResult};
use console::style;
use humansize::{format_size, BINARY};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::Duration;

/// Spinner showing live walk counters
pub struct ProgressReporter {
    bar: ProgressBar,
}

impl ProgressReporter {
    pub fn new() -> Self {
        let bar = ProgressBar::with_draw_target(None, ProgressDrawTarget::stderr());

        if let Ok(spinner) = ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}") {
            bar.set_style(spinner.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
        }

        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    /// Update the progress display
    pub fn update(&self, progress: &WalkProgress) {
        let stats = &progress.stats;

        let msg = format!(
            "Dirs: {} | Entries: {} | Size: {} | Rate: {:.0}/s | In-flight: {} | Workers: {}/{}",
            format_number(stats.dirs),
            format_number(stats.entries),
            format_size(stats.bytes, BINARY),
            progress.entries_per_second(),
            format_number(stats.in_flight),
            stats.active_reads,
            progress.total_workers,
        );

        self.bar.set_message(msg);
    }

    pub fn set_status(&self, status: &str) {
        self.bar.set_message(status.to_string());
    }

    /// Finish the progress display with a final message
    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }

    pub fn finish_and_clear(&self) {
        self.bar.finish_and_clear();
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

/// Format a number with thousands separators
pub fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut out = String::with_capacity(s.len() + s.len() / 3);

    for (i, c) in s.chars().enumerate() {
        if i > 0 && (s.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Print a summary of the walk to stderr
pub fn print_summary(result: &WalkResult, workers: usize) {
    let secs = result.duration.as_secs_f64();
    let rate = if secs > 0.0 {
        result.entries_written as f64 / secs
    } else {
        0.0
    };

    let title = if result.completed {
        style("Walk Complete").green().bold()
    } else {
        style("Walk Interrupted").yellow().bold()
    };

    eprintln!();
    eprintln!("{}", title);
    eprintln!("{}", style("─".repeat(50)).dim());
    eprintln!("  {} {}", style("Directories:").bold(), format_number(result.dirs));
    eprintln!("  {} {}", style("Entries:").bold(), format_number(result.entries_written));
    eprintln!("  {} {}", style("Total Size:").bold(), format_size(result.bytes, BINARY));
    eprintln!(
        "  {} {:.1}s ({:.0} entries/sec)",
        style("Duration:").bold(),
        secs,
        rate
    );
    eprintln!(
        "  {} {} (peak {} concurrent reads)",
        style("Workers:").bold(),
        workers,
        result.peak_reads
    );
    if result.errors > 0 {
        eprintln!(
            "  {} {}",
            style("Errors:").yellow().bold(),
            format_number(result.errors)
        );
    }
    if result.skipped > 0 {
        eprintln!(
            "  {} {}",
            style("Skipped:").yellow().bold(),
            format_number(result.skipped)
        );
    }
    eprintln!();
}

/// Print a header at the start of the walk to stderr
pub fn print_header(root: &str, workers: usize) {
    eprintln!();
    eprintln!("{} {}", style("parfind").cyan().bold(), env!("CARGO_PKG_VERSION"));
    eprintln!("{}", style("─".repeat(50)).dim());
    eprintln!("  {} {}", style("Root:").bold(), root);
    eprintln!("  {} {}", style("Workers:").bold(), workers);
    eprintln!();
}

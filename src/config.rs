//! Configuration types for parfind
//!
//! This module defines:
//! - CLI argument parsing using clap derive macros
//! - Runtime configuration with worker-count normalization

use clap::Parser;
use std::path::PathBuf;

/// Version string printed by `--version`
pub const VERSION: &str = concat!(
    "parfind-",
    env!("CARGO_PKG_VERSION_MAJOR"),
    ".",
    env!("CARGO_PKG_VERSION_MINOR")
);

/// Upper bound on concurrently scanned directories
pub const MAX_WORKERS: usize = 128;

/// Worker count used when the requested one is not positive
pub const DEFAULT_WORKERS: usize = 16;

/// A parallel, simplified version of find(1)
#[derive(Parser, Debug, Clone)]
#[command(
    name = "parfind",
    about = "A parallel, simplified version of find(1)",
    long_about = "Recursively lists every entry below a root directory, scanning up to \
                  --workers directories concurrently.\n\n\
                  Each record is '<type> <mtime> <size> <quoted path>'. Type is one of \
                  d (directory), f (file), l (symlink), s (socket), p (pipe), \
                  C (char device), D (block device), u (unknown).",
    after_help = "EXAMPLES:\n    \
        parfind --root /data\n    \
        parfind --root /data --workers 64\n    \
        parfind --root /data --print0 | xargs -0 -n 4 echo",
    disable_version_flag = true
)]
pub struct CliArgs {
    /// The directory to start scanning from
    #[arg(long, default_value = ".", value_name = "PATH")]
    pub root: PathBuf,

    /// How many directories to scan concurrently
    #[arg(
        long,
        default_value_t = DEFAULT_WORKERS as i64,
        allow_negative_numbers = true,
        value_name = "NUM"
    )]
    pub workers: i64,

    /// Show version information
    #[arg(long)]
    pub version: bool,

    /// Use NUL as field and record separator (for use with xargs -0)
    #[arg(long)]
    pub print0: bool,

    /// Verbose output (debug logging on stderr)
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Show a progress spinner and a final summary on stderr
    #[arg(short = 'p', long)]
    pub progress: bool,
}

/// Record layout written by the output consumer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// `<type> <mtime> <size> "<escaped path>"\n`
    #[default]
    Human,
    /// NUL-separated fields and records, raw path bytes
    Print0,
}

/// Clamp a requested worker count into `[1, MAX_WORKERS]`
///
/// Non-positive requests fall back to [`DEFAULT_WORKERS`], oversized ones
/// are capped at [`MAX_WORKERS`].
pub fn normalize_workers(requested: i64) -> usize {
    if requested < 1 {
        DEFAULT_WORKERS
    } else {
        usize::try_from(requested).map_or(MAX_WORKERS, |n| n.min(MAX_WORKERS))
    }
}

/// Validated runtime configuration
#[derive(Debug, Clone)]
pub struct WalkConfig {
    /// Where the walk starts (resolved when the walk begins)
    pub root: PathBuf,

    /// Admission bound for concurrent directory reads
    pub worker_count: usize,

    /// Capacity of the result stream
    pub stream_capacity: usize,

    /// Record layout
    pub output_format: OutputFormat,

    /// Show progress indicator
    pub show_progress: bool,

    /// Verbose logging
    pub verbose: bool,
}

impl WalkConfig {
    /// Configuration for walking `root` with a requested worker count
    pub fn new(root: impl Into<PathBuf>, workers: i64) -> Self {
        let worker_count = normalize_workers(workers);
        Self {
            root: root.into(),
            worker_count,
            stream_capacity: worker_count,
            output_format: OutputFormat::Human,
            show_progress: false,
            verbose: false,
        }
    }

    /// Switch the record layout
    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.output_format = format;
        self
    }

    /// Create configuration from CLI arguments
    pub fn from_args(args: CliArgs) -> Self {
        let format = if args.print0 {
            OutputFormat::Print0
        } else {
            OutputFormat::Human
        };

        let mut config = Self::new(args.root, args.workers).with_format(format);
        config.show_progress = args.progress;
        config.verbose = args.verbose;
        config
    }
}

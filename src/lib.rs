//! parfind - a parallel, simplified find(1)
//!
//! Recursively lists every entry below a root directory, one record per
//! entry, scanning up to a configurable number of directories at once.
//!
//! # Features
//!
//! - **Bounded Parallelism**: one task per directory, at most `workers`
//!   of them reading at the same time.
//!
//! - **Backpressure**: records flow through a bounded stream, so a slow
//!   consumer throttles the walk instead of growing memory.
//!
//! - **Exact Termination**: an in-flight counter closes the stream once the
//!   last directory task finishes. No polling, no timeouts.
//!
//! - **Pipe Friendly**: quoted human output or NUL-separated output for
//!   `xargs -0`.
//!
//! # Architecture
//!
//! ```text
//!        --root
//!          │ resolve + stat
//!          ▼
//! ┌──────────────────────────────────────────────────────┐
//! │               TraversalCoordinator                    │
//! │  ┌────────┐  ┌────────┐  ┌────────┐       ┌────────┐ │
//! │  │ Task 1 │  │ Task 2 │  │ Task 3 │  ...  │ Task N │ │
//! │  └───┬────┘  └───┬────┘  └───┬────┘       └───┬────┘ │
//! │      │  read_dir via FilesystemPort           │      │
//! │      └───────────┴─────┬─────┴────────────────┘      │
//! │                        ▼                             │
//! │              ┌───────────────────┐                   │
//! │              │   ResultStream    │                   │
//! │              │ (capacity=workers)│                   │
//! │              └─────────┬─────────┘                   │
//! └────────────────────────┼─────────────────────────────┘
//!                          ▼
//!                ┌───────────────────┐
//!                │  OutputConsumer   │──► stdout
//!                └───────────────────┘
//! ```
//!
//! # Example
//!
//! ```bash
//! # Walk the current directory
//! parfind
//!
//! # Wide trees on slow storage
//! parfind --root /mnt/archive --workers 64 -p
//!
//! # Feed another tool
//! parfind --root /data --print0 | xargs -0 -n 4 echo
//! ```

pub mod config;
pub mod error;
pub mod fs;
pub mod output;
pub mod progress;
pub mod walker;

pub use config::{CliArgs, OutputFormat, WalkConfig};
pub use error::{Result, WalkerError};
pub use fs::{EntryType, FileRecord, FilesystemPort, LocalFs};
pub use walker::{ParallelWalker, WalkResult};

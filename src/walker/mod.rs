//! Parallel directory walker
//!
//! One lightweight task per directory, admitted by a semaphore, feeding a
//! single bounded result stream.
//!
//! # Architecture
//!
//! ```text
//!                     ┌─────────────────────────┐
//!                     │  TraversalCoordinator   │
//!                     │  - in-flight counter    │
//!                     │  - admission semaphore  │
//!                     └───────────┬─────────────┘
//!                                 │ schedule(dir)
//!       ┌─────────────────────────┼─────────────────────────┐
//!       │                         │                         │
//! ┌─────▼─────┐             ┌─────▼─────┐             ┌─────▼─────┐
//! │  Task 1   │             │  Task 2   │             │  Task N   │
//! │  Visitor  │             │  Visitor  │             │  Visitor  │
//! └─────┬─────┘             └─────┬─────┘             └─────┬─────┘
//!       └─────────────────────────┼─────────────────────────┘
//!                                 ▼
//!                     ┌─────────────────────────┐
//!                     │  ResultStream (bounded) │
//!                     └───────────┬─────────────┘
//!                                 ▼
//!                     ┌─────────────────────────┐
//!                     │     OutputConsumer      │
//!                     └─────────────────────────┘
//! ```

pub mod coordinator;
pub mod parallel;
pub mod stats;
pub mod stream;
pub mod visitor;

pub use coordinator::TraversalCoordinator;
pub use parallel::{ParallelWalker, WalkResult};
pub use stats::{StatsSnapshot, WalkProgress, WalkStats};
pub use stream::{result_stream, RecordReceiver, ResultStream, StreamStats};
pub use visitor::{DirectoryVisitor, TaskScheduler};

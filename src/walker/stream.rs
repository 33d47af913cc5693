//! Result stream with backpressure support
//!
//! A bounded channel carrying [`FileRecord`]s from every visitor task to
//! the single output consumer. Producers wait when the stream is full,
//! which throttles the walk to the speed of the output.
//!
//! The stream has exactly one closer. The master sender lives behind a
//! mutex; pushes clone it for the duration of a send, and [`ResultStream::close`]
//! takes it out. Once no push is in progress the channel is closed and the
//! consumer sees the end of the stream after draining what is buffered.

use crate::error::StreamError;
use crate::fs::FileRecord;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Statistics for the result stream
#[derive(Debug, Default)]
pub struct StreamStats {
    /// Records accepted by the stream
    pub pushed: AtomicU64,

    /// Records handed to the consumer
    pub received: AtomicU64,

    /// Pushes that found the stream full and had to wait
    pub backpressure_events: AtomicU64,
}

impl StreamStats {
    /// Get number of records pushed
    pub fn pushed(&self) -> u64 {
        self.pushed.load(Ordering::Relaxed)
    }

    /// Get number of records received
    pub fn received(&self) -> u64 {
        self.received.load(Ordering::Relaxed)
    }

    /// Get backpressure event count
    pub fn backpressure_count(&self) -> u64 {
        self.backpressure_events.load(Ordering::Relaxed)
    }
}

/// Create a result stream and its receiving end
pub fn result_stream(capacity: usize) -> (ResultStream, RecordReceiver) {
    let (sender, receiver) = mpsc::channel(capacity.max(1));
    let stats = Arc::new(StreamStats::default());

    let stream = ResultStream {
        sender: Arc::new(Mutex::new(Some(sender))),
        stats: Arc::clone(&stats),
    };
    let receiver = RecordReceiver { receiver, stats };

    (stream, receiver)
}

/// Producer side of the result stream (clone for each task)
#[derive(Clone)]
pub struct ResultStream {
    sender: Arc<Mutex<Option<mpsc::Sender<FileRecord>>>>,
    stats: Arc<StreamStats>,
}

impl ResultStream {
    /// Push a record, waiting while the stream is full
    ///
    /// Fails with [`StreamError::Closed`] if the stream was already closed.
    pub async fn push(&self, record: FileRecord) -> Result<(), StreamError> {
        let sender = self.sender.lock().clone().ok_or(StreamError::Closed)?;

        let result = match sender.try_send(record) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(record)) => {
                self.stats.backpressure_events.fetch_add(1, Ordering::Relaxed);
                sender.send(record).await.map_err(|_| StreamError::ConsumerGone)
            }
            Err(mpsc::error::TrySendError::Closed(_)) => Err(StreamError::ConsumerGone),
        };

        if result.is_ok() {
            self.stats.pushed.fetch_add(1, Ordering::Relaxed);
        }
        result
    }

    /// Close the stream
    ///
    /// Returns `false` if it was already closed.
    pub fn close(&self) -> bool {
        self.sender.lock().take().is_some()
    }

    /// Check if the stream has been closed
    pub fn is_closed(&self) -> bool {
        self.sender.lock().is_none()
    }

    /// Get stream statistics
    pub fn stats(&self) -> Arc<StreamStats> {
        Arc::clone(&self.stats)
    }
}

/// Consumer side of the result stream
pub struct RecordReceiver {
    receiver: mpsc::Receiver<FileRecord>,
    stats: Arc<StreamStats>,
}

impl RecordReceiver {
    /// Receive the next record, `None` once closed and drained
    pub async fn recv(&mut self) -> Option<FileRecord> {
        let record = self.receiver.recv().await;
        if record.is_some() {
            self.stats.received.fetch_add(1, Ordering::Relaxed);
        }
        record
    }

    /// Blocking variant for use on a dedicated thread
    ///
    /// Panics if called from within an async context.
    pub fn blocking_recv(&mut self) -> Option<FileRecord> {
        let record = self.receiver.blocking_recv();
        if record.is_some() {
            self.stats.received.fetch_add(1, Ordering::Relaxed);
        }
        record
    }

    /// Get current number of buffered records
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    /// Check if nothing is buffered
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::EntryMeta;
    use chrono::{TimeZone, Utc};
    use std::time::Duration;

    fn record(path: &str) -> FileRecord {
        let meta = EntryMeta {
            mode: 0o100644,
            size: 1,
            modified: Utc.timestamp_opt(0, 0).unwrap(),
        };
        FileRecord::new(path.into(), &meta)
    }

    #[tokio::test]
    async fn test_stream_basic() {
        let (stream, mut receiver) = result_stream(4);

        stream.push(record("/a")).await.unwrap();
        stream.push(record("/b")).await.unwrap();
        assert_eq!(receiver.len(), 2);

        assert!(stream.close());
        assert!(stream.is_closed());

        // Buffered records survive the close
        assert_eq!(receiver.recv().await.unwrap().path, std::path::PathBuf::from("/a"));
        assert_eq!(receiver.recv().await.unwrap().path, std::path::PathBuf::from("/b"));
        assert!(receiver.recv().await.is_none());

        let stats = stream.stats();
        assert_eq!(stats.pushed(), 2);
        assert_eq!(stats.received(), 2);
    }

    #[tokio::test]
    async fn test_push_after_close_fails() {
        let (stream, _receiver) = result_stream(4);
        assert!(stream.close());
        assert!(!stream.close());
        assert_eq!(stream.push(record("/late")).await, Err(StreamError::Closed));
    }

    #[tokio::test]
    async fn test_push_without_consumer_fails() {
        let (stream, receiver) = result_stream(4);
        drop(receiver);
        assert_eq!(stream.push(record("/a")).await, Err(StreamError::ConsumerGone));
    }

    #[tokio::test]
    async fn test_stream_backpressure() {
        let (stream, mut receiver) = result_stream(1);
        stream.push(record("/a")).await.unwrap();

        // Full: the second push waits until the consumer makes room
        let blocked = tokio::time::timeout(Duration::from_millis(50), stream.push(record("/b"))).await;
        assert!(blocked.is_err());

        let producer = {
            let stream = stream.clone();
            tokio::spawn(async move { stream.push(record("/c")).await })
        };
        assert!(receiver.recv().await.is_some());
        producer.await.unwrap().unwrap();

        assert!(stream.stats().backpressure_count() >= 1);
    }

    #[tokio::test]
    async fn test_clones_share_close() {
        let (stream, mut receiver) = result_stream(2);
        let other = stream.clone();
        other.push(record("/a")).await.unwrap();
        assert!(stream.close());
        assert!(other.is_closed());
        assert!(receiver.recv().await.is_some());
        assert!(receiver.recv().await.is_none());
    }
}

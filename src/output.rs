//! Output consumer and record formatting
//!
//! The consumer runs on a dedicated blocking thread, drains the result
//! stream until it is closed, and writes each record through a buffered
//! writer. Its join handle is the one-shot completion signal of a walk.

use crate::config::OutputFormat;
use crate::fs::FileRecord;
use crate::walker::stream::RecordReceiver;
use std::fmt::Write as _;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task::{self, JoinHandle};
use tracing::{debug, error};

/// What the consumer did once the stream closed
#[derive(Debug)]
pub struct OutputSummary {
    /// Records successfully written
    pub written: u64,

    /// Records drained after the sink failed
    pub discarded: u64,

    /// First write error, if any
    pub error: Option<io::Error>,
}

/// Drains the result stream into a sink
pub struct OutputConsumer<W: Write> {
    sink: W,
    format: OutputFormat,

    /// Raised on the first write failure so the walk stops early
    cancel: Option<Arc<AtomicBool>>,
}

impl<W: Write + Send + 'static> OutputConsumer<W> {
    /// Start draining `receiver` on the blocking pool
    pub fn spawn(self, receiver: RecordReceiver) -> JoinHandle<OutputSummary> {
        task::spawn_blocking(move || self.drain(receiver))
    }
}

impl<W: Write> OutputConsumer<W> {
    pub fn new(sink: W, format: OutputFormat) -> Self {
        Self {
            sink,
            format,
            cancel: None,
        }
    }

    /// Set `flag` when the sink fails
    pub fn with_cancel(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Drain until the stream is closed and empty
    ///
    /// After a write failure the cancel flag is raised and the remaining
    /// records are still received, so producers never wait on a dead
    /// consumer.
    pub fn drain(self, mut receiver: RecordReceiver) -> OutputSummary {
        let format = self.format;
        let cancel = self.cancel;
        let mut out = BufWriter::new(self.sink);
        let mut summary = OutputSummary {
            written: 0,
            discarded: 0,
            error: None,
        };

        while let Some(record) = receiver.blocking_recv() {
            if summary.error.is_some() {
                summary.discarded += 1;
                continue;
            }
            match write_record(&mut out, &record, format) {
                Ok(()) => summary.written += 1,
                Err(e) => {
                    error!(error = %e, "Failed to write record, discarding the rest");
                    if let Some(flag) = &cancel {
                        flag.store(true, Ordering::SeqCst);
                    }
                    summary.error = Some(e);
                    summary.discarded += 1;
                }
            }
        }

        if summary.error.is_none() {
            if let Err(e) = out.flush() {
                error!(error = %e, "Failed to flush output");
                summary.error = Some(e);
            }
        }

        debug!(written = summary.written, discarded = summary.discarded, "Output drained");
        summary
    }
}

/// Write one record in the given layout
pub fn write_record<W: Write>(out: &mut W, record: &FileRecord, format: OutputFormat) -> io::Result<()> {
    let type_char = record.entry_type.type_char();
    let mtime = record.mtime_unix();

    match format {
        OutputFormat::Human => writeln!(
            out,
            "{} {} {} {}",
            type_char,
            mtime,
            record.size,
            quote_path(&record.path)
        ),
        OutputFormat::Print0 => {
            write!(out, "{}\0{}\0{}\0", type_char, mtime, record.size)?;
            out.write_all(&path_bytes(&record.path))?;
            out.write_all(b"\0")
        }
    }
}

#[cfg(unix)]
fn path_bytes(path: &Path) -> std::borrow::Cow<'_, [u8]> {
    use std::os::unix::ffi::OsStrExt;
    std::borrow::Cow::Borrowed(path.as_os_str().as_bytes())
}

#[cfg(not(unix))]
fn path_bytes(path: &Path) -> std::borrow::Cow<'_, [u8]> {
    match path.to_string_lossy() {
        std::borrow::Cow::Borrowed(s) => std::borrow::Cow::Borrowed(s.as_bytes()),
        std::borrow::Cow::Owned(s) => std::borrow::Cow::Owned(s.into_bytes()),
    }
}

/// Double-quote a path using ASCII-only escapes
///
/// Printable ASCII is kept, the usual C escapes are used for control
/// characters, other characters become `\u`/`\U` escapes and bytes that are
/// not valid UTF-8 become `\x` escapes.
pub fn quote_path(path: &Path) -> String {
    let bytes = path_bytes(path);
    let mut quoted = String::with_capacity(bytes.len() + 2);
    quoted.push('"');

    for chunk in bytes.utf8_chunks() {
        for c in chunk.valid().chars() {
            push_escaped(&mut quoted, c);
        }
        for b in chunk.invalid() {
            let _ = write!(quoted, "\\x{:02x}", b);
        }
    }

    quoted.push('"');
    quoted
}

fn push_escaped(out: &mut String, c: char) {
    match c {
        '"' => out.push_str("\\\""),
        '\\' => out.push_str("\\\\"),
        '\x07' => out.push_str("\\a"),
        '\x08' => out.push_str("\\b"),
        '\x0c' => out.push_str("\\f"),
        '\n' => out.push_str("\\n"),
        '\r' => out.push_str("\\r"),
        '\t' => out.push_str("\\t"),
        '\x0b' => out.push_str("\\v"),
        ' '..='~' => out.push(c),
        c if (c as u32) < 0x80 => {
            let _ = write!(out, "\\x{:02x}", c as u32);
        }
        c if (c as u32) <= 0xffff => {
            let _ = write!(out, "\\u{:04x}", c as u32);
        }
        c => {
            let _ = write!(out, "\\U{:08x}", c as u32);
        }
    }
}

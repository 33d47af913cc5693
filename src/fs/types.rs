//! Filesystem entry types and data structures
//!
//! These types represent entries returned from the filesystem port and
//! the records streamed to the output consumer.

use chrono::{DateTime, Utc};
use std::ffi::OsString;
use std::path::PathBuf;

/// File type mask of a Unix mode value
const S_IFMT: u32 = 0o170000;

/// Type of filesystem entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryType {
    /// Regular file
    File,
    /// Directory
    Directory,
    /// Symbolic link
    Symlink,
    /// Unix socket
    Socket,
    /// Named pipe (FIFO)
    Fifo,
    /// Character device
    CharDevice,
    /// Block device
    BlockDevice,
    /// Unknown type
    Unknown,
}

impl EntryType {
    /// Classify raw mode bits
    pub fn from_mode(mode: u32) -> Self {
        match mode & S_IFMT {
            0o100000 => EntryType::File,        // S_IFREG
            0o040000 => EntryType::Directory,   // S_IFDIR
            0o120000 => EntryType::Symlink,     // S_IFLNK
            0o140000 => EntryType::Socket,      // S_IFSOCK
            0o010000 => EntryType::Fifo,        // S_IFIFO
            0o020000 => EntryType::CharDevice,  // S_IFCHR
            0o060000 => EntryType::BlockDevice, // S_IFBLK
            _ => EntryType::Unknown,
        }
    }

    /// Single-character tag used in output records
    pub fn type_char(&self) -> char {
        match self {
            EntryType::Directory => 'd',
            EntryType::File => 'f',
            EntryType::Symlink => 'l',
            EntryType::Socket => 's',
            EntryType::Fifo => 'p',
            EntryType::CharDevice => 'C',
            EntryType::BlockDevice => 'D',
            EntryType::Unknown => 'u',
        }
    }

    /// Check if this is a directory
    pub fn is_dir(&self) -> bool {
        *self == EntryType::Directory
    }
}

/// Metadata reported by the filesystem port for one path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryMeta {
    /// Raw mode bits (type + permissions)
    pub mode: u32,

    /// Size in bytes as reported by the filesystem
    pub size: u64,

    /// Last modification time
    pub modified: DateTime<Utc>,
}

impl EntryMeta {
    /// Get the entry type from mode
    pub fn entry_type(&self) -> EntryType {
        EntryType::from_mode(self.mode)
    }

    /// A real directory, not a symlink to one
    pub fn is_traversable_dir(&self) -> bool {
        self.entry_type().is_dir()
    }
}

/// One child returned by a directory listing
#[derive(Debug, Clone)]
pub struct DirEntry {
    /// Entry name (not full path)
    pub name: OsString,

    /// Metadata of the entry itself (symlinks are not followed)
    pub meta: EntryMeta,
}

/// A discovered entry ready for output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    /// Absolute, resolved path
    pub path: PathBuf,

    /// Entry type derived from the mode bits
    pub entry_type: EntryType,

    /// Size in bytes
    pub size: u64,

    /// Last modification time
    pub modified: DateTime<Utc>,
}

impl FileRecord {
    /// Build a record from a resolved path and its metadata
    pub fn new(path: PathBuf, meta: &EntryMeta) -> Self {
        Self {
            path,
            entry_type: meta.entry_type(),
            size: meta.size,
            modified: meta.modified,
        }
    }

    /// Modification time as Unix seconds (negative before the epoch)
    pub fn mtime_unix(&self) -> i64 {
        self.modified.timestamp()
    }
}

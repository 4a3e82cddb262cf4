//! Polling based file change detection.

use std::{
    path::Path,
    time::{SystemTime, UNIX_EPOCH},
};

use log::debug;

/// A file modification time as seen by the detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(SystemTime);

impl Timestamp {
    /// The "never seen" sentinel. Any existing file is newer than this.
    pub const NEVER: Timestamp = Timestamp(UNIX_EPOCH);

    pub fn new(time: SystemTime) -> Self {
        Self(time)
    }

    pub fn is_never(&self) -> bool {
        *self == Self::NEVER
    }

    pub fn as_system_time(&self) -> SystemTime {
        self.0
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::NEVER
    }
}

/// Result of polling a file against the last seen timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStatus {
    /// The modification time is not newer than the last seen one.
    Unchanged,
    /// The file was modified. Carries the new timestamp.
    Modified(Timestamp),
    /// The file's metadata couldn't be read (missing, permission denied, mid-rename).
    Missing,
}

/// Stateless polling primitive. All state lives with the caller.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileChangeDetector;

impl FileChangeDetector {
    /// Reads the modification time of `path` and compares it against `last`.
    pub fn poll(path: &Path, last: Timestamp) -> FileStatus {
        let modified = match std::fs::metadata(path).and_then(|m| m.modified()) {
            Ok(time) => Timestamp::new(time),
            Err(e) => {
                debug!("Couldn't stat '{}': {}", path.display(), e);
                return FileStatus::Missing;
            }
        };

        if modified > last {
            FileStatus::Modified(modified)
        } else {
            FileStatus::Unchanged
        }
    }

    /// Returns `(changed, new_timestamp)`.
    ///
    /// An unreadable file counts as unchanged and leaves the timestamp untouched, so a
    /// transient disappearance (editors saving through a rename) never looks like an edit.
    pub fn check_modified(path: &Path, last: Timestamp) -> (bool, Timestamp) {
        match Self::poll(path, last) {
            FileStatus::Modified(new) => (true, new),
            FileStatus::Unchanged | FileStatus::Missing => (false, last),
        }
    }
}

//! File modification stamps for timestamp-based staleness.

use std::path::Path;
use std::time::SystemTime;

/// The observed state of a file at the moment it was inspected.
///
/// A file that cannot be stat'ed (missing, or permission denied) is
/// [`FileStamp::Missing`], which compares older than any existing file so
/// that a missing output is always out of date.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum FileStamp {
    /// The file does not exist or could not be inspected.
    Missing,
    /// The file exists and was last modified at this time.
    Modified(SystemTime),
}

impl FileStamp {
    /// Stats `path` and returns its stamp.
    pub fn of(path: &Path) -> Self {
        match std::fs::metadata(path).and_then(|m| m.modified()) {
            Ok(mtime) => FileStamp::Modified(mtime),
            Err(_) => FileStamp::Missing,
        }
    }

    /// Returns `true` if the file exists.
    pub fn exists(self) -> bool {
        matches!(self, FileStamp::Modified(_))
    }

    /// Returns the modification time, if the file exists.
    pub fn mtime(self) -> Option<SystemTime> {
        match self {
            FileStamp::Missing => None,
            FileStamp::Modified(t) => Some(t),
        }
    }

    /// Returns `true` if this output is strictly older than `input`.
    ///
    /// A missing output is older than everything. A missing input never
    /// makes an existing output stale; callers that care about vanished
    /// inputs check [`exists`](Self::exists) themselves.
    pub fn is_older_than(self, input: FileStamp) -> bool {
        match (self, input) {
            (FileStamp::Missing, _) => true,
            (FileStamp::Modified(_), FileStamp::Missing) => false,
            (FileStamp::Modified(out), FileStamp::Modified(inp)) => out < inp,
        }
    }
}

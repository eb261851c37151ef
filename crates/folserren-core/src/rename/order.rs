//! Sort keys for ordering entries before numbering them.

use std::ffi::OsString;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::CoreResult;
use crate::fs::stamp;

/// The built-in orders a rename can number entries by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PathOrder {
    /// File name, compared byte-wise (case-sensitive).
    #[default]
    Name,
    /// Last access time, oldest first.
    Accessed,
    /// Last modification time, oldest first.
    Modified,
    /// Creation time (inode change time on Unix), oldest first.
    Created,
}

/// A comparable key produced by a [`PathOrder`].
///
/// Keys from different orders are never compared with each other.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum SortKey {
    Name(OsString),
    Time(i64),
}

impl PathOrder {
    /// Computes the sort key of `path` under this order.
    pub fn key(self, path: &Path) -> CoreResult<SortKey> {
        match self {
            PathOrder::Name => Ok(by_name(path)),
            PathOrder::Accessed => by_accessed(path),
            PathOrder::Modified => by_modified(path),
            PathOrder::Created => by_created(path),
        }
    }
}

pub fn by_name(path: &Path) -> SortKey {
    SortKey::Name(path.file_name().map(OsString::from).unwrap_or_default())
}

pub fn by_accessed(path: &Path) -> CoreResult<SortKey> {
    let metadata = std::fs::metadata(path)?;
    Ok(SortKey::Time(stamp::accessed_ns(&metadata)?))
}

pub fn by_modified(path: &Path) -> CoreResult<SortKey> {
    let metadata = std::fs::metadata(path)?;
    Ok(SortKey::Time(stamp::modified_ns(&metadata)?))
}

pub fn by_created(path: &Path) -> CoreResult<SortKey> {
    let metadata = std::fs::metadata(path)?;
    Ok(SortKey::Time(stamp::created_ns(&metadata)?))
}

//! Nanosecond timestamps read from entry metadata.

use std::fs::Metadata;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::CoreResult;

/// The timestamp pair recorded for one entry of a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntryStamp {
    pub modified_ns: i64,
    pub created_ns: i64,
}

impl EntryStamp {
    /// Reads the stamp of `path`, following symlinks.
    pub fn read(path: &Path) -> CoreResult<Self> {
        let metadata = std::fs::metadata(path)?;
        Ok(Self::from_metadata(&metadata)?)
    }

    pub fn from_metadata(metadata: &Metadata) -> std::io::Result<Self> {
        Ok(Self {
            modified_ns: modified_ns(metadata)?,
            created_ns: created_ns(metadata)?,
        })
    }
}

#[cfg(unix)]
fn join_ns(secs: i64, nsecs: i64) -> i64 {
    secs.saturating_mul(1_000_000_000).saturating_add(nsecs)
}

#[cfg(not(unix))]
fn system_time_ns(time: std::time::SystemTime) -> i64 {
    match time.duration_since(std::time::UNIX_EPOCH) {
        Ok(after) => i64::try_from(after.as_nanos()).unwrap_or(i64::MAX),
        Err(before) => i64::try_from(before.duration().as_nanos())
            .map(|ns| -ns)
            .unwrap_or(i64::MIN),
    }
}

/// Last content modification time in nanoseconds since the Unix epoch.
pub fn modified_ns(metadata: &Metadata) -> std::io::Result<i64> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::MetadataExt;
        Ok(join_ns(metadata.mtime(), metadata.mtime_nsec()))
    }
    #[cfg(not(unix))]
    {
        metadata.modified().map(system_time_ns)
    }
}

/// Last access time in nanoseconds since the Unix epoch.
pub fn accessed_ns(metadata: &Metadata) -> std::io::Result<i64> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::MetadataExt;
        Ok(join_ns(metadata.atime(), metadata.atime_nsec()))
    }
    #[cfg(not(unix))]
    {
        metadata.accessed().map(system_time_ns)
    }
}

/// Creation time in nanoseconds since the Unix epoch.
///
/// Unix has no portable birth time, so the inode change time stands in for
/// it there. It moves on renames and permission changes as well as writes.
pub fn created_ns(metadata: &Metadata) -> std::io::Result<i64> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::MetadataExt;
        Ok(join_ns(metadata.ctime(), metadata.ctime_nsec()))
    }
    #[cfg(not(unix))]
    {
        metadata.created().map(system_time_ns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use filetime::FileTime;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn read_reports_explicit_mtime() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("a.txt");
        fs::write(&file, "a").unwrap();
        filetime::set_file_mtime(&file, FileTime::from_unix_time(1_600_000_000, 500)).unwrap();

        let stamp = EntryStamp::read(&file).unwrap();

        assert_eq!(stamp.modified_ns, 1_600_000_000_000_000_500);
    }

    #[test]
    fn read_missing_path_is_error() {
        let tmp = TempDir::new().unwrap();

        assert!(EntryStamp::read(&tmp.path().join("gone")).is_err());
    }

    #[test]
    fn accessed_follows_set_atime() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("a.txt");
        fs::write(&file, "a").unwrap();
        filetime::set_file_atime(&file, FileTime::from_unix_time(1_500_000_000, 0)).unwrap();

        let metadata = fs::metadata(&file).unwrap();

        assert_eq!(accessed_ns(&metadata).unwrap(), 1_500_000_000_000_000_000);
    }

    #[test]
    fn stamp_changes_with_mtime() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("a.txt");
        fs::write(&file, "a").unwrap();
        filetime::set_file_mtime(&file, FileTime::from_unix_time(1_000, 0)).unwrap();
        let before = EntryStamp::read(&file).unwrap();

        filetime::set_file_mtime(&file, FileTime::from_unix_time(2_000, 0)).unwrap();
        let after = EntryStamp::read(&file).unwrap();

        assert_ne!(before, after);
    }
}

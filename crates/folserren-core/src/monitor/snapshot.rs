//! Snapshot types and cache file persistence.
//!
//! A [`Snapshot`] maps every watched entry to its [`EntryStamp`]. It is
//! stored as JSON in the monitor's cache file and compared against the
//! live directory to produce [`Change`] records.
//!
//! Paths are stored as their raw OS encoding (bytes on Unix, UTF-16 units on
//! Windows) so names that are not valid UTF-8 survive a round trip.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::fs::stamp::EntryStamp;

/// The observed state of a watched directory at one point in time.
///
/// Snapshots are rebuilt wholesale and never patched in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot {
    #[serde(with = "records")]
    entries: BTreeMap<PathBuf, EntryStamp>,
}

/// On-disk form of the entry map: a list of `{path, stamp}` records.
mod records {
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::stored_path;
    use crate::fs::stamp::EntryStamp;

    #[derive(Serialize, Deserialize)]
    struct CacheRecord {
        path: stored_path::Encoded,
        stamp: EntryStamp,
    }

    pub(super) fn serialize<S: Serializer>(
        entries: &BTreeMap<PathBuf, EntryStamp>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(entries.iter().map(|(path, stamp)| CacheRecord {
            path: stored_path::encode(path),
            stamp: *stamp,
        }))
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<PathBuf, EntryStamp>, D::Error> {
        let records = Vec::<CacheRecord>::deserialize(deserializer)?;
        Ok(records
            .into_iter()
            .map(|r| (stored_path::decode(r.path), r.stamp))
            .collect())
    }
}

#[cfg(unix)]
mod stored_path {
    use std::ffi::OsString;
    use std::os::unix::ffi::{OsStrExt, OsStringExt};
    use std::path::{Path, PathBuf};

    pub(super) type Encoded = Vec<u8>;

    pub(super) fn encode(path: &Path) -> Encoded {
        path.as_os_str().as_bytes().to_vec()
    }

    pub(super) fn decode(raw: Encoded) -> PathBuf {
        PathBuf::from(OsString::from_vec(raw))
    }
}

#[cfg(windows)]
mod stored_path {
    use std::ffi::OsString;
    use std::os::windows::ffi::{OsStrExt, OsStringExt};
    use std::path::{Path, PathBuf};

    pub(super) type Encoded = Vec<u16>;

    pub(super) fn encode(path: &Path) -> Encoded {
        path.as_os_str().encode_wide().collect()
    }

    pub(super) fn decode(raw: Encoded) -> PathBuf {
        PathBuf::from(OsString::from_wide(&raw))
    }
}

#[cfg(not(any(unix, windows)))]
mod stored_path {
    use std::path::{Path, PathBuf};

    pub(super) type Encoded = String;

    pub(super) fn encode(path: &Path) -> Encoded {
        path.to_string_lossy().into_owned()
    }

    pub(super) fn decode(raw: Encoded) -> PathBuf {
        PathBuf::from(raw)
    }
}

/// Outcome of reading a cache file.
#[derive(Debug)]
pub enum SnapshotLoad {
    /// No cache file exists yet.
    Missing,
    /// The file exists but could not be read or decoded.
    Corrupt(String),
    /// A well-formed prior snapshot.
    Loaded(Snapshot),
}

impl Snapshot {
    /// Stats every path and records its stamp.
    ///
    /// Fails on the first entry that cannot be stat'ed, e.g. one removed
    /// between enumeration and capture.
    pub fn capture<I>(paths: I) -> CoreResult<Self>
    where
        I: IntoIterator<Item = PathBuf>,
    {
        let mut entries = BTreeMap::new();
        for path in paths {
            let stamp = EntryStamp::read(&path)?;
            entries.insert(path, stamp);
        }
        Ok(Self { entries })
    }

    /// Reads a snapshot from `path`.
    pub fn load(path: &Path) -> SnapshotLoad {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return SnapshotLoad::Missing,
            Err(e) => return SnapshotLoad::Corrupt(e.to_string()),
        };
        match serde_json::from_slice(&bytes) {
            Ok(snapshot) => SnapshotLoad::Loaded(snapshot),
            Err(e) => SnapshotLoad::Corrupt(e.to_string()),
        }
    }

    /// Writes this snapshot to `path`, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> CoreResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_vec(self).map_err(|e| CoreError::CacheEncode(e.to_string()))?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Lists what changed going from `previous` to `self`.
    ///
    /// Additions and modifications come first in path order, followed by
    /// removals in path order.
    pub fn diff(&self, previous: &Snapshot) -> Vec<Change> {
        let mut changes: Vec<Change> = self
            .entries
            .iter()
            .filter_map(|(path, stamp)| match previous.entries.get(path) {
                None => Some(Change::new(ChangeKind::Add, path)),
                Some(old) if old != stamp => Some(Change::new(ChangeKind::Modify, path)),
                Some(_) => None,
            })
            .collect();

        changes.extend(
            previous
                .entries
                .keys()
                .filter(|path| !self.entries.contains_key(*path))
                .map(|path| Change::new(ChangeKind::Remove, path)),
        );
        changes
    }

    pub fn get(&self, path: &Path) -> Option<&EntryStamp> {
        self.entries.get(path)
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.entries.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates entries in path order.
    pub fn iter(&self) -> impl Iterator<Item = (&PathBuf, &EntryStamp)> {
        self.entries.iter()
    }
}

impl FromIterator<(PathBuf, EntryStamp)> for Snapshot {
    fn from_iter<T: IntoIterator<Item = (PathBuf, EntryStamp)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// The kind of difference between two snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Add,
    Modify,
    Remove,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeKind::Add => f.write_str("add"),
            ChangeKind::Modify => f.write_str("modify"),
            ChangeKind::Remove => f.write_str("remove"),
        }
    }
}

/// One line of the difference log, displayed as `kind:\tpath`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    pub kind: ChangeKind,
    pub path: PathBuf,
}

impl Change {
    fn new(kind: ChangeKind, path: &Path) -> Self {
        Self {
            kind,
            path: path.to_path_buf(),
        }
    }
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:\t{}", self.kind, self.path.display())
    }
}

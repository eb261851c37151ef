//! Poll-based change detection for a single directory.
//!
//! A [`Monitor`] owns a [`Snapshot`] of the watched directory and compares it
//! against the snapshot persisted in its cache file. [`FolderMonitor`] is the
//! filesystem-backed implementation; [`WatchMode`] selects which children it
//! tracks. Call [`Monitor::scoped`] to get an [`UpdateGuard`] that persists
//! the final state however the scope is left.

pub mod folder;
pub mod snapshot;

use std::collections::BTreeSet;
use std::convert::Infallible;
use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreResult;

pub use folder::FolderMonitor;
pub use snapshot::{Change, ChangeKind, Snapshot, SnapshotLoad};

/// Default directory for cache files, relative to the working directory.
pub const DEFAULT_CACHE_DIR: &str = "monitoring_cache";

/// Which immediate children of a directory are tracked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum WatchMode {
    /// Files only.
    #[serde(rename = "f", alias = "F")]
    Files,
    /// Directories only.
    #[serde(rename = "d", alias = "D")]
    Dirs,
    /// Files and directories alike.
    #[default]
    #[serde(rename = "df", alias = "fd", alias = "DF", alias = "FD")]
    All,
}

impl WatchMode {
    /// Parses a mode string. Anything other than `f` or `d` watches everything.
    pub fn parse(mode: &str) -> Self {
        match mode.to_ascii_lowercase().as_str() {
            "f" => WatchMode::Files,
            "d" => WatchMode::Dirs,
            _ => WatchMode::All,
        }
    }

    /// Returns `true` if `path` belongs to the watch set.
    pub fn accepts(self, path: &Path) -> bool {
        match self {
            WatchMode::Files => path.is_file(),
            WatchMode::Dirs => path.is_dir(),
            WatchMode::All => true,
        }
    }
}

impl FromStr for WatchMode {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

/// Anything that tracks a directory's entries against a persisted snapshot.
///
/// Once [`check`](Monitor::check) has reported a change, it keeps returning
/// `true` without rescanning until [`update_cache_file`](Monitor::update_cache_file)
/// drains the pending difference.
pub trait Monitor {
    /// Detects whether the directory drifted from the persisted snapshot.
    fn check(&mut self) -> CoreResult<bool>;

    /// Number of pending changes and the changes themselves.
    fn difference(&self) -> (usize, &[Change]);

    /// Immediate children of the watched directory accepted by `filter`.
    fn entries(&self, filter: &dyn Fn(&Path) -> bool) -> CoreResult<Vec<PathBuf>>;

    /// Rebuilds the in-memory snapshot from disk.
    fn update_cache(&mut self) -> CoreResult<()>;

    /// Persists the in-memory snapshot and clears pending changes.
    fn update_cache_file(&mut self) -> CoreResult<()>;

    fn update(&mut self) -> CoreResult<()> {
        self.update_cache()?;
        self.update_cache_file()
    }

    /// The current in-memory snapshot.
    fn snapshot(&self) -> &Snapshot;

    fn cache_file(&self) -> &Path;

    /// The watched directory.
    fn path(&self) -> &Path;

    /// The live watch set.
    fn paths(&self) -> CoreResult<BTreeSet<PathBuf>>;

    /// Borrows this monitor behind a guard that calls [`update`](Monitor::update)
    /// when dropped.
    fn scoped(&mut self) -> UpdateGuard<'_, Self>
    where
        Self: Sized,
    {
        UpdateGuard::new(self)
    }
}

/// Runs [`Monitor::update`] when it goes out of scope.
///
/// The update also runs during unwinding and after early returns. Errors
/// from the drop-time update can only be logged; call
/// [`finish`](UpdateGuard::finish) to observe them instead.
pub struct UpdateGuard<'a, M: Monitor> {
    monitor: &'a mut M,
    armed: bool,
}

impl<'a, M: Monitor> UpdateGuard<'a, M> {
    pub fn new(monitor: &'a mut M) -> Self {
        Self {
            monitor,
            armed: true,
        }
    }

    /// Runs the update now and disarms the guard.
    pub fn finish(mut self) -> CoreResult<()> {
        self.armed = false;
        self.monitor.update()
    }
}

impl<M: Monitor> Deref for UpdateGuard<'_, M> {
    type Target = M;

    fn deref(&self) -> &M {
        self.monitor
    }
}

impl<M: Monitor> DerefMut for UpdateGuard<'_, M> {
    fn deref_mut(&mut self) -> &mut M {
        self.monitor
    }
}

impl<M: Monitor> Drop for UpdateGuard<'_, M> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if let Err(e) = self.monitor.update() {
            tracing::warn!(
                "failed to update cache for {} on scope exit: {e}",
                self.monitor.path().display()
            );
        }
    }
}

//! Filesystem-backed [`Monitor`] implementation.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::error::CoreResult;
use crate::fs::ops::{check_path, read_entries, PathKind};

use super::snapshot::{Change, Snapshot, SnapshotLoad};
use super::{Monitor, WatchMode, DEFAULT_CACHE_DIR};

/// Watches the immediate children of one directory selected by a [`WatchMode`].
///
/// The persisted snapshot lives in `<cache_dir>/<directory name>.cache`.
/// Only one monitor should own a given directory and cache file at a time.
#[derive(Debug)]
pub struct FolderMonitor {
    path: PathBuf,
    mode: WatchMode,
    cache_file: PathBuf,
    snapshot: Snapshot,
    dirty: bool,
    changes: Vec<Change>,
}

impl FolderMonitor {
    /// Opens a monitor for `path`, storing its cache under `cache_dir`
    /// (or [`DEFAULT_CACHE_DIR`] in the working directory).
    ///
    /// The cache directory is created if missing. Opening runs an initial
    /// [`check`](Monitor::check): the first ever open writes the baseline,
    /// later opens report drift since the last persisted state.
    ///
    /// # Errors
    ///
    /// - [`CoreError::NotFound`](crate::CoreError::NotFound) — `path` does not exist.
    /// - [`CoreError::WrongPathKind`](crate::CoreError::WrongPathKind) — `path` or an
    ///   existing `cache_dir` is not a directory.
    /// - [`CoreError::Io`](crate::CoreError::Io) — scanning or writing the cache failed.
    pub fn open(path: &Path, mode: WatchMode, cache_dir: Option<&Path>) -> CoreResult<Self> {
        let path = check_path(path, Some(PathKind::Directory), true)?;
        let cache_dir = check_path(
            cache_dir.unwrap_or(Path::new(DEFAULT_CACHE_DIR)),
            Some(PathKind::Directory),
            false,
        )?;
        std::fs::create_dir_all(&cache_dir)?;

        let cache_file = cache_dir.join(cache_file_name(&path));
        let mut monitor = Self {
            path,
            mode,
            cache_file,
            snapshot: Snapshot::default(),
            dirty: false,
            changes: Vec::new(),
        };
        monitor.check()?;
        Ok(monitor)
    }

    pub fn mode(&self) -> WatchMode {
        self.mode
    }

    /// Returns `true` while a detected change has not been persisted.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    fn rebaseline(&mut self) -> CoreResult<bool> {
        self.update_cache_file()?;
        Ok(false)
    }
}

impl Monitor for FolderMonitor {
    fn check(&mut self) -> CoreResult<bool> {
        if self.dirty {
            return Ok(true);
        }
        self.update_cache()?;

        let previous = match Snapshot::load(&self.cache_file) {
            SnapshotLoad::Loaded(previous) => previous,
            SnapshotLoad::Missing => {
                tracing::debug!("writing baseline cache {}", self.cache_file.display());
                return self.rebaseline();
            }
            SnapshotLoad::Corrupt(reason) => {
                tracing::warn!(
                    "discarding unreadable cache {}: {reason}",
                    self.cache_file.display()
                );
                return self.rebaseline();
            }
        };

        if previous == self.snapshot {
            return Ok(false);
        }
        let changes = self.snapshot.diff(&previous);
        tracing::info!(
            "detected {} change(s) in {}",
            changes.len(),
            self.path.display()
        );
        self.changes.extend(changes);
        self.dirty = true;
        Ok(true)
    }

    fn difference(&self) -> (usize, &[Change]) {
        (self.changes.len(), &self.changes)
    }

    fn entries(&self, filter: &dyn Fn(&Path) -> bool) -> CoreResult<Vec<PathBuf>> {
        read_entries(&self.path, filter)
    }

    fn update_cache(&mut self) -> CoreResult<()> {
        let paths = self.paths()?;
        self.snapshot = Snapshot::capture(paths)?;
        tracing::debug!(
            "captured {} entries of {}",
            self.snapshot.len(),
            self.path.display()
        );
        Ok(())
    }

    fn update_cache_file(&mut self) -> CoreResult<()> {
        self.snapshot.save(&self.cache_file)?;
        self.dirty = false;
        self.changes.clear();
        Ok(())
    }

    fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    fn cache_file(&self) -> &Path {
        &self.cache_file
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn paths(&self) -> CoreResult<BTreeSet<PathBuf>> {
        let mode = self.mode;
        let entries = self.entries(&|p| mode.accepts(p))?;
        Ok(entries.into_iter().collect())
    }
}

/// `<directory name>.cache`, with `root` standing in for a nameless root.
fn cache_file_name(dir: &Path) -> String {
    let name = dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "root".to_string());
    format!("{name}.cache")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use crate::monitor::ChangeKind;
    use filetime::FileTime;
    use std::fs;
    use tempfile::TempDir;

    struct Fixture {
        _tmp: TempDir,
        watched: PathBuf,
        cache_dir: PathBuf,
    }

    fn fixture(files: &[&str]) -> Fixture {
        let tmp = TempDir::new().unwrap();
        let watched = tmp.path().join("photos");
        let cache_dir = tmp.path().join("cache");
        fs::create_dir(&watched).unwrap();
        for name in files {
            fs::write(watched.join(name), *name).unwrap();
        }
        let watched = watched.canonicalize().unwrap();
        Fixture {
            _tmp: tmp,
            watched,
            cache_dir,
        }
    }

    fn open(fx: &Fixture, mode: WatchMode) -> FolderMonitor {
        FolderMonitor::open(&fx.watched, mode, Some(&fx.cache_dir)).unwrap()
    }

    #[test]
    fn first_open_writes_baseline_equal_to_live_snapshot() {
        let fx = fixture(&["a.txt", "b.txt"]);

        let monitor = open(&fx, WatchMode::All);

        assert_eq!(monitor.cache_file(), fx.cache_dir.join("photos.cache"));
        assert!(monitor.cache_file().exists());
        assert!(!monitor.is_dirty());
        match Snapshot::load(monitor.cache_file()) {
            SnapshotLoad::Loaded(saved) => assert_eq!(&saved, monitor.snapshot()),
            other => panic!("expected baseline, got {other:?}"),
        }
    }

    #[test]
    fn first_check_without_cache_file_is_false() {
        let fx = fixture(&["a.txt"]);
        let mut monitor = open(&fx, WatchMode::All);
        fs::remove_file(monitor.cache_file()).unwrap();

        assert!(!monitor.check().unwrap());
        assert!(monitor.cache_file().exists());
    }

    #[test]
    fn unchanged_directory_reports_nothing() {
        let fx = fixture(&["a.txt"]);
        let mut monitor = open(&fx, WatchMode::All);

        assert!(!monitor.check().unwrap());
        assert_eq!(monitor.difference().0, 0);
    }

    #[test]
    fn added_entries_are_reported_as_adds() {
        let fx = fixture(&["a.txt"]);
        let mut monitor = open(&fx, WatchMode::All);
        fs::write(fx.watched.join("b.txt"), "").unwrap();
        fs::write(fx.watched.join("c.txt"), "").unwrap();

        assert!(monitor.check().unwrap());

        let (count, changes) = monitor.difference();
        assert_eq!(count, 2);
        assert!(changes.iter().all(|c| c.kind == ChangeKind::Add));
        assert_eq!(changes[0].to_string(), format!("add:\t{}", fx.watched.join("b.txt").display()));
        assert_eq!(changes[1].path, fx.watched.join("c.txt"));
    }

    #[test]
    fn removed_entries_are_reported_as_removes() {
        let fx = fixture(&["a.txt", "b.txt"]);
        let mut monitor = open(&fx, WatchMode::All);
        fs::remove_file(fx.watched.join("a.txt")).unwrap();

        assert!(monitor.check().unwrap());

        let (_, changes) = monitor.difference();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].kind, ChangeKind::Remove);
        assert_eq!(changes[0].path, fx.watched.join("a.txt"));
    }

    #[test]
    fn modified_entries_are_reported_as_modifies() {
        let fx = fixture(&["a.txt"]);
        let file = fx.watched.join("a.txt");
        filetime::set_file_mtime(&file, FileTime::from_unix_time(1_000, 0)).unwrap();
        let mut monitor = open(&fx, WatchMode::All);
        monitor.update().unwrap();

        filetime::set_file_mtime(&file, FileTime::from_unix_time(2_000, 0)).unwrap();

        assert!(monitor.check().unwrap());
        let (_, changes) = monitor.difference();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].kind, ChangeKind::Modify);
    }

    #[test]
    fn repeated_check_does_not_duplicate_difference() {
        let fx = fixture(&["a.txt"]);
        let mut monitor = open(&fx, WatchMode::All);
        fs::write(fx.watched.join("b.txt"), "").unwrap();

        assert!(monitor.check().unwrap());
        let first: Vec<Change> = monitor.difference().1.to_vec();

        fs::write(fx.watched.join("c.txt"), "").unwrap();
        assert!(monitor.check().unwrap());

        assert_eq!(monitor.difference().1, first.as_slice());
    }

    #[test]
    fn update_then_check_is_false() {
        let fx = fixture(&["a.txt"]);
        let mut monitor = open(&fx, WatchMode::All);
        fs::write(fx.watched.join("b.txt"), "").unwrap();
        assert!(monitor.check().unwrap());

        monitor.update().unwrap();

        assert!(!monitor.is_dirty());
        assert_eq!(monitor.difference().0, 0);
        assert!(!monitor.check().unwrap());
    }

    #[test]
    fn update_cache_file_clears_pending_changes() {
        let fx = fixture(&["a.txt"]);
        let mut monitor = open(&fx, WatchMode::All);
        fs::write(fx.watched.join("b.txt"), "").unwrap();
        assert!(monitor.check().unwrap());

        monitor.update_cache_file().unwrap();

        assert!(!monitor.is_dirty());
        assert_eq!(monitor.difference().0, 0);
    }

    #[test]
    fn corrupt_cache_is_rebaselined_silently() {
        let fx = fixture(&["a.txt"]);
        let mut monitor = open(&fx, WatchMode::All);
        fs::write(monitor.cache_file(), "garbage").unwrap();
        fs::write(fx.watched.join("b.txt"), "").unwrap();

        assert!(!monitor.check().unwrap());
        assert!(matches!(
            Snapshot::load(monitor.cache_file()),
            SnapshotLoad::Loaded(_)
        ));
        assert!(!monitor.check().unwrap());
    }

    #[test]
    fn reopen_reports_drift_since_last_run() {
        let fx = fixture(&["a.txt"]);
        drop(open(&fx, WatchMode::All));
        fs::write(fx.watched.join("b.txt"), "").unwrap();

        let monitor = open(&fx, WatchMode::All);

        assert!(monitor.is_dirty());
        assert_eq!(monitor.difference().0, 1);
    }

    #[test]
    fn files_mode_ignores_directories() {
        let fx = fixture(&["a.txt"]);
        let mut monitor = open(&fx, WatchMode::Files);
        fs::create_dir(fx.watched.join("sub")).unwrap();

        assert!(!monitor.check().unwrap());
        assert_eq!(monitor.paths().unwrap().len(), 1);
    }

    #[test]
    fn dirs_mode_ignores_files() {
        let fx = fixture(&[]);
        fs::create_dir(fx.watched.join("sub")).unwrap();
        let mut monitor = open(&fx, WatchMode::Dirs);
        fs::write(fx.watched.join("a.txt"), "").unwrap();

        assert!(!monitor.check().unwrap());
        assert_eq!(
            monitor.paths().unwrap().into_iter().collect::<Vec<_>>(),
            vec![fx.watched.join("sub")]
        );
    }

    #[test]
    fn entries_with_custom_filter() {
        let fx = fixture(&["a.txt", "b.md"]);
        let monitor = open(&fx, WatchMode::All);

        let md = monitor
            .entries(&|p| p.extension().is_some_and(|e| e == "md"))
            .unwrap();

        assert_eq!(md, vec![fx.watched.join("b.md")]);
    }

    #[test]
    fn open_missing_directory_is_not_found() {
        let fx = fixture(&[]);

        let err = FolderMonitor::open(&fx.watched.join("nope"), WatchMode::All, Some(&fx.cache_dir))
            .unwrap_err();

        assert!(matches!(err, CoreError::NotFound(_)));
    }

    #[test]
    fn open_file_is_wrong_kind() {
        let fx = fixture(&["a.txt"]);

        let err = FolderMonitor::open(&fx.watched.join("a.txt"), WatchMode::All, Some(&fx.cache_dir))
            .unwrap_err();

        assert!(matches!(err, CoreError::WrongPathKind { .. }));
    }

    #[test]
    fn open_with_file_as_cache_dir_is_wrong_kind() {
        let fx = fixture(&["a.txt"]);
        let bogus = fx.watched.join("a.txt");

        let err = FolderMonitor::open(&fx.watched, WatchMode::All, Some(&bogus)).unwrap_err();

        assert!(matches!(err, CoreError::WrongPathKind { .. }));
    }

    #[test]
    fn cache_file_name_uses_directory_name() {
        assert_eq!(cache_file_name(Path::new("/data/photos")), "photos.cache");
        assert_eq!(cache_file_name(Path::new("/")), "root.cache");
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn non_utf8_entry_can_be_checked_and_renamed() {
        use crate::rename::SerialRenamer;
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let fx = fixture(&["a.txt"]);
        let odd = fx.watched.join(OsStr::from_bytes(b"bad\xff.txt"));
        fs::write(&odd, "odd").unwrap();

        let mut monitor = open(&fx, WatchMode::Files);
        assert!(monitor.snapshot().contains(&odd));
        assert!(!monitor.check().unwrap());

        fs::write(fx.watched.join("c.txt"), "c").unwrap();
        assert!(monitor.check().unwrap());
        monitor.update().unwrap();
        assert!(!monitor.check().unwrap());

        let mut renamer = SerialRenamer::new(monitor);
        let report = renamer.rename(false, None).unwrap();

        assert_eq!(report.renamed, 3);
        assert_eq!(fs::read_to_string(fx.watched.join("1.txt")).unwrap(), "a.txt");
        assert_eq!(fs::read_to_string(fx.watched.join("2.txt")).unwrap(), "odd");
        assert_eq!(fs::read_to_string(fx.watched.join("3.txt")).unwrap(), "c");
        assert!(!renamer.check().unwrap());
    }
}

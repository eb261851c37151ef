//! Path validation, directory enumeration and single-entry renames.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{CoreError, CoreResult};

/// The kind of filesystem object a path is expected to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    File,
    Directory,
}

impl PathKind {
    /// Returns `true` if `path` currently exists as this kind (symlinks followed).
    pub fn matches(self, path: &Path) -> bool {
        match self {
            PathKind::File => path.is_file(),
            PathKind::Directory => path.is_dir(),
        }
    }
}

impl fmt::Display for PathKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathKind::File => f.write_str("file"),
            PathKind::Directory => f.write_str("directory"),
        }
    }
}

/// Validates `path` and returns it in absolute form.
///
/// Existing paths are canonicalized and, when `kind` is given, must be of
/// that kind. Missing paths are returned joined onto the working directory
/// unless `must_exist` is set.
///
/// # Errors
///
/// - [`CoreError::WrongPathKind`] — the path exists but is of another kind.
/// - [`CoreError::NotFound`] — the path is missing and `must_exist` is set.
/// - [`CoreError::Io`] — canonicalization or the working directory lookup failed.
pub fn check_path(path: &Path, kind: Option<PathKind>, must_exist: bool) -> CoreResult<PathBuf> {
    if path.exists() {
        let resolved = path.canonicalize()?;
        return match kind {
            Some(kind) if !kind.matches(&resolved) => Err(CoreError::WrongPathKind {
                path: resolved,
                expected: kind,
            }),
            _ => Ok(resolved),
        };
    }
    if must_exist {
        return Err(CoreError::NotFound(path.to_path_buf()));
    }
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

/// Returns `true` if `path` lies somewhere below the directory `dir`.
///
/// Both paths are compared lexically, so callers should pass absolute paths.
///
/// # Errors
///
/// - [`CoreError::NotADirectory`] — `dir` is not an existing directory.
pub fn is_ancestor(dir: &Path, path: &Path) -> CoreResult<bool> {
    if !dir.is_dir() {
        return Err(CoreError::NotADirectory(dir.to_path_buf()));
    }
    Ok(path != dir && path.starts_with(dir))
}

/// Lists the immediate children of `dir` accepted by `filter`.
///
/// An unreadable entry aborts the whole read.
///
/// # Errors
///
/// - [`CoreError::NotFound`] — `dir` does not exist.
/// - [`CoreError::NotADirectory`] — `dir` is not a directory.
/// - [`CoreError::PermissionDenied`] — read access is denied.
/// - [`CoreError::Io`] — any other I/O error, including per-entry failures.
pub fn read_entries(dir: &Path, filter: &dyn Fn(&Path) -> bool) -> CoreResult<Vec<PathBuf>> {
    if !dir.exists() {
        return Err(CoreError::NotFound(dir.to_path_buf()));
    }
    if !dir.is_dir() {
        return Err(CoreError::NotADirectory(dir.to_path_buf()));
    }

    let read_dir = std::fs::read_dir(dir).map_err(|e| {
        if e.kind() == std::io::ErrorKind::PermissionDenied {
            CoreError::PermissionDenied(dir.to_path_buf())
        } else {
            CoreError::Io(e)
        }
    })?;

    let mut entries = Vec::new();
    for dir_entry in read_dir {
        let path = dir_entry?.path();
        if filter(&path) {
            entries.push(path);
        }
    }
    Ok(entries)
}

/// Renames `from` to `to` without ever replacing an existing entry.
///
/// `to` must be a sibling of `from` whose file name is a valid single
/// path component.
///
/// # Errors
///
/// - [`CoreError::NotFound`] if `from` does not exist.
/// - [`CoreError::InvalidName`] if the target name is invalid or not a sibling.
/// - [`CoreError::TargetExists`] if something already occupies `to`.
/// - [`CoreError::Io`] for any I/O failure.
pub fn rename_entry(from: &Path, to: &Path) -> CoreResult<()> {
    if std::fs::symlink_metadata(from).is_err() {
        return Err(CoreError::NotFound(from.to_path_buf()));
    }

    let name = to
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    if !is_valid_filename(&name) || to.parent() != from.parent() {
        return Err(CoreError::InvalidName(to.display().to_string()));
    }

    if std::fs::symlink_metadata(to).is_ok() {
        return Err(CoreError::TargetExists(to.to_path_buf()));
    }

    std::fs::rename(from, to)?;
    tracing::debug!("renamed {} -> {}", from.display(), to.display());
    Ok(())
}

/// Returns `true` if `name` can be used as a single path component.
pub fn is_valid_filename(name: &str) -> bool {
    if name.is_empty() || name == "." || name == ".." {
        return false;
    }
    if name.contains('/') || name.contains('\0') {
        return false;
    }
    #[cfg(windows)]
    if name.contains('\\') || name.contains(':') {
        return false;
    }
    true
}

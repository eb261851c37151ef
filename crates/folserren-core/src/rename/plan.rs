//! Rename plan computation.
//!
//! Directories and files are numbered independently: each group is sorted
//! by the caller's key, gets its own digit width, and is numbered from 1.
//! Directories receive a whole new name, files a new stem with their last
//! extension kept.

use std::collections::{BTreeSet, HashSet};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::error::{CoreError, CoreResult};
use crate::fs::ops::is_valid_filename;

use super::template::{self, NameTemplate};

/// One entry of a [`RenamePlan`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rename {
    pub from: PathBuf,
    pub to: PathBuf,
}

impl Rename {
    /// Returns `true` if the entry already carries its target name.
    pub fn is_noop(&self) -> bool {
        self.from == self.to
    }
}

/// An ordered mapping from existing paths to their new paths.
///
/// Plans are computed fresh for every preview and never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenamePlan {
    moves: Vec<Rename>,
}

impl RenamePlan {
    pub fn iter(&self) -> std::slice::Iter<'_, Rename> {
        self.moves.iter()
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    /// The planned target of `from`, if `from` is part of the plan.
    pub fn target_of(&self, from: &Path) -> Option<&Path> {
        self.moves
            .iter()
            .find(|m| m.from == from)
            .map(|m| m.to.as_path())
    }

    /// Number of entries whose name actually changes.
    pub fn pending(&self) -> usize {
        self.moves.iter().filter(|m| !m.is_noop()).count()
    }

    /// Fails if two entries share a target.
    pub fn ensure_unique_targets(&self) -> CoreResult<()> {
        let mut seen = HashSet::with_capacity(self.moves.len());
        for m in &self.moves {
            if !seen.insert(m.to.as_path()) {
                return Err(CoreError::PlanCollision(m.to.clone()));
            }
        }
        Ok(())
    }
}

impl FromIterator<(PathBuf, PathBuf)> for RenamePlan {
    fn from_iter<T: IntoIterator<Item = (PathBuf, PathBuf)>>(iter: T) -> Self {
        Self {
            moves: iter
                .into_iter()
                .map(|(from, to)| Rename { from, to })
                .collect(),
        }
    }
}

impl<'a> IntoIterator for &'a RenamePlan {
    type Item = &'a Rename;
    type IntoIter = std::slice::Iter<'a, Rename>;

    fn into_iter(self) -> Self::IntoIter {
        self.moves.iter()
    }
}

/// Computes the serial rename plan for `paths`.
///
/// Entries that are neither directories nor files (e.g. dangling symlinks)
/// are left out of the plan.
///
/// # Errors
///
/// - Any error returned by `key`.
/// - [`CoreError::InvalidName`] if the template renders an unusable name.
/// - [`CoreError::PlanCollision`] if a directory and a file end up with the
///   same name.
pub fn plan<K, F>(
    paths: &BTreeSet<PathBuf>,
    mut key: F,
    template: Option<&NameTemplate>,
) -> CoreResult<RenamePlan>
where
    K: Ord,
    F: FnMut(&Path) -> CoreResult<K>,
{
    let dirs = sorted(paths.iter().filter(|p| p.is_dir()), &mut key)?;
    let files = sorted(paths.iter().filter(|p| p.is_file()), &mut key)?;

    let dir_pattern = template::resolve(template, template::digit_count(dirs.len()));
    let file_pattern = template::resolve(template, template::digit_count(files.len()));

    let mut moves = Vec::with_capacity(dirs.len() + files.len());
    for (i, dir) in dirs.into_iter().enumerate() {
        let name = template::render(&dir_pattern, i + 1);
        ensure_valid(&name)?;
        let to = dir.with_file_name(&name);
        moves.push(Rename { from: dir, to });
    }
    for (i, file) in files.into_iter().enumerate() {
        let stem = template::render(&file_pattern, i + 1);
        ensure_valid(&stem)?;
        let mut name = OsString::from(stem);
        if let Some(ext) = file.extension() {
            name.push(".");
            name.push(ext);
        }
        let to = file.with_file_name(name);
        moves.push(Rename { from: file, to });
    }

    let plan = RenamePlan { moves };
    plan.ensure_unique_targets()?;
    Ok(plan)
}

fn sorted<'a, I, K, F>(paths: I, key: &mut F) -> CoreResult<Vec<PathBuf>>
where
    I: Iterator<Item = &'a PathBuf>,
    K: Ord,
    F: FnMut(&Path) -> CoreResult<K>,
{
    let mut keyed = paths
        .map(|p| Ok((key(p)?, p.clone())))
        .collect::<CoreResult<Vec<_>>>()?;
    keyed.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(keyed.into_iter().map(|(_, p)| p).collect())
}

fn ensure_valid(name: &str) -> CoreResult<()> {
    if is_valid_filename(name) {
        Ok(())
    } else {
        Err(CoreError::InvalidName(name.to_string()))
    }
}

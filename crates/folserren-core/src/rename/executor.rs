//! Applies a [`RenamePlan`] one entry at a time without clobbering.
//!
//! An entry whose target is still occupied by another source of the plan
//! is first moved to a temporary `<stem>(n)<suffix>` name and only moved to
//! its target in a second pass, after every direct rename has vacated its
//! old name. A failed rename aborts the batch; renames already applied stay
//! applied.

use std::collections::{BTreeSet, HashSet};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::error::CoreResult;
use crate::fs::ops::rename_entry;
use crate::monitor::Monitor;

use super::plan::RenamePlan;

/// Counts of what a rename batch did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenameReport {
    /// Entries moved to their target name.
    pub renamed: usize,
    /// Entries that already had their target name.
    pub unchanged: usize,
    /// Entries that went through a temporary name first.
    pub deferred: usize,
}

/// Applies `plan` to disk and then persists the monitor's new state.
///
/// The monitor's live watch set seeds the names temporary renames must
/// avoid; its [`update`](Monitor::update) runs once every rename landed so
/// the next check does not report the renames as removals and additions.
pub fn apply<M: Monitor>(plan: &RenamePlan, monitor: &mut M) -> CoreResult<RenameReport> {
    let live = monitor.paths()?;
    let report = apply_renames(plan, &live)?;
    monitor.update()?;
    Ok(report)
}

/// Applies `plan` to disk, avoiding every name in `live`.
pub fn apply_renames(plan: &RenamePlan, live: &BTreeSet<PathBuf>) -> CoreResult<RenameReport> {
    let sources: HashSet<&Path> = plan.iter().map(|m| m.from.as_path()).collect();
    let mut temporaries: HashSet<PathBuf> = HashSet::new();
    let mut deferred: Vec<(PathBuf, &Path)> = Vec::new();
    let mut report = RenameReport::default();

    for m in plan {
        if m.is_noop() {
            report.unchanged += 1;
            continue;
        }
        if sources.contains(m.to.as_path()) {
            let temp = temporary_name(&m.from, live, &temporaries);
            rename_entry(&m.from, &temp)?;
            temporaries.insert(temp.clone());
            deferred.push((temp, m.to.as_path()));
        } else {
            rename_entry(&m.from, &m.to)?;
            report.renamed += 1;
        }
    }

    for (temp, to) in deferred {
        rename_entry(&temp, to)?;
        report.renamed += 1;
        report.deferred += 1;
    }

    Ok(report)
}

/// Finds the first free `<stem>(n)<suffix>` sibling of `path`, counting from 1.
fn temporary_name(path: &Path, live: &BTreeSet<PathBuf>, taken: &HashSet<PathBuf>) -> PathBuf {
    let stem = path.file_stem().unwrap_or_default();

    let mut n: u64 = 1;
    loop {
        let mut name = OsString::from(stem);
        name.push(format!("({n})"));
        if let Some(ext) = path.extension() {
            name.push(".");
            name.push(ext);
        }
        let candidate = path.with_file_name(name);
        let free = !live.contains(&candidate)
            && !taken.contains(&candidate)
            && std::fs::symlink_metadata(&candidate).is_err();
        if free {
            return candidate;
        }
        n += 1;
    }
}

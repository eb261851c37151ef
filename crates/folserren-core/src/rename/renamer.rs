//! The serial renamer: a [`Monitor`] plus a naming template and an order.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::error::{CoreError, CoreResult};
use crate::fs::ops::is_ancestor;
use crate::monitor::{Change, FolderMonitor, Monitor, Snapshot};

use super::executor::{self, RenameReport};
use super::order::PathOrder;
use super::plan::{self, RenamePlan};
use super::template::NameTemplate;

/// Renames the entries of a watched directory into a numbered sequence.
///
/// The renamer forwards the whole [`Monitor`] interface to the monitor it
/// owns, so it can be checked, updated and scoped like one.
///
/// # Examples
///
/// ```no_run
/// use folserren_core::{FolderMonitor, Monitor, PathOrder, SerialRenamer, WatchMode};
/// use std::path::Path;
///
/// let monitor = FolderMonitor::open(Path::new("photos"), WatchMode::Files, None)?;
/// let mut renamer = SerialRenamer::new(monitor)
///     .with_template("img_")
///     .with_order(PathOrder::Modified);
///
/// for m in renamer.preview()?.iter() {
///     println!("{} -> {}", m.from.display(), m.to.display());
/// }
/// renamer.rename(true, None)?;
/// # Ok::<(), folserren_core::CoreError>(())
/// ```
#[derive(Debug)]
pub struct SerialRenamer<M: Monitor = FolderMonitor> {
    monitor: M,
    template: Option<NameTemplate>,
    order: PathOrder,
}

impl<M: Monitor> SerialRenamer<M> {
    /// Creates a renamer with the default template and name order.
    pub fn new(monitor: M) -> Self {
        Self {
            monitor,
            template: None,
            order: PathOrder::default(),
        }
    }

    /// Sets the naming template. See [`NameTemplate`] for the placeholder syntax.
    #[must_use]
    pub fn with_template(self, template: &str) -> Self {
        Self {
            template: Some(NameTemplate::parse(template)),
            ..self
        }
    }

    #[must_use]
    pub fn with_order(self, order: PathOrder) -> Self {
        Self { order, ..self }
    }

    pub fn template(&self) -> Option<&NameTemplate> {
        self.template.as_ref()
    }

    pub fn order(&self) -> PathOrder {
        self.order
    }

    pub fn monitor(&self) -> &M {
        &self.monitor
    }

    pub fn into_monitor(self) -> M {
        self.monitor
    }

    /// Computes the rename plan for the current directory contents.
    pub fn preview(&self) -> CoreResult<RenamePlan> {
        let order = self.order;
        self.preview_by(|p| order.key(p))
    }

    /// Computes the rename plan using a caller-supplied sort key.
    pub fn preview_by<K, F>(&self, key: F) -> CoreResult<RenamePlan>
    where
        K: Ord,
        F: FnMut(&Path) -> CoreResult<K>,
    {
        let paths = self.monitor.paths()?;
        plan::plan(&paths, key, self.template.as_ref())
    }

    /// Renames the watched entries.
    ///
    /// With `only_when_changed`, nothing happens unless [`Monitor::check`]
    /// reports a pending change. `preview` should be a plan obtained from
    /// [`preview`](Self::preview); when `None` a fresh plan is computed.
    ///
    /// # Errors
    ///
    /// - [`CoreError::ForeignPath`] — `preview` touches paths outside the
    ///   watched directory.
    /// - [`CoreError::PlanCollision`] — `preview` maps two entries to one name.
    /// - Any filesystem error; renames applied before it are kept.
    pub fn rename(
        &mut self,
        only_when_changed: bool,
        preview: Option<RenamePlan>,
    ) -> CoreResult<RenameReport> {
        if only_when_changed && !self.monitor.check()? {
            tracing::debug!(
                "no pending change in {}, skipping rename",
                self.monitor.path().display()
            );
            return Ok(RenameReport::default());
        }

        let plan = match preview {
            Some(plan) => {
                self.validate(&plan)?;
                plan
            }
            None => self.preview()?,
        };

        let report = executor::apply(&plan, &mut self.monitor)?;
        tracing::info!(
            "renamed {} entries in {} ({} unchanged, {} via temporary names)",
            report.renamed,
            self.monitor.path().display(),
            report.unchanged,
            report.deferred
        );
        Ok(report)
    }

    fn validate(&self, plan: &RenamePlan) -> CoreResult<()> {
        let root = self.monitor.path();
        for m in plan {
            for path in [&m.from, &m.to] {
                if !is_ancestor(root, path)? || path.parent() != Some(root) {
                    return Err(CoreError::ForeignPath(path.clone()));
                }
            }
        }
        plan.ensure_unique_targets()
    }
}

impl<M: Monitor> Monitor for SerialRenamer<M> {
    fn check(&mut self) -> CoreResult<bool> {
        self.monitor.check()
    }

    fn difference(&self) -> (usize, &[Change]) {
        self.monitor.difference()
    }

    fn entries(&self, filter: &dyn Fn(&Path) -> bool) -> CoreResult<Vec<PathBuf>> {
        self.monitor.entries(filter)
    }

    fn update_cache(&mut self) -> CoreResult<()> {
        self.monitor.update_cache()
    }

    fn update_cache_file(&mut self) -> CoreResult<()> {
        self.monitor.update_cache_file()
    }

    fn update(&mut self) -> CoreResult<()> {
        self.monitor.update()
    }

    fn snapshot(&self) -> &Snapshot {
        self.monitor.snapshot()
    }

    fn cache_file(&self) -> &Path {
        self.monitor.cache_file()
    }

    fn path(&self) -> &Path {
        self.monitor.path()
    }

    fn paths(&self) -> CoreResult<BTreeSet<PathBuf>> {
        self.monitor.paths()
    }
}

//! Serial renaming of a watched directory's entries.
//!
//! - [`order`] — sort keys entries are numbered by.
//! - [`template`] — the naming template and digit widths.
//! - [`plan`] — computing the old → new mapping ([`RenamePlan`]).
//! - [`executor`] — applying a plan without clobbering entries.
//! - [`renamer`] — [`SerialRenamer`], which ties them to a [`Monitor`](crate::Monitor).

pub mod executor;
pub mod order;
pub mod plan;
pub mod renamer;
pub mod template;

pub use executor::RenameReport;
pub use order::{PathOrder, SortKey};
pub use plan::{Rename, RenamePlan};
pub use renamer::SerialRenamer;
pub use template::NameTemplate;

//! File system helpers for folserren.
//!
//! [`ops`] validates paths, enumerates a directory's immediate children and
//! performs single non-clobbering renames; [`stamp`] reads the nanosecond
//! timestamps that snapshots compare.

pub mod ops;
pub mod stamp;

pub use ops::PathKind;
pub use stamp::EntryStamp;

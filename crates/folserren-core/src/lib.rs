//! folserren core library: change detection and serial renaming.
//!
//! `folserren-core` watches the immediate children of one directory by
//! polling, and uses detected drift to renumber those children into a
//! zero-padded sequence (`01.jpg`, `02.jpg`, ...). It performs no OS event
//! subscription; callers drive it by calling [`Monitor::check`].
//!
//! # Modules
//!
//! - [`monitor`] — [`Monitor`] trait, [`FolderMonitor`], snapshots and the scope guard.
//! - [`rename`] — sort orders, name templates, plans and the [`SerialRenamer`].
//! - [`fs`] — path validation, enumeration, non-clobbering renames, timestamps.
//! - [`config`] — TOML runner configuration.
//! - [`error`] — Unified error type ([`CoreError`]) and result alias ([`CoreResult`]).

pub mod config;
pub mod error;
pub mod fs;
pub mod monitor;
pub mod rename;

pub use config::settings::{Config, FolderConfig};
pub use error::{CoreError, CoreResult};
pub use fs::ops::{check_path, is_ancestor, PathKind};
pub use fs::EntryStamp;
pub use monitor::{
    Change, ChangeKind, FolderMonitor, Monitor, Snapshot, UpdateGuard, WatchMode,
    DEFAULT_CACHE_DIR,
};
pub use rename::{
    NameTemplate, PathOrder, Rename, RenamePlan, RenameReport, SerialRenamer, SortKey,
};

//! Error types for `folserren-core`.
//!
//! All fallible operations in the core library return [`CoreResult<T>`],
//! which is an alias for `Result<T, CoreError>`.

use std::path::PathBuf;

use crate::fs::ops::PathKind;

/// Unified error type for all core operations.
///
/// Each variant captures just enough context for the caller to display
/// a meaningful message or take corrective action.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// The target path does not exist.
    #[error("path not found: {0}")]
    NotFound(PathBuf),

    /// The path exists but is not of the expected kind.
    #[error("{path} is not a {expected}")]
    WrongPathKind { path: PathBuf, expected: PathKind },

    /// A directory was expected but the path points to something else.
    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),

    /// The process lacks permission to access the path.
    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// A generated file or directory name is not a valid path component.
    #[error("invalid name: {0}")]
    InvalidName(String),

    /// A rename target is occupied by an entry that is not going to move.
    #[error("rename target already exists: {0}")]
    TargetExists(PathBuf),

    /// Two entries of a rename plan resolve to the same target.
    #[error("rename plan maps more than one entry to {0}")]
    PlanCollision(PathBuf),

    /// A rename plan references a path outside the watched directory.
    #[error("path is outside the watched directory: {0}")]
    ForeignPath(PathBuf),

    /// Failed to parse a TOML configuration file.
    #[error("config parse error: {0}")]
    ConfigParse(String),

    /// The snapshot could not be serialized for the cache file.
    #[error("cache encode error: {0}")]
    CacheEncode(String),

    /// An I/O error that doesn't fit a more specific variant.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout `folserren-core`.
pub type CoreResult<T> = Result<T, CoreError>;

//! Error types for lockfile generation.

use std::path::PathBuf;
use thiserror::Error;

/// Stable error codes, one per [`Error`] variant.
pub mod codes {
    pub const RELOCK_IO_ERROR: &str = "RELOCK_IO_ERROR";
    pub const RELOCK_MANIFEST_READ_FAILED: &str = "RELOCK_MANIFEST_READ_FAILED";
    pub const RELOCK_MANIFEST_INVALID: &str = "RELOCK_MANIFEST_INVALID";
    pub const RELOCK_MANIFEST_NOT_FOUND: &str = "RELOCK_MANIFEST_NOT_FOUND";
    /// A `requires` name could not be located on disk during expansion.
    pub const RELOCK_DEP_NOT_INSTALLED: &str = "RELOCK_DEP_NOT_INSTALLED";
    /// A `requires` edge could not be resolved during classification.
    pub const RELOCK_REQUIRE_UNRESOLVED: &str = "RELOCK_REQUIRE_UNRESOLVED";
    pub const RELOCK_YARN_LOCK_READ_FAILED: &str = "RELOCK_YARN_LOCK_READ_FAILED";
    pub const RELOCK_YARN_LOCK_CONFLICT: &str = "RELOCK_YARN_LOCK_CONFLICT";
    pub const RELOCK_YARN_LOCK_MERGE: &str = "RELOCK_YARN_LOCK_MERGE";
    pub const RELOCK_LOCKFILE_SERIALIZE_FAILED: &str = "RELOCK_LOCKFILE_SERIALIZE_FAILED";
    pub const RELOCK_LOCKFILE_WRITE_FAILED: &str = "RELOCK_LOCKFILE_WRITE_FAILED";
}

/// Core error type for relock operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read manifest at {path}: {source}")]
    ManifestRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse manifest at {path}: {source}")]
    ManifestParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("package.json not found in {dir}")]
    ManifestNotFound { dir: PathBuf },

    #[error("Package {name} not found (starting from {from})")]
    DependencyNotInstalled { name: String, from: PathBuf },

    #[error("Internal error: failed to resolve entry for {parent} -> {name}")]
    UnresolvedRequire { parent: String, name: String },

    #[error("Failed to read yarn.lock at {path}: {source}")]
    YarnLockRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse yarn.lock at {path}: resolve git conflicts before continuing")]
    YarnLockConflict { path: PathBuf },

    #[error("Failed to parse yarn.lock at {path}: complete git merge before continuing")]
    YarnLockMerge { path: PathBuf },

    #[error("Failed to serialize lockfile: {0}")]
    LockfileSerialize(#[from] serde_json::Error),

    #[error("Failed to write lockfile at {path}: {source}")]
    LockfileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Get the stable error code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Io { .. } => codes::RELOCK_IO_ERROR,
            Self::ManifestRead { .. } => codes::RELOCK_MANIFEST_READ_FAILED,
            Self::ManifestParse { .. } => codes::RELOCK_MANIFEST_INVALID,
            Self::ManifestNotFound { .. } => codes::RELOCK_MANIFEST_NOT_FOUND,
            Self::DependencyNotInstalled { .. } => codes::RELOCK_DEP_NOT_INSTALLED,
            Self::UnresolvedRequire { .. } => codes::RELOCK_REQUIRE_UNRESOLVED,
            Self::YarnLockRead { .. } => codes::RELOCK_YARN_LOCK_READ_FAILED,
            Self::YarnLockConflict { .. } => codes::RELOCK_YARN_LOCK_CONFLICT,
            Self::YarnLockMerge { .. } => codes::RELOCK_YARN_LOCK_MERGE,
            Self::LockfileSerialize(_) => codes::RELOCK_LOCKFILE_SERIALIZE_FAILED,
            Self::LockfileWrite { .. } => codes::RELOCK_LOCKFILE_WRITE_FAILED,
        }
    }

    /// Whether this error signals an inconsistency between the installed tree
    /// and the graph built from it.
    #[must_use]
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            Self::DependencyNotInstalled { .. } | Self::UnresolvedRequire { .. }
        )
    }
}

/// Result alias for relock operations.
pub type Result<T> = std::result::Result<T, Error>;

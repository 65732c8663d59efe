//! Lockfile generation for one root and for batches of roots.

use rayon::prelude::*;
use std::path::{Path, PathBuf};

use crate::builder::TreeBuilder;
use crate::classify::classify;
use crate::config::Config;
use crate::entry::TreeStats;
use crate::error::{Error, Result};
use crate::lockfile::{self, PackageLock};
use crate::manifest::ManifestReader;
use crate::manifest_cache::MemoryManifestCache;
use crate::meta::MetaResolver;
use crate::prior::{read_prior, PriorSource};
use crate::yarn::YarnLockStore;

/// Caches shared read-only by every root of a batch.
#[derive(Debug, Default)]
pub struct SharedCaches {
    pub manifests: MemoryManifestCache,
    pub yarn_locks: YarnLockStore,
}

impl SharedCaches {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// A lockfile computed for one root.
#[derive(Debug, Clone)]
pub struct Generated {
    /// Canonical root directory.
    pub dir: PathBuf,
    pub lockfile_path: PathBuf,
    pub stats: TreeStats,
    /// Where the previous contents were merged from.
    pub prior: PriorSource,
    /// Why the committed previous contents could not be used.
    pub git_error: Option<String>,
    /// The rendered lockfile.
    pub content: String,
    /// Whether `content` was written to `lockfile_path`.
    pub written: bool,
}

/// Outcome for one root of a batch.
#[derive(Debug)]
pub enum RootOutcome {
    Generated(Generated),
    /// The directory has no manifest.
    Skipped { dir: PathBuf },
    Failed { dir: PathBuf, error: Error },
}

impl RootOutcome {
    /// Directory the outcome refers to.
    #[must_use]
    pub fn dir(&self) -> &Path {
        match self {
            Self::Generated(generated) => &generated.dir,
            Self::Skipped { dir } | Self::Failed { dir, .. } => dir,
        }
    }

    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Build, classify, merge and (unless dry-running) write the lockfile of
/// `dir`.
///
/// Returns `Ok(None)` when `dir` has no manifest.
pub fn generate_lockfile(dir: &Path, config: &Config, caches: &SharedCaches) -> Result<Option<Generated>> {
    let meta = MetaResolver::for_root(config.metadata, dir, &caches.yarn_locks)?;
    let builder = TreeBuilder::new(ManifestReader::new(&caches.manifests), &meta);

    let Some(mut resolved) = builder.build(dir)? else {
        return Ok(None);
    };
    classify(&mut resolved.tree, &resolved.manifest)?;

    let computed = PackageLock::new(&resolved).to_value()?;
    let lockfile_path = lockfile::lockfile_path(&resolved.root_dir);
    let prior = read_prior(&lockfile_path, config.use_git)?;
    let content = lockfile::render(prior.to_value(), computed)?;

    if !config.dry_run {
        lockfile::write_lockfile(&lockfile_path, &content)?;
    }

    Ok(Some(Generated {
        stats: resolved.tree.stats(),
        dir: resolved.root_dir,
        lockfile_path,
        prior: prior.source,
        git_error: prior.git_error,
        content,
        written: !config.dry_run,
    }))
}

/// Generate lockfiles for every directory in `dirs`.
///
/// Roots run in parallel and independently: one failing root does not stop
/// the others. Outcomes are returned in input order. Relative directories
/// resolve against `config.cwd`.
#[must_use]
pub fn update_locks(dirs: &[PathBuf], config: &Config, caches: &SharedCaches) -> Vec<RootOutcome> {
    dirs.par_iter()
        .map(|dir| {
            let dir = config.resolve_dir(dir);
            match generate_lockfile(&dir, config, caches) {
                Ok(Some(generated)) => RootOutcome::Generated(generated),
                Ok(None) => RootOutcome::Skipped { dir },
                Err(error) => RootOutcome::Failed { dir, error },
            }
        })
        .collect()
}

/// Every immediate subdirectory of a packages directory, sorted by name.
pub fn package_dirs(packages_dir: &Path) -> Result<Vec<PathBuf>> {
    relock_util::fs::list_subdirectories(packages_dir).map_err(|source| Error::Io {
        path: packages_dir.to_path_buf(),
        source,
    })
}

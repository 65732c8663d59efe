//! Provenance metadata (`resolved`, `integrity`) for installed packages.

use std::path::Path;
use std::sync::Arc;

use crate::config::MetadataSource;
use crate::error::Result;
use crate::manifest::Manifest;
use crate::yarn::{YarnLock, YarnLockStore};

/// Download reference and integrity digest of one installed package.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetaInfo {
    pub resolved: Option<String>,
    pub integrity: Option<String>,
}

impl MetaInfo {
    fn is_complete(&self) -> bool {
        self.resolved.is_some() && self.integrity.is_some()
    }
}

/// Resolves metadata for the packages of one root.
#[derive(Debug, Clone, Default)]
pub struct MetaResolver {
    yarn_lock: Option<Arc<YarnLock>>,
}

impl MetaResolver {
    /// Resolver that only reads installer-embedded manifest fields.
    #[must_use]
    pub fn manifest_only() -> Self {
        Self::default()
    }

    /// Resolver falling back to the given yarn lockfile.
    #[must_use]
    pub fn with_yarn_lock(yarn_lock: Arc<YarnLock>) -> Self {
        Self {
            yarn_lock: Some(yarn_lock),
        }
    }

    /// Resolver for the packages under `root`.
    ///
    /// With [`MetadataSource::Yarn`] the nearest `yarn.lock` at or above
    /// `root` is loaded through `store`; a missing lockfile is not an error.
    pub fn for_root(source: MetadataSource, root: &Path, store: &YarnLockStore) -> Result<Self> {
        let yarn_lock = match source {
            MetadataSource::Manifest => None,
            MetadataSource::Yarn => store.for_root(root)?,
        };
        Ok(Self { yarn_lock })
    }

    /// Metadata for an installed package, given its manifest and the name
    /// it was required under.
    ///
    /// Fields missing from the manifest are filled from the yarn lockfile
    /// entry with the same name and exact version. The manifest's own `name`
    /// wins over `required_as`. Fields found nowhere are left empty.
    #[must_use]
    pub fn resolve(&self, required_as: &str, manifest: &Manifest) -> MetaInfo {
        let mut meta = MetaInfo {
            resolved: manifest.resolved.clone(),
            integrity: manifest.integrity.clone(),
        };
        if meta.is_complete() {
            return meta;
        }

        let Some(lock) = &self.yarn_lock else {
            return meta;
        };
        let name = manifest.name.as_deref().unwrap_or(required_as);
        let version = manifest.version.as_deref().unwrap_or_default();
        if let Some(found) = lock.find(name, version) {
            if meta.resolved.is_none() {
                meta.resolved = found.resolved.as_deref().map(strip_fragment);
            }
            if meta.integrity.is_none() {
                meta.integrity = found.integrity.clone();
            }
        }
        meta
    }
}

/// Drop a `#fragment` suffix (yarn appends the tarball hash there).
fn strip_fragment(url: &str) -> String {
    url.split_once('#').map_or(url, |(base, _)| base).to_string()
}

//! Package manifest (`package.json`) access.
//!
//! Only the fields lockfile generation needs are parsed. Dependency groups keep
//! their declaration order because expansion order depends on it.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::manifest_cache::{CachedManifest, ManifestCache};

/// Manifest filename.
pub const MANIFEST_NAME: &str = "package.json";

/// Mapping from dependency name to declared range, in declaration order.
pub type DepMap = IndexMap<String, String>;

/// A dependency group declared by a manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DepGroup {
    Production,
    Development,
    Optional,
    Peer,
}

/// The subset of `package.json` used for lockfile generation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Manifest {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub version: Option<String>,
    #[serde(default, deserialize_with = "dep_map")]
    pub dependencies: DepMap,
    #[serde(default, rename = "devDependencies", deserialize_with = "dep_map")]
    pub dev_dependencies: DepMap,
    #[serde(default, rename = "optionalDependencies", deserialize_with = "dep_map")]
    pub optional_dependencies: DepMap,
    #[serde(default, rename = "peerDependencies", deserialize_with = "dep_map")]
    pub peer_dependencies: DepMap,
    /// Download reference recorded by the installer.
    #[serde(default, rename = "_resolved", deserialize_with = "lenient_string")]
    pub resolved: Option<String>,
    /// Integrity digest recorded by the installer.
    #[serde(default, rename = "_integrity", deserialize_with = "lenient_string")]
    pub integrity: Option<String>,
}

impl Manifest {
    /// Parse a manifest from JSON text.
    pub fn from_json(content: &str) -> serde_json::Result<Self> {
        serde_json::from_str(content)
    }

    /// Dependencies declared in one group.
    #[must_use]
    pub fn group(&self, group: DepGroup) -> &DepMap {
        match group {
            DepGroup::Production => &self.dependencies,
            DepGroup::Development => &self.dev_dependencies,
            DepGroup::Optional => &self.optional_dependencies,
            DepGroup::Peer => &self.peer_dependencies,
        }
    }

    /// Names declared in any of `groups`, first declaration position wins.
    #[must_use]
    pub fn names_in(&self, groups: &[DepGroup]) -> Vec<String> {
        let mut names: IndexMap<&str, ()> = IndexMap::new();
        for group in groups {
            for name in self.group(*group).keys() {
                names.insert(name, ());
            }
        }
        names.into_keys().map(String::from).collect()
    }

    /// Every declared dependency that could appear in `requires`.
    ///
    /// Production, optional and peer dependencies always count; development
    /// dependencies only when `include_dev` is set (the root package). A name
    /// declared in several groups keeps its first position and the range of
    /// the last group declaring it.
    #[must_use]
    pub fn declared_requires(&self, include_dev: bool) -> DepMap {
        let mut requires = DepMap::new();
        let mut groups = vec![DepGroup::Production, DepGroup::Optional, DepGroup::Peer];
        if include_dev {
            groups.push(DepGroup::Development);
        }
        for group in groups {
            for (name, range) in self.group(group) {
                requires.insert(name.clone(), range.clone());
            }
        }
        requires
    }
}

/// Accept a string, treat anything else as absent.
fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        _ => None,
    })
}

/// Accept an object of string ranges; ignore non-string ranges and non-objects.
fn dep_map<'de, D>(deserializer: D) -> std::result::Result<DepMap, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let Some(Value::Object(obj)) = value else {
        return Ok(DepMap::new());
    };

    Ok(obj
        .into_iter()
        .filter_map(|(name, range)| match range {
            Value::String(range) => Some((name, range)),
            _ => None,
        })
        .collect())
}

/// Memoized manifest reader.
///
/// Reads go through the supplied cache, so a manifest (or its absence) is
/// parsed at most once per cache lifetime.
#[derive(Debug, Clone, Copy)]
pub struct ManifestReader<'a> {
    cache: &'a dyn ManifestCache,
}

impl<'a> ManifestReader<'a> {
    #[must_use]
    pub fn new(cache: &'a dyn ManifestCache) -> Self {
        Self { cache }
    }

    /// Read the manifest in `dir`, failing if it does not exist.
    pub fn read(&self, dir: &Path) -> Result<Arc<Manifest>> {
        self.read_if_exists(dir)?
            .ok_or_else(|| Error::ManifestNotFound {
                dir: dir.to_path_buf(),
            })
    }

    /// Read the manifest in `dir`, returning `None` if it does not exist.
    pub fn read_if_exists(&self, dir: &Path) -> Result<Option<Arc<Manifest>>> {
        let path = manifest_path(dir);

        if let Some(cached) = self.cache.get(&path) {
            return Ok(cached.into_option());
        }

        let content = relock_util::fs::read_to_string_if_exists(&path).map_err(|source| {
            Error::ManifestRead {
                path: path.clone(),
                source,
            }
        })?;

        let Some(content) = content else {
            self.cache.set(&path, CachedManifest::Missing);
            return Ok(None);
        };

        let manifest = Arc::new(
            Manifest::from_json(&content).map_err(|source| Error::ManifestParse {
                path: path.clone(),
                source,
            })?,
        );
        self.cache
            .set(&path, CachedManifest::Present(Arc::clone(&manifest)));
        Ok(Some(manifest))
    }
}

/// Path of the manifest file inside a package directory.
#[must_use]
pub fn manifest_path(dir: &Path) -> PathBuf {
    dir.join(MANIFEST_NAME)
}

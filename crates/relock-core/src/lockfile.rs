//! `package-lock.json` assembly and persistence.

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::builder::ResolvedTree;
use crate::error::{Error, Result};
use crate::merge::merge;
use crate::version::LOCKFILE_VERSION;

/// Lockfile filename.
pub const LOCKFILE_NAME: &str = "package-lock.json";

/// Path of the lockfile inside a root directory.
#[must_use]
pub fn lockfile_path(root_dir: &Path) -> PathBuf {
    root_dir.join(LOCKFILE_NAME)
}

/// Serializable lockfile for one resolved root.
pub struct PackageLock<'a> {
    resolved: &'a ResolvedTree,
}

impl<'a> PackageLock<'a> {
    #[must_use]
    pub fn new(resolved: &'a ResolvedTree) -> Self {
        Self { resolved }
    }

    /// The lockfile as a JSON value, keys in output order.
    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

impl Serialize for PackageLock<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let manifest = &self.resolved.manifest;
        let mut map = serializer.serialize_map(None)?;
        if let Some(name) = &manifest.name {
            map.serialize_entry("name", name)?;
        }
        if let Some(version) = &manifest.version {
            map.serialize_entry("version", version)?;
        }
        map.serialize_entry("lockfileVersion", &LOCKFILE_VERSION)?;
        map.serialize_entry("requires", &true)?;
        map.serialize_entry("dependencies", &self.resolved.tree.root_dependencies())?;
        map.end()
    }
}

/// Merge `computed` into `previous` and render it with 2-space indentation.
///
/// No trailing newline is added.
pub fn render(previous: Value, computed: Value) -> Result<String> {
    Ok(serde_json::to_string_pretty(&merge(previous, computed))?)
}

/// Atomically replace the lockfile at `path`.
pub fn write_lockfile(path: &Path, content: &str) -> Result<()> {
    relock_util::fs::atomic_write(path, content.as_bytes()).map_err(|source| {
        Error::LockfileWrite {
            path: path.to_path_buf(),
            source,
        }
    })
}

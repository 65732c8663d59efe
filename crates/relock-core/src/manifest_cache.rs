//! Package.json parse cache trait.
//!
//! One cache is shared read-through by every root of a batch, so manifests
//! under shared ancestor directories are parsed once.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use crate::manifest::Manifest;

/// A memoized manifest lookup result.
#[derive(Debug, Clone)]
pub enum CachedManifest {
    /// The manifest exists and parsed successfully.
    Present(Arc<Manifest>),
    /// No manifest file exists at the path.
    Missing,
}

impl CachedManifest {
    #[must_use]
    pub fn into_option(self) -> Option<Arc<Manifest>> {
        match self {
            Self::Present(manifest) => Some(manifest),
            Self::Missing => None,
        }
    }
}

/// Trait for caching parsed package.json files.
///
/// Implementations should be thread-safe (Send + Sync).
pub trait ManifestCache: Send + Sync + std::fmt::Debug {
    /// Look up a cached manifest by the path of its `package.json`.
    fn get(&self, path: &Path) -> Option<CachedManifest>;

    /// Store a lookup result in the cache.
    fn set(&self, path: &Path, entry: CachedManifest);
}

/// No-op cache implementation (always misses, never stores).
#[derive(Debug, Clone, Copy, Default)]
pub struct NoManifestCache;

impl ManifestCache for NoManifestCache {
    fn get(&self, _path: &Path) -> Option<CachedManifest> {
        None
    }

    fn set(&self, _path: &Path, _entry: CachedManifest) {}
}

/// In-memory cache living for one process invocation.
#[derive(Debug, Default)]
pub struct MemoryManifestCache {
    entries: RwLock<HashMap<PathBuf, CachedManifest>>,
}

impl MemoryManifestCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of memoized paths (present or missing).
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ManifestCache for MemoryManifestCache {
    fn get(&self, path: &Path) -> Option<CachedManifest> {
        self.entries.read().ok()?.get(path).cloned()
    }

    fn set(&self, path: &Path, entry: CachedManifest) {
        // A poisoned lock only costs a re-read later
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(path.to_path_buf(), entry);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_cache_always_misses() {
        let cache = NoManifestCache;
        let path = Path::new("/fake/package.json");

        assert!(cache.get(path).is_none());
        cache.set(path, CachedManifest::Missing);
        assert!(cache.get(path).is_none());
    }

    #[test]
    fn test_memory_cache_stores_missing() {
        let cache = MemoryManifestCache::new();
        let path = Path::new("/fake/package.json");
        assert!(cache.is_empty());

        cache.set(path, CachedManifest::Missing);

        assert!(matches!(cache.get(path), Some(CachedManifest::Missing)));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_memory_cache_shared_across_threads() {
        let cache = Arc::new(MemoryManifestCache::new());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    let path = PathBuf::from(format!("/fake/{i}/package.json"));
                    cache.set(&path, CachedManifest::Present(Arc::new(Manifest::default())));
                    cache.get(&path).is_some()
                })
            })
            .collect();

        for handle in handles {
            assert!(handle.join().unwrap());
        }
        assert_eq!(cache.len(), 4);
    }
}

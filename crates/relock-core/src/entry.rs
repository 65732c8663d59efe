//! Resolved dependency graph.
//!
//! Entries live in an arena and are addressed by [`EntryId`]. Identity (the
//! arena slot) is separate from placement (the `dependencies` map of the
//! entry it is nested under), so one entry can be reached through `requires`
//! edges from many requirers while being placed exactly once.

use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::path::PathBuf;

use crate::manifest::DepMap;

/// Stable handle to an entry in an [`EntryTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryId(usize);

impl EntryId {
    /// The root entry of every tree.
    pub const ROOT: EntryId = EntryId(0);

    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// One resolved package version at one position in the tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Entry {
    /// Name the entry is placed under (the root uses its manifest name).
    pub name: String,
    /// Installed directory this entry was built from.
    pub dir: PathBuf,
    pub version: String,
    pub resolved: Option<String>,
    pub integrity: Option<String>,
    /// Installed dependencies, with the range the manifest declares.
    pub requires: DepMap,
    /// Entries nested under this one, in placement order.
    pub dependencies: IndexMap<String, EntryId>,
    pub dev: bool,
    pub optional: bool,
}

/// Counts reported after a build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct TreeStats {
    /// Placed entries, excluding the root.
    pub entries: usize,
    /// Entries placed below another package rather than at the top level.
    pub nested: usize,
    pub dev: usize,
    pub optional: usize,
}

/// Arena of entries; slot 0 is the root.
#[derive(Debug, Clone)]
pub struct EntryTree {
    entries: Vec<Entry>,
}

impl EntryTree {
    #[must_use]
    pub fn new(root: Entry) -> Self {
        Self {
            entries: vec![root],
        }
    }

    #[must_use]
    pub fn root(&self) -> &Entry {
        &self.entries[EntryId::ROOT.0]
    }

    #[must_use]
    pub fn get(&self, id: EntryId) -> &Entry {
        &self.entries[id.0]
    }

    pub fn get_mut(&mut self, id: EntryId) -> &mut Entry {
        &mut self.entries[id.0]
    }

    /// Add an unplaced entry to the arena.
    pub fn push(&mut self, entry: Entry) -> EntryId {
        self.entries.push(entry);
        EntryId(self.entries.len() - 1)
    }

    /// Nest `child` under `owner` as `name`.
    pub fn place(&mut self, owner: EntryId, name: &str, child: EntryId) {
        self.entries[owner.0]
            .dependencies
            .insert(name.to_string(), child);
    }

    /// Entry placed directly under `owner` as `name`.
    #[must_use]
    pub fn child(&self, owner: EntryId, name: &str) -> Option<EntryId> {
        self.entries[owner.0].dependencies.get(name).copied()
    }

    /// Number of entries including the root.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.len() <= 1
    }

    /// Every placed entry below the root, depth-first in placement order.
    #[must_use]
    pub fn placed(&self) -> Vec<EntryId> {
        let mut out = Vec::with_capacity(self.entries.len().saturating_sub(1));
        let mut stack: Vec<EntryId> = self.root().dependencies.values().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.get(id).dependencies.values().rev().copied());
        }
        out
    }

    #[must_use]
    pub fn stats(&self) -> TreeStats {
        let top_level = self.root().dependencies.len();
        let mut stats = TreeStats::default();
        for id in self.placed() {
            let entry = self.get(id);
            stats.entries += 1;
            stats.dev += usize::from(entry.dev);
            stats.optional += usize::from(entry.optional);
        }
        stats.nested = stats.entries - top_level;
        stats
    }

    /// Serializable view of the root's `dependencies` map.
    #[must_use]
    pub fn root_dependencies(&self) -> DependenciesView<'_> {
        DependenciesView {
            tree: self,
            owner: EntryId::ROOT,
        }
    }
}

/// Serializes one entry in lockfile form.
///
/// Empty `requires`/`dependencies`, false flags and absent metadata are
/// omitted.
pub struct EntryView<'a> {
    tree: &'a EntryTree,
    id: EntryId,
}

impl Serialize for EntryView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let entry = self.tree.get(self.id);
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("version", &entry.version)?;
        if let Some(resolved) = &entry.resolved {
            map.serialize_entry("resolved", resolved)?;
        }
        if let Some(integrity) = &entry.integrity {
            map.serialize_entry("integrity", integrity)?;
        }
        if entry.dev {
            map.serialize_entry("dev", &true)?;
        }
        if entry.optional {
            map.serialize_entry("optional", &true)?;
        }
        if !entry.requires.is_empty() {
            map.serialize_entry("requires", &entry.requires)?;
        }
        if !entry.dependencies.is_empty() {
            map.serialize_entry(
                "dependencies",
                &DependenciesView {
                    tree: self.tree,
                    owner: self.id,
                },
            )?;
        }
        map.end()
    }
}

/// Serializes the `dependencies` map of one entry.
pub struct DependenciesView<'a> {
    tree: &'a EntryTree,
    owner: EntryId,
}

impl Serialize for DependenciesView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let deps = &self.tree.get(self.owner).dependencies;
        let mut map = serializer.serialize_map(Some(deps.len()))?;
        for (name, id) in deps {
            map.serialize_entry(
                name,
                &EntryView {
                    tree: self.tree,
                    id: *id,
                },
            )?;
        }
        map.end()
    }
}

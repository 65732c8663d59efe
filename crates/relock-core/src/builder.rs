//! Tree builder: turns an installed `node_modules` tree into an [`EntryTree`].
//!
//! Starting at the root manifest, every `requires` name is located on disk
//! the way a module loader would find it. Each installed directory becomes
//! exactly one entry, placed under the entry owning the `node_modules` area
//! it sits in. When that owner already holds a different version under the
//! same name, the entry is nested under the requiring package instead, so
//! both versions stay resolvable.
//!
//! For each entry all of its requirements are placed first, in declaration
//! order, and only then is each newly placed child expanded, depth-first.
//! Placement is order-sensitive; this order is fixed so repeated builds over
//! the same tree agree.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::entry::{Entry, EntryId, EntryTree};
use crate::error::{Error, Result};
use crate::locate;
use crate::manifest::{Manifest, ManifestReader};
use crate::meta::MetaResolver;

/// Result of building one root.
#[derive(Debug, Clone)]
pub struct ResolvedTree {
    /// Canonical root directory.
    pub root_dir: PathBuf,
    /// The root manifest.
    pub manifest: Arc<Manifest>,
    pub tree: EntryTree,
}

/// Traversal state for one build.
#[derive(Debug, Default)]
struct BuildContext {
    /// Installed directories that already have (or share) an entry.
    visited: HashSet<PathBuf>,
    /// Entry each visited directory resolved to.
    dir_entries: HashMap<PathBuf, EntryId>,
}

/// Builds resolved trees for root directories.
#[derive(Debug, Clone, Copy)]
pub struct TreeBuilder<'a> {
    manifests: ManifestReader<'a>,
    meta: &'a MetaResolver,
}

impl<'a> TreeBuilder<'a> {
    #[must_use]
    pub fn new(manifests: ManifestReader<'a>, meta: &'a MetaResolver) -> Self {
        Self { manifests, meta }
    }

    /// Build the tree for `root_dir`.
    ///
    /// Returns `Ok(None)` when the directory has no manifest.
    pub fn build(&self, root_dir: &Path) -> Result<Option<ResolvedTree>> {
        let root_dir = dunce::canonicalize(root_dir).unwrap_or_else(|_| root_dir.to_path_buf());
        let Some(manifest) = self.manifests.read_if_exists(&root_dir)? else {
            return Ok(None);
        };

        let mut root = new_entry(&root_dir, &manifest, true);
        root.name = manifest.name.clone().unwrap_or_default();
        let mut tree = EntryTree::new(root);

        let mut ctx = BuildContext::default();
        ctx.visited.insert(root_dir.clone());
        ctx.dir_entries.insert(root_dir.clone(), EntryId::ROOT);

        self.expand(&mut tree, &mut ctx, EntryId::ROOT)?;

        Ok(Some(ResolvedTree {
            root_dir,
            manifest,
            tree,
        }))
    }

    /// Place every requirement of `id`, then expand the newly placed ones.
    fn expand(&self, tree: &mut EntryTree, ctx: &mut BuildContext, id: EntryId) -> Result<()> {
        let dir = tree.get(id).dir.clone();
        let names: Vec<String> = tree.get(id).requires.keys().cloned().collect();
        let mut placed = Vec::new();

        for name in names {
            let dep_dir = locate::locate(&dir, &name).ok_or_else(|| Error::DependencyNotInstalled {
                name: name.clone(),
                from: dir.clone(),
            })?;
            if ctx.visited.contains(&dep_dir) {
                continue;
            }

            let manifest = self.manifests.read(&dep_dir)?;
            let mut entry = new_entry(&dep_dir, &manifest, false);
            entry.name.clone_from(&name);
            let meta = self.meta.resolve(&name, &manifest);
            entry.resolved = meta.resolved;
            entry.integrity = meta.integrity;

            let mut owner = natural_owner(ctx, &dep_dir);
            if let Some(existing) = tree.child(owner, &name) {
                if tree.get(existing).version != entry.version {
                    owner = id;
                }
            }

            ctx.visited.insert(dep_dir.clone());
            if let Some(existing) = tree.child(owner, &name) {
                // Same version already placed there; share it
                ctx.dir_entries.insert(dep_dir, existing);
                continue;
            }

            let child = tree.push(entry);
            tree.place(owner, &name, child);
            ctx.dir_entries.insert(dep_dir, child);
            placed.push(child);
        }

        for child in placed {
            self.expand(tree, ctx, child)?;
        }
        Ok(())
    }
}

/// Entry owning the `node_modules` area `dep_dir` sits in, or the root.
fn natural_owner(ctx: &BuildContext, dep_dir: &Path) -> EntryId {
    locate::owner_of(dep_dir)
        .and_then(|owner_dir| ctx.dir_entries.get(&owner_dir).copied())
        .unwrap_or(EntryId::ROOT)
}

/// Entry for an installed directory, without children or metadata.
///
/// `requires` keeps only names that are installed as seen from `dir`.
fn new_entry(dir: &Path, manifest: &Manifest, is_root: bool) -> Entry {
    let requires = manifest
        .declared_requires(is_root)
        .into_iter()
        .filter(|(name, _)| locate::is_installed(dir, name))
        .collect();

    Entry {
        dir: dir.to_path_buf(),
        version: manifest.version.clone().unwrap_or_default(),
        requires,
        ..Entry::default()
    }
}

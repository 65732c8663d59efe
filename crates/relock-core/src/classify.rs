//! Dev/optional classification by reachability.
//!
//! An entry not reachable from the root's production, optional or peer
//! dependencies is development-only; one not reachable from production,
//! development or peer dependencies is optional-only.

use std::collections::HashSet;

use crate::entry::{EntryId, EntryTree};
use crate::error::{Error, Result};
use crate::manifest::{DepGroup, Manifest};

const NON_DEV_GROUPS: &[DepGroup] = &[DepGroup::Production, DepGroup::Optional, DepGroup::Peer];
const NON_OPTIONAL_GROUPS: &[DepGroup] =
    &[DepGroup::Production, DepGroup::Development, DepGroup::Peer];

/// Set `dev` and `optional` on every placed entry of `tree`.
///
/// `manifest` is the root manifest whose groups seed the walks.
pub fn classify(tree: &mut EntryTree, manifest: &Manifest) -> Result<()> {
    let non_dev = reachable_from(tree, &manifest.names_in(NON_DEV_GROUPS))?;
    let non_optional = reachable_from(tree, &manifest.names_in(NON_OPTIONAL_GROUPS))?;

    for id in tree.placed() {
        let entry = tree.get_mut(id);
        entry.dev = !non_dev.contains(&id);
        entry.optional = !non_optional.contains(&id);
    }
    Ok(())
}

/// Entries reachable through `requires` edges from the named top-level
/// entries. Names without a top-level entry are ignored.
pub fn reachable_from(tree: &EntryTree, names: &[String]) -> Result<HashSet<EntryId>> {
    let mut reached = HashSet::new();
    for name in names {
        let Some(start) = tree.child(EntryId::ROOT, name) else {
            continue;
        };
        reached.insert(start);

        let mut walk = Walk {
            tree,
            walked: HashSet::new(),
            parents: vec![EntryId::ROOT],
            reached: &mut reached,
        };
        walk.visit(name, start)?;
    }
    Ok(reached)
}

/// One depth-first walk from a single top-level name.
struct Walk<'a> {
    tree: &'a EntryTree,
    walked: HashSet<EntryId>,
    /// Entries on the path from the root to the current entry.
    parents: Vec<EntryId>,
    reached: &'a mut HashSet<EntryId>,
}

impl Walk<'_> {
    fn visit(&mut self, entry_name: &str, id: EntryId) -> Result<()> {
        if !self.walked.insert(id) {
            return Ok(());
        }

        let tree = self.tree;
        for dep_name in tree.get(id).requires.keys() {
            let dep = self
                .resolve(id, dep_name)
                .ok_or_else(|| Error::UnresolvedRequire {
                    parent: entry_name.to_string(),
                    name: dep_name.clone(),
                })?;
            self.reached.insert(dep);

            self.parents.push(id);
            let result = self.visit(dep_name, dep);
            self.parents.pop();
            result?;
        }
        Ok(())
    }

    /// Look `name` up in `id`'s own dependencies, then along the walk path,
    /// innermost first.
    fn resolve(&self, id: EntryId, name: &str) -> Option<EntryId> {
        std::iter::once(id)
            .chain(self.parents.iter().rev().copied())
            .find_map(|owner| self.tree.child(owner, name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::Entry;

    struct Fixture {
        tree: EntryTree,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                tree: EntryTree::new(Entry::default()),
            }
        }

        fn add(&mut self, owner: EntryId, name: &str, requires: &[&str]) -> EntryId {
            let entry = Entry {
                name: name.to_string(),
                version: "1.0.0".to_string(),
                requires: requires
                    .iter()
                    .map(|r| ((*r).to_string(), "*".to_string()))
                    .collect(),
                ..Entry::default()
            };
            let id = self.tree.push(entry);
            self.tree.place(owner, name, id);
            id
        }

        fn flags(&self, id: EntryId) -> (bool, bool) {
            let entry = self.tree.get(id);
            (entry.dev, entry.optional)
        }
    }

    fn manifest(json: &str) -> Manifest {
        Manifest::from_json(json).unwrap()
    }

    #[test]
    fn test_dev_and_optional_partition() {
        let mut f = Fixture::new();
        let a = f.add(EntryId::ROOT, "a", &["shared"]);
        let t = f.add(EntryId::ROOT, "t", &["shared", "tool-only"]);
        let o = f.add(EntryId::ROOT, "o", &["opt-only"]);
        let shared = f.add(EntryId::ROOT, "shared", &[]);
        let tool_only = f.add(EntryId::ROOT, "tool-only", &[]);
        let opt_only = f.add(EntryId::ROOT, "opt-only", &[]);

        let m = manifest(
            r#"{
                "dependencies": { "a": "1" },
                "devDependencies": { "t": "1" },
                "optionalDependencies": { "o": "1" }
            }"#,
        );
        classify(&mut f.tree, &m).unwrap();

        assert_eq!(f.flags(a), (false, false));
        // Reachable from production wins over the dev path
        assert_eq!(f.flags(shared), (false, false));
        assert_eq!(f.flags(t), (true, false));
        assert_eq!(f.flags(tool_only), (true, false));
        assert_eq!(f.flags(o), (false, true));
        assert_eq!(f.flags(opt_only), (false, true));
    }

    #[test]
    fn test_unreached_entry_is_both_dev_and_optional() {
        let mut f = Fixture::new();
        let a = f.add(EntryId::ROOT, "a", &[]);
        let stray = f.add(EntryId::ROOT, "stray", &[]);

        classify(&mut f.tree, &manifest(r#"{"dependencies": {"a": "1"}}"#)).unwrap();

        assert_eq!(f.flags(a), (false, false));
        assert_eq!(f.flags(stray), (true, true));
    }

    #[test]
    fn test_resolution_prefers_nearest_nested_entry() {
        let mut f = Fixture::new();
        let a = f.add(EntryId::ROOT, "a", &["c"]);
        let b = f.add(EntryId::ROOT, "b", &["c"]);
        let c_top = f.add(EntryId::ROOT, "c", &[]);
        let c_nested = f.add(b, "c", &[]);

        let reached = reachable_from(&f.tree, &["b".to_string()]).unwrap();
        assert!(reached.contains(&b));
        assert!(reached.contains(&c_nested));
        assert!(!reached.contains(&c_top));
        assert!(!reached.contains(&a));
    }

    #[test]
    fn test_resolution_walks_parent_path() {
        let mut f = Fixture::new();
        let a = f.add(EntryId::ROOT, "a", &["b"]);
        let b = f.add(a, "b", &["c"]);
        // c sits beside b under a, found through the walk path
        let c = f.add(a, "c", &[]);

        let reached = reachable_from(&f.tree, &["a".to_string()]).unwrap();
        assert_eq!(reached.len(), 3);
        assert!(reached.contains(&b) && reached.contains(&c));
    }

    #[test]
    fn test_cycle_terminates() {
        let mut f = Fixture::new();
        let a = f.add(EntryId::ROOT, "a", &["b"]);
        let b = f.add(EntryId::ROOT, "b", &["a"]);

        let reached = reachable_from(&f.tree, &["a".to_string()]).unwrap();
        assert!(reached.contains(&a) && reached.contains(&b));
    }

    #[test]
    fn test_unresolvable_edge_is_internal_error() {
        let mut f = Fixture::new();
        f.add(EntryId::ROOT, "a", &["ghost"]);

        let err = reachable_from(&f.tree, &["a".to_string()]).unwrap_err();
        assert!(matches!(err, Error::UnresolvedRequire { ref parent, ref name } if parent == "a" && name == "ghost"));
        assert!(err.is_internal());
    }
}

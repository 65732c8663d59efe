//! Yarn Classic (v1) `yarn.lock` reader.
//!
//! Only consulted as a metadata fallback: entries are keyed by descriptor
//! (`name@range`) and carry `version`, `resolved` and `integrity`.

use indexmap::IndexMap;
use std::collections::HashMap;
use std::panic;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use crate::error::{Error, Result};

/// Yarn lockfile filename.
pub const YARN_LOCK_NAME: &str = "yarn.lock";

/// Metadata recorded for one resolved package.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct YarnEntry {
    pub version: String,
    pub resolved: Option<String>,
    pub integrity: Option<String>,
}

/// Parsed `yarn.lock`, keyed by descriptor in file order.
#[derive(Debug, Clone, Default)]
pub struct YarnLock {
    entries: IndexMap<String, YarnEntry>,
}

impl YarnLock {
    /// Parse lockfile text.
    ///
    /// Text containing version-control conflict markers is rejected: a merge
    /// whose two sides both parse is reported as an unfinished merge, anything
    /// else as a conflict. `path` is only used for error messages.
    pub fn parse(content: &str, path: &Path) -> Result<Self> {
        if let Some((ours, theirs)) = split_conflict(content) {
            return Err(if parse_body(&ours).is_some() && parse_body(&theirs).is_some() {
                Error::YarnLockMerge {
                    path: path.to_path_buf(),
                }
            } else {
                Error::YarnLockConflict {
                    path: path.to_path_buf(),
                }
            });
        }

        parse_body(content).ok_or_else(|| Error::YarnLockConflict {
            path: path.to_path_buf(),
        })
    }

    /// Find the entry for an exact `name` + `version`.
    ///
    /// Every descriptor starting with `name@` is considered, in file order.
    #[must_use]
    pub fn find(&self, name: &str, version: &str) -> Option<&YarnEntry> {
        let prefix = format!("{name}@");
        self.entries
            .iter()
            .find(|(descriptor, entry)| descriptor.starts_with(&prefix) && entry.version == version)
            .map(|(_, entry)| entry)
    }

    /// Look up a single descriptor.
    #[must_use]
    pub fn get(&self, descriptor: &str) -> Option<&YarnEntry> {
        self.entries.get(descriptor)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Split text with conflict markers into "ours" and "theirs" variants.
///
/// Returns `None` when no markers are present. A diff3 base section
/// (`|||||||`) is dropped.
fn split_conflict(content: &str) -> Option<(String, String)> {
    #[derive(PartialEq)]
    enum Side {
        Both,
        Ours,
        Base,
        Theirs,
    }

    if !content.lines().any(|l| l.starts_with("<<<<<<<")) {
        return None;
    }

    let mut ours = String::new();
    let mut theirs = String::new();
    let mut side = Side::Both;

    for line in content.lines() {
        if line.starts_with("<<<<<<<") {
            side = Side::Ours;
        } else if line.starts_with("|||||||") && side == Side::Ours {
            side = Side::Base;
        } else if line.starts_with("=======") && side != Side::Both {
            side = Side::Theirs;
        } else if line.starts_with(">>>>>>>") {
            side = Side::Both;
        } else {
            match side {
                Side::Both => {
                    push_line(&mut ours, line);
                    push_line(&mut theirs, line);
                }
                Side::Ours => push_line(&mut ours, line),
                Side::Theirs => push_line(&mut theirs, line),
                Side::Base => {}
            }
        }
    }

    Some((ours, theirs))
}

fn push_line(buf: &mut String, line: &str) {
    buf.push_str(line);
    buf.push('\n');
}

/// Parse conflict-free lockfile text. Returns `None` on malformed structure.
///
/// Entries and their versions come from `yarn_lock_parser`; the header
/// descriptors plus `resolved` and `integrity` come from a line scan that
/// yields one block per entry, in the same order.
fn parse_body(content: &str) -> Option<YarnLock> {
    // yarn_lock_parser can panic on input it does not understand
    let parsed = panic::catch_unwind(panic::AssertUnwindSafe(|| yarn_lock_parser::parse_str(content)))
        .ok()?
        .ok()?;
    let blocks = scan_blocks(content)?;
    if blocks.len() != parsed.entries.len() {
        return None;
    }

    let mut entries = IndexMap::new();
    for (parsed_entry, block) in parsed.entries.iter().zip(blocks) {
        let prefix = format!("{}@", parsed_entry.name);
        if !block.descriptors.iter().any(|d| d.starts_with(&prefix)) {
            return None;
        }
        let entry = YarnEntry {
            version: parsed_entry.version.to_string(),
            resolved: block.resolved,
            integrity: block.integrity,
        };
        for descriptor in block.descriptors {
            entries.insert(descriptor, entry.clone());
        }
    }

    Some(YarnLock { entries })
}

/// Details of one lockfile block that `yarn_lock_parser` does not expose.
#[derive(Default)]
struct Block {
    descriptors: Vec<String>,
    resolved: Option<String>,
    integrity: Option<String>,
}

fn scan_blocks(content: &str) -> Option<Vec<Block>> {
    let mut blocks: Vec<Block> = Vec::new();
    let mut field_indent = None;

    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let indent = line.len() - line.trim_start().len();
        if indent == 0 {
            let header = trimmed.strip_suffix(':')?;
            blocks.push(Block {
                descriptors: header
                    .split(',')
                    .map(|d| unquote(d.trim()).to_string())
                    .filter(|d| !d.is_empty())
                    .collect(),
                ..Block::default()
            });
            field_indent = None;
            continue;
        }

        let block = blocks.last_mut()?;
        if indent > *field_indent.get_or_insert(indent) {
            // Inside a dependencies block
            continue;
        }
        if let Some(value) = trimmed.strip_prefix("resolved ") {
            block.resolved = Some(unquote(value.trim()).to_string());
        } else if let Some(value) = trimmed.strip_prefix("integrity ") {
            block.integrity = Some(unquote(value.trim()).to_string());
        }
    }

    Some(blocks)
}

fn unquote(s: &str) -> &str {
    s.strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(s)
}

/// Memoized `yarn.lock` reader, shared by every root of a batch.
#[derive(Debug, Default)]
pub struct YarnLockStore {
    by_dir: RwLock<HashMap<PathBuf, Option<Arc<YarnLock>>>>,
}

impl YarnLockStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Nearest directory at or above `start` that contains a `yarn.lock`.
    #[must_use]
    pub fn find_lock_dir(start: &Path) -> Option<PathBuf> {
        start
            .ancestors()
            .find(|dir| dir.join(YARN_LOCK_NAME).is_file())
            .map(Path::to_path_buf)
    }

    /// The lockfile governing `root`, if any.
    pub fn for_root(&self, root: &Path) -> Result<Option<Arc<YarnLock>>> {
        match Self::find_lock_dir(root) {
            Some(dir) => self.read_if_exists(&dir),
            None => Ok(None),
        }
    }

    /// Read and parse `<dir>/yarn.lock`, memoizing the result.
    ///
    /// Failures are not memoized.
    pub fn read_if_exists(&self, dir: &Path) -> Result<Option<Arc<YarnLock>>> {
        if let Some(cached) = self.by_dir.read().ok().and_then(|m| m.get(dir).cloned()) {
            return Ok(cached);
        }

        let path = dir.join(YARN_LOCK_NAME);
        let content = relock_util::fs::read_to_string_if_exists(&path)
            .map_err(|source| Error::YarnLockRead {
                path: path.clone(),
                source,
            })?;

        let lock = match content {
            Some(content) => Some(Arc::new(YarnLock::parse(&content, &path)?)),
            None => None,
        };

        self.insert(dir, lock.clone());
        Ok(lock)
    }

    /// Seed the store with an already-parsed lockfile for `dir`.
    pub fn insert(&self, dir: &Path, lock: Option<Arc<YarnLock>>) {
        if let Ok(mut by_dir) = self.by_dir.write() {
            by_dir.insert(dir.to_path_buf(), lock);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const HEADER: &str = "# THIS IS AN AUTOGENERATED FILE. DO NOT EDIT THIS FILE DIRECTLY.\n# yarn lockfile v1\n\n\n";

    const BASIC: &str = r#"# THIS IS AN AUTOGENERATED FILE. DO NOT EDIT THIS FILE DIRECTLY.
# yarn lockfile v1


"@babel/core@^7.22.0":
  version "7.22.5"
  resolved "https://registry.yarnpkg.com/@babel/core/-/core-7.22.5.tgz"
  integrity sha512-abc123
  dependencies:
    left-pad "^1.3.0"

left-pad@^1.3.0, left-pad@~1.3.0:
  version "1.3.0"
  resolved "https://registry.yarnpkg.com/left-pad/-/left-pad-1.3.0.tgz#5b8a3a7765dfe001261dde915589e782f8c94d1e"
  integrity sha512-test123

left-pad@^2.0.0:
  version "2.0.1"
  resolved "https://registry.yarnpkg.com/left-pad/-/left-pad-2.0.1.tgz"
  integrity sha512-test201
"#;

    fn parse(content: &str) -> Result<YarnLock> {
        YarnLock::parse(content, Path::new("/project/yarn.lock"))
    }

    fn block(descriptor: &str, version: &str) -> String {
        format!(
            "{descriptor}:\n  version \"{version}\"\n  resolved \"https://registry.yarnpkg.com/a/-/a-{version}.tgz\"\n  integrity sha512-{version}\n"
        )
    }

    #[test]
    fn test_parse_descriptors() {
        let lock = parse(BASIC).unwrap();

        // Both descriptors of the shared header become keys
        assert_eq!(lock.len(), 4);
        assert_eq!(lock.get("left-pad@~1.3.0").unwrap().version, "1.3.0");
        assert_eq!(lock.get("left-pad@^1.3.0").unwrap().integrity.as_deref(), Some("sha512-test123"));
        assert_eq!(
            lock.get("@babel/core@^7.22.0").unwrap().integrity.as_deref(),
            Some("sha512-abc123")
        );
    }

    #[test]
    fn test_dependencies_block_does_not_leak_into_entry() {
        let lock = parse(BASIC).unwrap();
        let babel = lock.get("@babel/core@^7.22.0").unwrap();
        assert_eq!(babel.version, "7.22.5");
        assert_eq!(
            babel.resolved.as_deref(),
            Some("https://registry.yarnpkg.com/@babel/core/-/core-7.22.5.tgz")
        );
    }

    #[test]
    fn test_find_requires_exact_version() {
        let lock = parse(BASIC).unwrap();

        let entry = lock.find("left-pad", "2.0.1").unwrap();
        assert_eq!(
            entry.resolved.as_deref(),
            Some("https://registry.yarnpkg.com/left-pad/-/left-pad-2.0.1.tgz")
        );
        assert!(lock.find("left-pad", "2.0.0").is_none());
        assert!(lock.find("left", "1.3.0").is_none());
        assert!(lock.find("@babel/core", "7.22.5").is_some());
    }

    #[test]
    fn test_malformed_text_is_conflict() {
        let content = format!("{HEADER}{}not a header\n", block("a@^1.0.0", "1.0.0"));
        assert!(matches!(parse(&content), Err(Error::YarnLockConflict { .. })));
    }

    #[test]
    fn test_conflict_markers_unparseable_side() {
        let content = format!(
            "{HEADER}<<<<<<< HEAD\n{}=======\n{}broken header\n>>>>>>> branch\n",
            block("a@^1.0.0", "1.0.0"),
            block("a@^1.0.0", "1.1.0"),
        );
        assert!(matches!(parse(&content), Err(Error::YarnLockConflict { .. })));
    }

    #[test]
    fn test_conflict_markers_both_sides_parse() {
        let content = format!(
            "{HEADER}<<<<<<< HEAD\n{}=======\n{}>>>>>>> branch\n",
            block("a@^1.0.0", "1.0.0"),
            block("a@^1.0.0", "1.1.0"),
        );
        assert!(matches!(parse(&content), Err(Error::YarnLockMerge { .. })));
    }

    #[test]
    fn test_store_finds_lock_in_ancestor() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join(YARN_LOCK_NAME), BASIC).unwrap();
        let pkg = root.join("packages/app");
        fs::create_dir_all(&pkg).unwrap();

        let store = YarnLockStore::new();
        let lock = store.for_root(&pkg).unwrap().unwrap();
        assert!(lock.find("left-pad", "1.3.0").is_some());

        // Memoized: deleting the file does not change the answer
        fs::remove_file(root.join(YARN_LOCK_NAME)).unwrap();
        assert!(store.read_if_exists(root).unwrap().is_some());
    }

    #[test]
    fn test_store_without_lock() {
        let dir = tempdir().unwrap();
        let store = YarnLockStore::new();
        assert!(store.read_if_exists(dir.path()).unwrap().is_none());
    }
}

//! Installed module lookup.
//!
//! Mirrors the hierarchical `node_modules` search a module loader performs:
//! look in `<dir>/node_modules/<name>`, then repeat from each parent directory
//! up to the filesystem root.

use std::path::{Path, PathBuf};

use crate::manifest::MANIFEST_NAME;

/// Name of the nested-module directory.
pub const MODULES_DIR: &str = "node_modules";

/// Find the directory where `name` is installed when required from `from_dir`.
///
/// Returns `None` when no installed copy exists at any ancestor level. The
/// result is canonicalized, so linked packages are identified by their real
/// location.
#[must_use]
pub fn locate(from_dir: &Path, name: &str) -> Option<PathBuf> {
    from_dir
        .ancestors()
        .filter(|base| !is_modules_dir(base))
        .map(|base| package_dir_in(&base.join(MODULES_DIR), name))
        .find(|candidate| candidate.join(MANIFEST_NAME).is_file())
        .map(|found| dunce::canonicalize(&found).unwrap_or(found))
}

/// Whether `name` is installed anywhere visible from `from_dir`.
#[must_use]
pub fn is_installed(from_dir: &Path, name: &str) -> bool {
    locate(from_dir, name).is_some()
}

/// Directory owning the `node_modules` area an installed package sits in.
///
/// For `/p/node_modules/a/node_modules/@s/b` this is `/p/node_modules/a`.
/// Returns `None` when the directory is not inside any `node_modules`.
#[must_use]
pub fn owner_of(installed_dir: &Path) -> Option<PathBuf> {
    installed_dir
        .ancestors()
        .skip(1)
        .find(|dir| is_modules_dir(dir))
        .and_then(Path::parent)
        .map(Path::to_path_buf)
}

fn is_modules_dir(dir: &Path) -> bool {
    dir.file_name().is_some_and(|n| n == MODULES_DIR)
}

/// Package directory for `name` inside a `node_modules` directory.
fn package_dir_in(node_modules: &Path, name: &str) -> PathBuf {
    if let Some((scope, rest)) = name.strip_prefix('@').and_then(|n| n.split_once('/')) {
        node_modules.join(format!("@{scope}")).join(rest)
    } else {
        node_modules.join(name)
    }
}

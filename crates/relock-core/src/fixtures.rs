//! Helpers for building installed trees in tests.

use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};

use crate::manifest::MANIFEST_NAME;

/// Write `<dir>/package.json`, creating `dir`.
pub fn write_manifest(dir: &Path, manifest: &Value) -> PathBuf {
    fs::create_dir_all(dir).unwrap();
    fs::write(
        dir.join(MANIFEST_NAME),
        serde_json::to_string_pretty(manifest).unwrap(),
    )
    .unwrap();
    dunce::canonicalize(dir).unwrap()
}

/// Write a package with only production dependencies.
pub fn create_package_json(dir: &Path, name: &str, version: &str, deps: &[(&str, &str)]) -> PathBuf {
    let deps: serde_json::Map<String, Value> = deps
        .iter()
        .map(|(n, v)| ((*n).to_string(), json!(v)))
        .collect();
    write_manifest(
        dir,
        &json!({ "name": name, "version": version, "dependencies": deps }),
    )
}

//! Previous lockfile contents, preferring the committed version.

use serde_json::Value;
use std::path::Path;
use std::process::Command;

use crate::error::{Error, Result};

/// Where the previous lockfile contents came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PriorSource {
    /// `git show HEAD:<file>`.
    GitHead,
    /// The file currently on disk.
    WorkingTree,
    /// No previous contents.
    None,
}

/// Previous lockfile contents.
#[derive(Debug, Clone)]
pub struct PriorLockfile {
    pub content: Option<String>,
    pub source: PriorSource,
    /// Why the committed version could not be read, when git was consulted.
    pub git_error: Option<String>,
}

impl PriorLockfile {
    /// Parse the contents, treating absent or invalid JSON as an empty object.
    #[must_use]
    pub fn to_value(&self) -> Value {
        self.content
            .as_deref()
            .and_then(|content| serde_json::from_str(content).ok())
            .unwrap_or_else(|| Value::Object(serde_json::Map::new()))
    }
}

/// Read the previous contents of `path`.
///
/// With `use_git`, the version committed at `HEAD` is tried first; any git
/// failure falls back to the working-tree file.
pub fn read_prior(path: &Path, use_git: bool) -> Result<PriorLockfile> {
    let current = relock_util::fs::read_to_string_if_exists(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let git_error = if use_git {
        match show_head(path) {
            Ok(committed) => {
                return Ok(PriorLockfile {
                    content: Some(committed),
                    source: PriorSource::GitHead,
                    git_error: None,
                })
            }
            Err(reason) => Some(reason),
        }
    } else {
        None
    };

    let source = if current.is_some() {
        PriorSource::WorkingTree
    } else {
        PriorSource::None
    };
    Ok(PriorLockfile {
        content: current,
        source,
        git_error,
    })
}

/// Contents of `path` at `HEAD`, run from the file's directory.
fn show_head(path: &Path) -> std::result::Result<String, String> {
    let dir = path.parent().unwrap_or(Path::new("."));
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| format!("not a file path: {}", path.display()))?;

    let output = Command::new("git")
        .arg("show")
        .arg(format!("HEAD:./{file_name}"))
        .current_dir(dir)
        .output()
        .map_err(|e| format!("git show failed: {e}"))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(stderr.trim().to_string());
    }

    String::from_utf8(output.stdout).map_err(|e| format!("git show output is not UTF-8: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_working_tree_without_git() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("package-lock.json");
        fs::write(&path, r#"{"name": "app"}"#).unwrap();

        let prior = read_prior(&path, false).unwrap();
        assert_eq!(prior.source, PriorSource::WorkingTree);
        assert!(prior.git_error.is_none());
        assert_eq!(prior.to_value()["name"], "app");
    }

    #[test]
    fn test_missing_file() {
        let dir = tempdir().unwrap();
        let prior = read_prior(&dir.path().join("package-lock.json"), false).unwrap();
        assert_eq!(prior.source, PriorSource::None);
        assert_eq!(prior.to_value(), serde_json::json!({}));
    }

    #[test]
    fn test_git_failure_falls_back() {
        // A fresh temp dir is not a repository (or has no such file at HEAD)
        let dir = tempdir().unwrap();
        let path = dir.path().join("package-lock.json");
        fs::write(&path, "{}").unwrap();

        let prior = read_prior(&path, true).unwrap();
        assert_eq!(prior.source, PriorSource::WorkingTree);
        assert!(prior.git_error.is_some());
    }

    #[test]
    fn test_invalid_json_is_empty_object() {
        let prior = PriorLockfile {
            content: Some("<<<<<<< HEAD".to_string()),
            source: PriorSource::WorkingTree,
            git_error: None,
        };
        assert_eq!(prior.to_value(), serde_json::json!({}));
    }
}

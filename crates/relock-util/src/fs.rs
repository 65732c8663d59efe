use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Read a file to string, returning `None` when the file does not exist.
///
/// Any other I/O failure (permissions, invalid UTF-8, a directory in the
/// way) is returned as an error so callers can tell "absent" from "broken".
///
/// # Errors
/// Returns an error if the file exists but cannot be read.
pub fn read_to_string_if_exists(path: &Path) -> io::Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

/// List the immediate subdirectories of `dir`, sorted by name.
///
/// Hidden entries (leading `.`) are skipped. Symlinks to directories count
/// as directories.
///
/// # Errors
/// Returns an error if `dir` cannot be read.
pub fn list_subdirectories(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }
        let path = entry.path();
        if path.is_dir() {
            dirs.push(path);
        }
    }
    dirs.sort();
    Ok(dirs)
}

/// Atomically write bytes to a file by writing to a temp file then renaming.
///
/// The file will either have the old contents or the new contents, never a
/// partial write. Every call gets its own uniquely named temp file, so
/// concurrent writers to one path never share it.
///
/// # Errors
/// Returns an error if the write or rename fails.
pub fn atomic_write(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    // Same directory so the rename never crosses filesystems
    let mut temp = tempfile::Builder::new()
        .prefix(".relock-")
        .suffix(".tmp")
        .tempfile_in(parent)?;
    temp.write_all(bytes)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_read_if_exists_present() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("package.json");
        fs::write(&path, "{}").unwrap();

        assert_eq!(
            read_to_string_if_exists(&path).unwrap().as_deref(),
            Some("{}")
        );
    }

    #[test]
    fn test_read_if_exists_missing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing.json");

        assert!(read_to_string_if_exists(&path).unwrap().is_none());
    }

    #[test]
    fn test_read_if_exists_directory_is_error() {
        let dir = tempdir().unwrap();

        assert!(read_to_string_if_exists(dir.path()).is_err());
    }

    #[test]
    fn test_list_subdirectories_sorted_and_filtered() {
        let dir = tempdir().unwrap();
        for name in ["zeta", "alpha", ".hidden", "mid"] {
            fs::create_dir(dir.path().join(name)).unwrap();
        }
        fs::write(dir.path().join("file.txt"), "x").unwrap();

        let names: Vec<String> = list_subdirectories(dir.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn test_atomic_write() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("package-lock.json");

        atomic_write(&path, b"hello").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "hello");

        atomic_write(&path, b"world").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "world");
    }

    #[test]
    fn test_atomic_write_no_temp_left_on_success() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("package-lock.json");

        atomic_write(&path, b"content").unwrap();

        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
        assert_eq!(
            entries[0].as_ref().unwrap().file_name().to_str().unwrap(),
            "package-lock.json"
        );
    }

    #[test]
    fn test_atomic_write_concurrent_writers() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("package-lock.json");
        let payloads: Vec<String> = (0..8).map(|i| format!("{{\"writer\": {i}}}")).collect();

        std::thread::scope(|scope| {
            for payload in &payloads {
                let path = &path;
                scope.spawn(move || {
                    for _ in 0..20 {
                        atomic_write(path, payload.as_bytes()).unwrap();
                    }
                });
            }
        });

        let content = fs::read_to_string(&path).unwrap();
        assert!(payloads.contains(&content));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}

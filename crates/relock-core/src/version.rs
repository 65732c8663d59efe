/// The current version, read from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// `lockfileVersion` written into every generated lockfile.
pub const LOCKFILE_VERSION: u32 = 1;

/// Returns a formatted version string.
#[must_use]
pub fn version_string() -> String {
    format!("relock {VERSION}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_string_contains_version() {
        let vs = version_string();
        assert!(vs.contains(VERSION));
        assert!(vs.starts_with("relock "));
    }
}

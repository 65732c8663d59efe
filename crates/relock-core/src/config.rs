use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Runtime configuration for one relock invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory relative target paths are resolved against.
    pub cwd: PathBuf,

    /// Whether to emit JSON logs.
    pub json_logs: bool,

    /// Verbosity level (0 = INFO, 1 = DEBUG, 2+ = TRACE).
    pub verbosity: u8,

    /// Where `resolved`/`integrity` come from.
    pub metadata: MetadataSource,

    /// Read the previous lockfile from git `HEAD` before the working tree.
    pub use_git: bool,

    /// Compute lockfiles without writing them.
    pub dry_run: bool,
}

/// Source of provenance metadata for installed packages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MetadataSource {
    /// Installer-embedded manifest fields only.
    Manifest,
    /// Manifest fields, falling back to the nearest `yarn.lock`.
    #[default]
    Yarn,
}

impl MetadataSource {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manifest => "manifest",
            Self::Yarn => "yarn",
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cwd: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            json_logs: false,
            verbosity: 0,
            metadata: MetadataSource::default(),
            use_git: true,
            dry_run: false,
        }
    }
}

impl Config {
    /// Create a new config with the given working directory.
    #[must_use]
    pub fn new(cwd: PathBuf) -> Self {
        Self {
            cwd,
            ..Default::default()
        }
    }

    /// Set verbosity level.
    #[must_use]
    pub fn with_verbosity(mut self, verbosity: u8) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Set JSON log output.
    #[must_use]
    pub fn with_json_logs(mut self, json: bool) -> Self {
        self.json_logs = json;
        self
    }

    #[must_use]
    pub fn with_metadata(mut self, metadata: MetadataSource) -> Self {
        self.metadata = metadata;
        self
    }

    #[must_use]
    pub fn with_git(mut self, use_git: bool) -> Self {
        self.use_git = use_git;
        self
    }

    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Resolve a target directory against `cwd`.
    #[must_use]
    pub fn resolve_dir(&self, dir: &std::path::Path) -> PathBuf {
        if dir.is_absolute() {
            dir.to_path_buf()
        } else {
            self.cwd.join(dir)
        }
    }
}

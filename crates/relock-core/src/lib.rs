#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::return_self_not_must_use)]

//! Rebuilds `package-lock.json` files from installed `node_modules` trees.

pub mod builder;
pub mod classify;
pub mod config;
pub mod entry;
pub mod error;
pub mod generate;
pub mod locate;
pub mod lockfile;
pub mod manifest;
pub mod manifest_cache;
pub mod merge;
pub mod meta;
pub mod prior;
pub mod version;
pub mod yarn;

#[cfg(test)]
mod fixtures;

pub use builder::{ResolvedTree, TreeBuilder};
pub use config::{Config, MetadataSource};
pub use entry::{Entry, EntryId, EntryTree, TreeStats};
pub use error::{codes, Error, Result};
pub use generate::{generate_lockfile, package_dirs, update_locks, Generated, RootOutcome, SharedCaches};
pub use lockfile::LOCKFILE_NAME;
pub use manifest::{Manifest, ManifestReader};
pub use manifest_cache::{CachedManifest, ManifestCache, MemoryManifestCache, NoManifestCache};
pub use prior::PriorSource;
pub use version::VERSION;

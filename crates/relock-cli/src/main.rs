#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::missing_errors_doc)]

mod commands;
mod logging;

use clap::{Parser, ValueEnum};
use miette::Result;
use relock_core::{Config, MetadataSource};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "relock")]
#[command(
    author,
    version,
    about = "Rebuild package-lock.json from an installed node_modules tree",
    long_about = None
)]
struct Cli {
    /// Package directories to generate lockfiles for (default: working directory)
    dirs: Vec<PathBuf>,

    /// Also generate for every subdirectory of this directory
    #[arg(long, value_name = "DIR")]
    packages: Option<PathBuf>,

    /// Where to read `resolved` and `integrity` from
    #[arg(long, value_enum, default_value_t = MetadataArg::Yarn)]
    metadata: MetadataArg,

    /// Merge into the working-tree lockfile instead of the one committed at HEAD
    #[arg(long)]
    no_git: bool,

    /// Print lockfiles instead of writing them
    #[arg(long)]
    dry_run: bool,

    /// Increase logging verbosity (-v for DEBUG, -vv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Emit JSON logs and a JSON summary on stdout
    #[arg(long)]
    json: bool,

    /// Override the working directory
    #[arg(long, value_name = "PATH")]
    cwd: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum MetadataArg {
    /// Installer-embedded package.json fields only
    Manifest,
    /// package.json fields, falling back to the nearest yarn.lock
    Yarn,
}

impl From<MetadataArg> for MetadataSource {
    fn from(arg: MetadataArg) -> Self {
        match arg {
            MetadataArg::Manifest => Self::Manifest,
            MetadataArg::Yarn => Self::Yarn,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let cwd = cli
        .cwd
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."));

    let config = Config::new(cwd)
        .with_verbosity(cli.verbose)
        .with_json_logs(cli.json)
        .with_metadata(cli.metadata.into())
        .with_git(!cli.no_git)
        .with_dry_run(cli.dry_run);

    logging::init(config.verbosity, config.json_logs);

    let dirs = commands::generate::collect_dirs(&cli.dirs, cli.packages.as_deref(), &config)?;
    let failed = commands::generate::run(&dirs, &config)?;
    if failed > 0 {
        std::process::exit(1);
    }
    Ok(())
}

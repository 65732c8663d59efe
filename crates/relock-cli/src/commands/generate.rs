//! Lockfile generation command.

use miette::{IntoDiagnostic, Result};
use relock_core::{package_dirs, update_locks, Config, Generated, RootOutcome, SharedCaches};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Target directories: explicit ones first, then `packages` subdirectories.
///
/// With neither, the working directory is the only target.
pub fn collect_dirs(dirs: &[PathBuf], packages: Option<&Path>, config: &Config) -> Result<Vec<PathBuf>> {
    let mut targets: Vec<PathBuf> = dirs.iter().map(|d| config.resolve_dir(d)).collect();

    if let Some(packages) = packages {
        let packages = config.resolve_dir(packages);
        targets.extend(package_dirs(&packages).into_diagnostic()?);
    } else if targets.is_empty() {
        targets.push(config.cwd.clone());
    }

    Ok(targets)
}

/// Generate every target and report the outcomes. Returns the failure count.
pub fn run(dirs: &[PathBuf], config: &Config) -> Result<usize> {
    let caches = SharedCaches::new();
    let outcomes = update_locks(dirs, config, &caches);

    let mut failed = 0;
    for outcome in &outcomes {
        info!(dir = %outcome.dir().display(), "Generating lockfile");
        match outcome {
            RootOutcome::Generated(generated) => report_generated(generated, config),
            RootOutcome::Skipped { dir } => {
                info!(dir = %dir.display(), "No package.json found, skipped");
            }
            RootOutcome::Failed { dir, error } => {
                failed += 1;
                error!(
                    dir = %dir.display(),
                    code = error.code(),
                    "Error generating lockfile: {error}"
                );
            }
        }
    }

    if config.json_logs {
        print_summary(&outcomes);
    }

    Ok(failed)
}

fn report_generated(generated: &Generated, config: &Config) {
    if let Some(reason) = &generated.git_error {
        warn!(
            file = %generated.lockfile_path.display(),
            reason = %reason,
            "Failed to read lockfile at HEAD, falling back to working tree"
        );
    }

    let stats = generated.stats;
    debug!(
        dir = %generated.dir.display(),
        entries = stats.entries,
        nested = stats.nested,
        dev = stats.dev,
        optional = stats.optional,
        prior = ?generated.prior,
        "Lockfile generated"
    );

    if generated.written {
        info!(file = %generated.lockfile_path.display(), "Wrote lockfile");
    } else if !config.json_logs {
        println!("{}", generated.content);
    }
}

fn print_summary(outcomes: &[RootOutcome]) {
    let roots: Vec<_> = outcomes
        .iter()
        .map(|outcome| match outcome {
            RootOutcome::Generated(g) => {
                let status = if g.written { "written" } else { "generated" };
                let content = (!g.written).then_some(&g.content);
                serde_json::json!({
                    "dir": g.dir.to_string_lossy(),
                    "status": status,
                    "lockfile": g.lockfile_path.to_string_lossy(),
                    "prior": g.prior,
                    "stats": g.stats,
                    "content": content,
                })
            }
            RootOutcome::Skipped { dir } => serde_json::json!({
                "dir": dir.to_string_lossy(),
                "status": "skipped",
            }),
            RootOutcome::Failed { dir, error } => serde_json::json!({
                "dir": dir.to_string_lossy(),
                "status": "failed",
                "error": {
                    "code": error.code(),
                    "message": error.to_string(),
                },
            }),
        })
        .collect();

    let ok = !outcomes.iter().any(RootOutcome::is_failure);
    println!("{}", serde_json::json!({ "ok": ok, "roots": roots }));
}

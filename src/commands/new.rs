use super::{Outcome, print_failure};
use crate::SumkeepContext;
use crate::batch::{self, DirectoryOutcome};
use crate::config::Config;
use crate::output::{self, Verbosity};
use crate::strategy::{self, Mode, ReconcileReport, StrategyOptions};
use crate::tools;
use crate::utils::plural;
use anyhow::Result;
use std::path::Path;

/// Flags of `sumkeep new` that refine the loaded configuration
#[derive(Debug, Clone, Default)]
pub struct NewOptions {
    /// Depth of the target directories below the root
    pub depth: usize,
    /// Checksum strategy
    pub mode: Mode,
    /// Export the bitrot database after running bitrot
    pub export: bool,
    /// Overrides `manifest.algorithm`
    pub algorithm: Option<String>,
    /// Overrides `manifest.file_name`
    pub manifest: Option<String>,
    /// Overrides `performance.jobs`
    pub jobs: Option<usize>,
    /// Overrides `manifest.follow_symlinks` with `false`
    pub no_follow: bool,
}

/// Apply command-line overrides through the same validation as `sumkeep config`
fn apply_overrides(config: &mut Config, options: &NewOptions) -> Result<()> {
    if let Some(algorithm) = &options.algorithm {
        config.set("manifest.algorithm", algorithm.clone())?;
    }
    if let Some(name) = &options.manifest {
        config.set("manifest.file_name", name.clone())?;
    }
    if let Some(jobs) = options.jobs {
        config.set("performance.jobs", jobs.to_string())?;
    }
    if options.no_follow {
        config.manifest.follow_symlinks = false;
    }
    Ok(())
}

/// Execute `sumkeep new`: bring the manifest(s) under `root` up to date
///
/// Overrides only affect this run; the configuration file is not written.
///
/// # Errors
///
/// Returns an error if:
/// - An override is invalid or `--export` is used without bitrot mode
/// - A required external tool is missing (checked before any directory is touched)
/// - The root is not a readable directory
pub fn execute(ctx: &mut SumkeepContext, root: &Path, options: &NewOptions) -> Result<Outcome> {
    apply_overrides(&mut ctx.config, options)?;
    if options.export && options.mode != Mode::Bitrot {
        anyhow::bail!("--export only applies to bitrot mode (use --bitrot)");
    }

    let jobs = ctx.config.performance.jobs;
    let reconciler = strategy::build_strategy(
        &ctx.config,
        &StrategyOptions {
            mode: options.mode,
            export: options.export,
            show_progress: jobs <= 1 && output::get_verbosity() != Verbosity::Quiet,
        },
    )?;
    tools::require_all(reconciler.required_tools())?;

    let discovery =
        batch::discover_targets(root, options.depth, ctx.config.manifest.follow_symlinks)?;
    for error in &discovery.errors {
        output::error(&error.user_message());
    }
    if discovery.targets.is_empty() {
        output::warning(&format!(
            "No directories {} below {}",
            plural(options.depth, "level", "levels"),
            root.display()
        ));
    }

    let summary = batch::run_batch(reconciler.as_ref(), &discovery.targets, jobs, print_outcome)?;

    let failed = summary.failures().count() + discovery.errors.len();
    let mut line = format!(
        "{}: {} added, {} missing",
        plural(summary.outcomes.len(), "directory", "directories"),
        plural(summary.total_added(), "file", "files"),
        summary.total_missing()
    );
    if summary.total_unresolved() > 0 {
        line.push_str(&format!(", {} unresolved", summary.total_unresolved()));
    }
    if failed > 0 {
        line.push_str(&format!(", {failed} failed"));
    }
    output::summary(&line);

    Ok(Outcome::from_failures(failed + summary.total_unresolved()))
}

/// Print the result of one directory as soon as it is known
fn print_outcome(outcome: &DirectoryOutcome) {
    match &outcome.result {
        Ok(report) => print_report(report),
        Err(error) => print_failure(&outcome.directory, error),
    }
}

fn print_report(report: &ReconcileReport) {
    for missing in &report.missing {
        output::missing(&missing.path);
    }
    for error in &report.unresolved {
        output::error(&error.user_message());
    }
    for path in &report.added {
        output::verbose(&format!("  added {path}"));
    }

    let mut line = format!(
        "{}: {} new, {} missing",
        report.directory.display(),
        report.added.len(),
        report.missing.len()
    );
    if !report.is_complete() {
        line.push_str(&format!(", {} unresolved", report.unresolved.len()));
    }
    if let Some(exported) = report.exported {
        line.push_str(&format!(", exported {}", plural(exported, "record", "records")));
    }
    output::summary(&line);
}

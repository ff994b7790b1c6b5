use super::{Outcome, print_failure};
use crate::SumkeepContext;
use crate::archive::{self, ArchiveOutcome};
use crate::output;
use crate::tools;
use anyhow::Result;
use std::path::PathBuf;

/// Execute `sumkeep pack`: turn each directory into `<dir>.7z`
///
/// # Errors
///
/// Returns an error if `7z` is not installed. Failures of single directories
/// are reported and do not stop the others.
pub fn execute(
    ctx: &SumkeepContext,
    dirs: &[PathBuf],
    force: bool,
    remove: bool,
) -> Result<Outcome> {
    tools::require(&ctx.config.tools.seven_zip)?;

    let mut failures = 0;
    for dir in dirs {
        match archive::pack(dir, &ctx.config.tools, force, remove) {
            Ok(ArchiveOutcome::Done(packed)) => {
                let suffix = if remove { " (source removed)" } else { "" };
                output::success(&format!("{} -> {}{suffix}", dir.display(), packed.display()));
            }
            Ok(ArchiveOutcome::Skipped(packed)) => output::warning(&format!(
                "{} already exists, skipping {} (use --force)",
                packed.display(),
                dir.display()
            )),
            Err(error) => {
                print_failure(dir, &error);
                failures += 1;
            }
        }
    }

    Ok(Outcome::from_failures(failures))
}

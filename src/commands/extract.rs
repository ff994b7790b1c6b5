use super::{Outcome, print_failure};
use crate::SumkeepContext;
use crate::archive::{self, ArchiveOutcome};
use crate::output;
use crate::tools;
use anyhow::Result;
use std::path::PathBuf;

/// Execute `sumkeep extract`: unpack each archive next to itself
///
/// # Errors
///
/// Returns an error if a needed extraction tool is not installed. Failures of
/// single archives are reported and do not stop the others.
pub fn execute(ctx: &SumkeepContext, archives: &[PathBuf], force: bool) -> Result<Outcome> {
    tools::require_all(archive::tools_for_archives(archives, &ctx.config.tools))?;

    let mut failures = 0;
    for path in archives {
        match archive::extract(path, &ctx.config.tools, force) {
            Ok(ArchiveOutcome::Done(target)) => {
                output::success(&format!("{} -> {}", path.display(), target.display()));
            }
            Ok(ArchiveOutcome::Skipped(target)) => output::warning(&format!(
                "{} already exists, skipping {} (use --force)",
                target.display(),
                path.display()
            )),
            Err(error) => {
                print_failure(path, &error);
                failures += 1;
            }
        }
    }

    Ok(Outcome::from_failures(failures))
}

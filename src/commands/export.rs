use super::{Outcome, print_failure};
use crate::SumkeepContext;
use crate::output;
use crate::strategy::export_database;
use crate::tools;
use crate::utils::plural;
use anyhow::Result;
use std::path::PathBuf;

/// Execute `sumkeep export`: write each directory's bitrot database into its manifest
///
/// # Errors
///
/// Returns an error if `sqlite3` is not installed. Directories without a
/// database are reported and skipped.
pub fn execute(ctx: &SumkeepContext, dirs: &[PathBuf]) -> Result<Outcome> {
    let sqlite3 = ctx.config.tools.sqlite3.as_str();
    tools::require(sqlite3)?;

    let mut failures = 0;
    for dir in dirs {
        match export_database(dir, sqlite3, &ctx.config.manifest.file_name) {
            Ok(count) => output::summary(&format!(
                "{}: exported {}",
                dir.display(),
                plural(count, "record", "records")
            )),
            Err(error) => {
                print_failure(dir, &error);
                failures += 1;
            }
        }
    }

    Ok(Outcome::from_failures(failures))
}

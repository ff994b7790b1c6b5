use super::Outcome;
use crate::SumkeepContext;
use crate::survey;
use anyhow::Result;
use std::path::Path;

/// Execute `sumkeep types`: count files below `dir` by extension
///
/// Prints `count  extension`, most common first.
///
/// # Errors
///
/// Returns an error if `dir` is not a readable directory.
pub fn execute(ctx: &SumkeepContext, dir: &Path) -> Result<Outcome> {
    let counts = survey::count_types(dir, ctx.config.manifest.follow_symlinks)?;

    let width = counts
        .first()
        .map_or(1, |(_, count)| count.to_string().len());
    for (extension, count) in &counts {
        println!("{count:>width$}  {extension}");
    }

    Ok(Outcome::Success)
}

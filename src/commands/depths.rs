use super::Outcome;
use crate::SumkeepContext;
use crate::survey::{self, DepthSubject};
use anyhow::Result;
use std::path::Path;

/// Execute `sumkeep depths`: print how many files (or directories) sit at each depth
///
/// # Errors
///
/// Returns an error if `dir` is not a readable directory.
pub fn execute(ctx: &SumkeepContext, dir: &Path, directories: bool) -> Result<Outcome> {
    let subject = if directories {
        DepthSubject::Directories
    } else {
        DepthSubject::Files
    };
    let histogram = survey::depth_distribution(dir, ctx.config.manifest.follow_symlinks, subject)?;

    for (depth, count) in &histogram {
        println!("{depth}  {count}");
    }

    Ok(Outcome::Success)
}

use super::Outcome;
use crate::charset;
use anyhow::{Context, Result};
use std::io::Read;
use std::path::Path;

/// Execute `sumkeep chars`: list the distinct characters of `file` or stdin
///
/// # Errors
///
/// Returns an error if the input cannot be read, looks binary or is not UTF-8.
pub fn execute(file: Option<&Path>, count: bool) -> Result<Outcome> {
    let bytes = match file {
        Some(path) => {
            std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?
        }
        None => {
            let mut buffer = Vec::new();
            std::io::stdin()
                .read_to_end(&mut buffer)
                .context("Failed to read standard input")?;
            buffer
        }
    };

    let text = charset::decode_text(&bytes)?;
    for entry in charset::distinct_chars(text) {
        if count {
            println!("{}\t{}\t{}", entry.display(), entry.code_point(), entry.count);
        } else {
            println!("{}\t{}", entry.display(), entry.code_point());
        }
    }

    Ok(Outcome::Success)
}

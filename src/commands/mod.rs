pub mod chars;
pub mod config;
pub mod depths;
pub mod export;
pub mod extract;
pub mod new;
pub mod pack;
pub mod types;

use crate::error::ReconcileError;
use crate::output;
use std::path::Path;

/// How a command ended when it did not return an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Everything was processed
    Success,
    /// The command finished, but at least one item failed along the way
    Incomplete,
}

impl Outcome {
    /// `Incomplete` if any item failed
    #[must_use]
    pub const fn from_failures(failures: usize) -> Self {
        if failures == 0 {
            Self::Success
        } else {
            Self::Incomplete
        }
    }
}

/// Report an item that failed while the rest of a command carries on
pub fn print_failure(item: &Path, error: &ReconcileError) {
    match error {
        // These already name the path
        ReconcileError::Access { .. } | ReconcileError::Hash { .. } => {
            output::error(&error.user_message());
        }
        _ => output::error(&format!("{}: {}", item.display(), error.user_message())),
    }
}

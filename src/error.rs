use std::fmt;
use std::path::{Path, PathBuf};

/// Failures that stop or degrade the reconciliation of one directory.
///
/// `Access`, `ToolMissing` and `ToolFailed` abort the directory they occur in;
/// `Hash` only affects a single file and is collected into the report instead
/// of being returned.
#[derive(Debug)]
pub enum ReconcileError {
    /// The target directory or its manifest could not be read, written or locked
    Access {
        /// Directory or manifest that could not be accessed
        path: PathBuf,
        /// Underlying cause
        message: String,
    },
    /// The checksum of one file could not be computed
    Hash {
        /// Manifest-relative path of the file
        path: String,
        /// Underlying cause
        message: String,
    },
    /// A required external binary is not on `PATH`
    ToolMissing {
        /// Binary name as configured
        tool: String,
    },
    /// An external binary ran but failed or produced unusable output
    ToolFailed {
        /// Binary name as configured
        tool: String,
        /// Exit status or decoding failure
        message: String,
    },
}

impl ReconcileError {
    /// Build an `Access` error from any displayable cause.
    pub fn access(path: &Path, cause: impl fmt::Display) -> Self {
        Self::Access {
            path: path.to_path_buf(),
            message: format!("{cause:#}"),
        }
    }

    /// Build a `Hash` error for a manifest-relative path.
    pub fn hash(path: &str, cause: impl fmt::Display) -> Self {
        Self::Hash {
            path: path.to_string(),
            message: format!("{cause:#}"),
        }
    }

    /// Build a `ToolFailed` error.
    pub fn tool_failed(tool: &str, cause: impl fmt::Display) -> Self {
        Self::ToolFailed {
            tool: tool.to_string(),
            message: format!("{cause:#}"),
        }
    }

    /// Get a short description of the error type
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Access { .. } => "Access Error",
            Self::Hash { .. } => "Hash Error",
            Self::ToolMissing { .. } => "Tool Missing",
            Self::ToolFailed { .. } => "Tool Failed",
        }
    }

    /// Get a user-friendly error message with actionable guidance
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Access { path, message } => {
                format!("cannot access {}: {message}", path.display())
            }
            Self::Hash { path, message } => format!("cannot hash {path}: {message}"),
            Self::ToolMissing { tool } => format!(
                "required tool '{tool}' was not found in PATH\n\n\
                 Install it or point the matching [tools] entry of the configuration at it"
            ),
            Self::ToolFailed { tool, message } => format!("{tool} failed: {message}"),
        }
    }
}

impl fmt::Display for ReconcileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.user_message())
    }
}

impl std::error::Error for ReconcileError {}

/// A recorded path that no longer exists on disk.
///
/// Informational only: the manifest keeps the record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingFileWarning {
    /// Manifest-relative path of the vanished file
    pub path: String,
}

impl fmt::Display for MissingFileWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "missing: {}", self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_errors_name_the_tool() {
        let missing = ReconcileError::ToolMissing {
            tool: "bitrot".to_string(),
        };
        assert!(missing.to_string().starts_with("required tool 'bitrot'"));
        assert_eq!(
            ReconcileError::tool_failed("7z", "exit 2").to_string(),
            "7z failed: exit 2"
        );
    }

    #[test]
    fn test_messages_name_the_subject() {
        let err = ReconcileError::access(Path::new("/data/photos"), "Permission denied");
        assert_eq!(
            err.to_string(),
            "cannot access /data/photos: Permission denied"
        );

        let err = ReconcileError::hash("sub/a.bin", "unexpected end of file");
        assert!(err.to_string().contains("sub/a.bin"));
        assert_eq!(err.kind(), "Hash Error");

        let warning = MissingFileWarning {
            path: "foo.txt".to_string(),
        };
        assert_eq!(warning.to_string(), "missing: foo.txt");
    }
}

//! Error types for dtswatch
//!
//! Library errors use `thiserror`; the binary wraps them in `anyhow`.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for dtswatch operations
pub type DtsResult<T> = Result<T, DtsError>;

/// A declaration line that does not follow the grammar.
///
/// `expected` names the token the parser was looking for and `remainder`
/// is the unparsed rest of the line at that point.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("expected {expected} at '{remainder}'")]
pub struct GrammarError {
    pub expected: String,
    pub remainder: String,
}

impl GrammarError {
    pub fn new(expected: impl Into<String>, remainder: &str) -> Self {
        Self {
            expected: expected.into(),
            remainder: remainder.to_string(),
        }
    }
}

/// Main error type for dtswatch operations
#[derive(Error, Debug)]
pub enum DtsError {
    /// Malformed declaration line in a declaration file
    #[error("invalid declaration in {file}:{line}: {source}")]
    Grammar {
        file: PathBuf,
        line: usize,
        #[source]
        source: GrammarError,
    },

    /// A specific file could not be read
    #[error("failed to read {file}: {source}")]
    ReadFailed {
        file: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Directory walk failed
    #[error("directory walk failed: {0}")]
    Walk(#[from] ignore::Error),

    /// Configuration file could not be understood
    #[error("invalid config in {file}: {message}")]
    InvalidConfig { file: PathBuf, message: String },

    /// Declaration root does not exist
    #[error("directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    /// File system watcher could not be set up
    #[error("watch error: {0}")]
    Watch(#[from] notify::Error),

    /// The coordinator thread has exited
    #[error("watch pipeline is no longer running")]
    WorkerStopped,

    /// A read kept failing past the configured attempt limit
    #[error("gave up reading {path} after {attempts} attempts")]
    RetriesExhausted { path: PathBuf, attempts: u32 },
}

impl DtsError {
    /// File the error is attributed to, if any
    pub fn file(&self) -> Option<&std::path::Path> {
        match self {
            DtsError::Grammar { file, .. }
            | DtsError::ReadFailed { file, .. }
            | DtsError::InvalidConfig { file, .. } => Some(file),
            DtsError::DirectoryNotFound { path } | DtsError::RetriesExhausted { path, .. } => {
                Some(path)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_error_display_grammar() {
        let err = DtsError::Grammar {
            file: PathBuf::from("src/math.d.ts"),
            line: 3,
            source: GrammarError::new("'): '", ") number;"),
        };
        assert_eq!(
            err.to_string(),
            "invalid declaration in src/math.d.ts:3: expected '): ' at ') number;'"
        );
    }

    #[test]
    fn test_error_file_attribution() {
        let err = DtsError::InvalidConfig {
            file: PathBuf::from("tsconfig.tsruntime.json"),
            message: "bad".to_string(),
        };
        assert_eq!(err.file(), Some(Path::new("tsconfig.tsruntime.json")));
        assert_eq!(DtsError::WorkerStopped.file(), None);
    }
}

//! Error types for notescan.
//!
//! Library crates use [`NoteScanError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all notescan operations.
#[derive(Debug, thiserror::Error)]
pub enum NoteScanError {
    /// Configuration loading error, or options that cannot work together.
    #[error("config error: {message}")]
    Config { message: String },

    /// Directory walk or file enumeration error.
    #[error("discovery error: {0}")]
    Discovery(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Malformed front matter in a source document.
    #[error("front matter error in {path:?}: {message}")]
    Frontmatter { path: PathBuf, message: String },

    /// Text-generation backend error (load, invocation, or protocol).
    #[error("generation error: {0}")]
    Generation(String),
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, NoteScanError>;

impl NoteScanError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Front matter could not be parsed for the document at `path`.
    pub fn frontmatter(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::Frontmatter {
            path: path.into(),
            message: msg.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = NoteScanError::config("unknown backend");
        assert_eq!(err.to_string(), "config error: unknown backend");

        let err = NoteScanError::frontmatter("notes/a.md", "mapping expected");
        let text = err.to_string();
        assert!(text.contains("notes/a.md"));
        assert!(text.contains("mapping expected"));
    }

    #[test]
    fn io_error_keeps_path() {
        let err = NoteScanError::io(
            "/missing",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(matches!(err, NoteScanError::Io { ref path, .. } if path.ends_with("missing")));
    }

    #[test]
    fn every_variant_has_a_constructor() {
        let errors = [
            NoteScanError::config("c"),
            NoteScanError::Discovery("d".into()),
            NoteScanError::io("p", std::io::Error::other("x")),
            NoteScanError::frontmatter("p", "f"),
            NoteScanError::Generation("g".into()),
        ];
        let kinds: Vec<&str> = errors
            .iter()
            .map(|e| match e {
                NoteScanError::Config { .. } => "config",
                NoteScanError::Discovery(_) => "discovery",
                NoteScanError::Io { .. } => "io",
                NoteScanError::Frontmatter { .. } => "frontmatter",
                NoteScanError::Generation(_) => "generation",
            })
            .collect();
        assert_eq!(kinds, ["config", "discovery", "io", "frontmatter", "generation"]);
    }
}

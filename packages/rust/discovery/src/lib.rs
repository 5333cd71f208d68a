//! Markdown file enumeration under a scan root.
//!
//! Walks the root recursively in file-name order, prunes anything matching
//! the ignore globs, and yields every `.md` / `.markdown` file with its
//! root-relative, forward-slash path. Reading the file is a separate async
//! step so the indexer can suspend on I/O one note at a time.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use tracing::{debug, info, instrument};
use walkdir::WalkDir;

use notescan_markdown::has_markdown_extension;
use notescan_shared::{NoteScanError, Result};

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// A Markdown file found during the walk, not yet read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredFile {
    /// Absolute (or root-joined) path on disk.
    pub path: PathBuf,
    /// Path relative to the scan root, `/`-separated.
    pub relative_path: String,
}

/// A Markdown file with its raw content and modification time.
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Path relative to the scan root, `/`-separated.
    pub relative_path: String,
    /// Raw document text, front matter included.
    pub content: String,
    /// Last modification time reported by the filesystem.
    pub last_modified: DateTime<Utc>,
}

impl DiscoveredFile {
    /// Read content and modification time from disk.
    pub async fn read(&self) -> Result<SourceFile> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| NoteScanError::io(&self.path, e))?;

        let metadata = tokio::fs::metadata(&self.path)
            .await
            .map_err(|e| NoteScanError::io(&self.path, e))?;
        let modified = metadata
            .modified()
            .map_err(|e| NoteScanError::io(&self.path, e))?;

        Ok(SourceFile {
            relative_path: self.relative_path.clone(),
            content,
            last_modified: DateTime::<Utc>::from(modified),
        })
    }
}

// ---------------------------------------------------------------------------
// Main entry point
// ---------------------------------------------------------------------------

/// Enumerate Markdown files under `root`, skipping `ignore_patterns`.
///
/// Patterns are globs matched against the root-relative path of every
/// entry; `*` does not cross `/`. A matching directory is skipped together
/// with everything beneath it.
#[instrument(skip(ignore_patterns), fields(root = %root.display(), patterns = ignore_patterns.len()))]
pub fn discover(root: &Path, ignore_patterns: &[String]) -> Result<Vec<DiscoveredFile>> {
    if !root.is_dir() {
        return Err(NoteScanError::Discovery(format!(
            "scan root {} is not a directory",
            root.display()
        )));
    }

    let ignore = build_ignore_set(ignore_patterns)?;
    let mut files = Vec::new();

    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            // The root itself has an empty relative path and is never pruned.
            match relative_path(root, entry.path()) {
                Some(rel) if !rel.is_empty() => !ignore.is_match(&rel),
                _ => true,
            }
        });

    for entry in walker {
        let entry = entry.map_err(|e| NoteScanError::Discovery(format!("walk failed: {e}")))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let Some(rel) = relative_path(root, entry.path()) else {
            continue;
        };
        if !has_markdown_extension(&rel) {
            continue;
        }

        debug!(path = %rel, "discovered markdown file");
        files.push(DiscoveredFile {
            path: entry.path().to_path_buf(),
            relative_path: rel,
        });
    }

    info!(count = files.len(), "markdown files discovered");
    Ok(files)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Compile ignore patterns into a single matcher.
fn build_ignore_set(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = GlobBuilder::new(pattern)
            .literal_separator(true)
            .build()
            .map_err(|e| NoteScanError::config(format!("invalid ignore pattern '{pattern}': {e}")))?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| NoteScanError::config(format!("failed to compile ignore patterns: {e}")))
}

/// Root-relative path with `/` separators, or `None` if `path` is outside `root`.
fn relative_path(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts: Vec<_> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect();
    Some(parts.join("/").replace('\\', "/"))
}

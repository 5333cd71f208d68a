//! Core domain types for a notes scan.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Parsed front matter: a YAML mapping converted to JSON values.
pub type Frontmatter = serde_json::Map<String, serde_json::Value>;

// ---------------------------------------------------------------------------
// SeoData
// ---------------------------------------------------------------------------

/// Machine-generated search metadata for one note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeoData {
    /// SEO title. Falls back to the note title when the model gave none.
    pub title: String,
    /// Meta description, absent when none could be parsed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl SeoData {
    /// A record carrying only the fallback title.
    pub fn title_only(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
        }
    }
}

// ---------------------------------------------------------------------------
// ProcessedNode
// ---------------------------------------------------------------------------

/// One Markdown document with its derived identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedNode {
    /// Same value as `full_path_slug`.
    pub id: String,
    /// File name without the Markdown extension, original casing.
    pub title: String,
    /// Path relative to the scan root, forward slashes.
    pub file_path: String,
    /// Slug of the full relative path. Unique within a scan.
    pub full_path_slug: String,
    /// Slug of the file name alone. May collide across folders.
    pub simple_slug: String,
    /// Document body with front matter removed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frontmatter: Option<Frontmatter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seo: Option<SeoData>,
}

// ---------------------------------------------------------------------------
// ScanResult
// ---------------------------------------------------------------------------

/// Output of a scan: every note plus two lookup maps.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResult {
    /// Notes in enumeration order.
    pub all_notes: Vec<ProcessedNode>,
    /// Full-path slug to note.
    pub notes_map_by_full_path_slug: BTreeMap<String, ProcessedNode>,
    /// Simple slug to every full-path slug that shares it.
    pub notes_map_by_simple_slug: BTreeMap<String, BTreeSet<String>>,
}

impl ScanResult {
    /// Simple slugs shared by more than one note, with their full-path slugs.
    pub fn simple_slug_collisions(&self) -> impl Iterator<Item = (&str, &BTreeSet<String>)> {
        self.notes_map_by_simple_slug
            .iter()
            .filter(|(_, full)| full.len() > 1)
            .map(|(simple, full)| (simple.as_str(), full))
    }

    /// Number of notes that carry an SEO record.
    pub fn seo_count(&self) -> usize {
        self.all_notes.iter().filter(|n| n.seo.is_some()).count()
    }
}

//! Path and file-name slugs.
//!
//! A slug keeps the directory hierarchy of its input but restricts every
//! segment to lowercase Latin letters, digits, Hangul syllables and `-`.
//! Segments in other scripts collapse to little or nothing and are dropped
//! when empty.

use std::sync::LazyLock;

use regex::Regex;

use notescan_markdown::strip_markdown_extension;

/// Slugify a relative path or a bare file name.
///
/// `My Folder/Another_Post with_Spaces.md` becomes
/// `my-folder/another-post-with-spaces`.
pub fn slugify(path_or_name: &str) -> String {
    if path_or_name.is_empty() {
        return String::new();
    }

    strip_markdown_extension(path_or_name)
        .replace('\\', "/")
        .split('/')
        .map(slugify_segment)
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

/// Slugify an optional input; `None` yields an empty slug.
pub fn slugify_opt(path_or_name: Option<&str>) -> String {
    path_or_name.map(slugify).unwrap_or_default()
}

/// Title of a note: its file name without the Markdown extension, casing kept.
pub fn title_from_path(path: &str) -> String {
    let normalized = path.replace('\\', "/");
    let file_name = normalized.rsplit('/').next().unwrap_or(&normalized);
    strip_markdown_extension(file_name).to_string()
}

/// File-name component of a relative path (extension kept).
pub fn file_name(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

fn slugify_segment(segment: &str) -> String {
    static SEPARATOR_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"[\s_]+").expect("valid regex"));
    static DISALLOWED_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"[^a-z0-9\x{AC00}-\x{D7A3}-]").expect("valid regex"));
    static HYPHEN_RUN_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"-{2,}").expect("valid regex"));

    let lower = segment.trim().to_lowercase();
    let hyphenated = SEPARATOR_RE.replace_all(&lower, "-");
    let filtered = DISALLOWED_RE.replace_all(&hyphenated, "");
    let collapsed = HYPHEN_RUN_RE.replace_all(&filtered, "-");
    collapsed.trim_matches('-').to_string()
}

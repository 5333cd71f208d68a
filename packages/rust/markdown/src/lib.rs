//! Markdown document helpers: front matter, word tokens, file extensions.
//!
//! Front matter is a leading YAML block fenced by `---` lines. It is parsed
//! with `serde_yaml` and handed back as a JSON object map so downstream
//! crates never depend on YAML types.

mod frontmatter;

use std::sync::LazyLock;

use regex::Regex;

pub use frontmatter::split_frontmatter;

/// Remove one trailing `.md` / `.markdown` extension (case-insensitive).
pub fn strip_markdown_extension(name: &str) -> &str {
    static EXT_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?i)\.(md|markdown)$").expect("valid regex"));

    match EXT_RE.find(name) {
        Some(m) => &name[..m.start()],
        None => name,
    }
}

/// Whether a path or file name carries a Markdown extension.
pub fn has_markdown_extension(name: &str) -> bool {
    strip_markdown_extension(name).len() != name.len()
}

/// Count whitespace-delimited tokens.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// First `max_words` whitespace-delimited tokens, joined by single spaces.
pub fn excerpt_words(text: &str, max_words: usize) -> String {
    text.split_whitespace()
        .take(max_words)
        .collect::<Vec<_>>()
        .join(" ")
}

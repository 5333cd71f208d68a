//! Parsing of labeled SEO responses.
//!
//! The parser scans once for the two labels from [`super::prompt`] and lands
//! in one of three states. Only the `Unlabeled` state may fall back to using
//! the raw text as a description, so a parsed title is never overwritten.

use std::sync::LazyLock;

use regex::Regex;

use notescan_shared::SeoData;

use super::prompt::{DESCRIPTION_LABEL, TITLE_LABEL};

/// Longest description taken from an unlabeled response, in characters.
pub const FALLBACK_DESCRIPTION_CHARS: usize = 160;

static TITLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?is){}\s*(.*?)(?:{}|$)",
        regex::escape(TITLE_LABEL),
        regex::escape(DESCRIPTION_LABEL)
    ))
    .expect("valid regex")
});

static DESCRIPTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?is){}\s*(.*)", regex::escape(DESCRIPTION_LABEL))).expect("valid regex")
});

// A leading title label that lost its colon. Only the start of the text is
// touched; prose that merely mentions an SEO title is kept.
static STRAY_TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*SEO Title\b:?").expect("valid regex"));

/// Result of the label scan.
#[derive(Debug, PartialEq, Eq)]
enum ParseState<'a> {
    /// Nothing to parse.
    Empty,
    /// The title label was found. Its capture may still be blank.
    Labeled {
        title: Option<&'a str>,
        description: Option<&'a str>,
    },
    /// No title label anywhere in the text.
    Unlabeled {
        raw: &'a str,
        description: Option<&'a str>,
    },
}

impl<'a> ParseState<'a> {
    fn scan(raw: Option<&'a str>) -> Self {
        let raw = match raw {
            Some(text) if !text.is_empty() => text,
            _ => return Self::Empty,
        };

        let description = capture(&DESCRIPTION_RE, raw);
        match TITLE_RE.captures(raw) {
            Some(caps) => Self::Labeled {
                title: caps.get(1).map(|m| m.as_str().trim()).filter(|t| !t.is_empty()),
                description,
            },
            None => Self::Unlabeled { raw, description },
        }
    }

    fn resolve(self, fallback_title: &str) -> SeoData {
        match self {
            Self::Empty => SeoData::title_only(fallback_title),
            Self::Labeled { title, description } => SeoData {
                title: title
                    .map(strip_quotes)
                    .unwrap_or(fallback_title)
                    .to_string(),
                description: description.map(|d| strip_quotes(d).to_string()),
            },
            Self::Unlabeled { raw, description } => {
                let mut seo = SeoData {
                    title: fallback_title.to_string(),
                    description: description.map(|d| strip_quotes(d).to_string()),
                };
                let cleaned = STRAY_TITLE_RE.replace(raw, "");
                let cleaned = cleaned.trim();
                if !cleaned.is_empty() {
                    let truncated: String =
                        cleaned.chars().take(FALLBACK_DESCRIPTION_CHARS).collect();
                    seo.description = Some(strip_quotes(&truncated).to_string());
                }
                seo
            }
        }
    }
}

/// Parse raw model output into an [`SeoData`] record.
///
/// `fallback_title` is used whenever no usable title was produced.
pub fn parse_seo_response(raw: Option<&str>, fallback_title: &str) -> SeoData {
    ParseState::scan(raw).resolve(fallback_title)
}

/// Trimmed, non-empty first capture group.
fn capture<'a>(re: &Regex, text: &'a str) -> Option<&'a str> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .filter(|s| !s.is_empty())
}

/// Remove one layer of enclosing double quotes.
fn strip_quotes(s: &str) -> &str {
    if s.len() >= 2 && s.starts_with('"') && s.ends_with('"') {
        &s[1..s.len() - 1]
    } else {
        s
    }
}

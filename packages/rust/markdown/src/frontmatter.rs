//! Leading YAML front matter extraction.

use std::path::Path;

use serde_json::Value;
use tracing::debug;

use notescan_shared::{Frontmatter, NoteScanError, Result};

const FENCE: &str = "---";

/// Split raw document text into `(body, front matter)`.
///
/// A document has front matter when its first line is `---` and a later
/// line is `---` again. Without a closing fence the whole text is body.
/// `path` is only used for error context.
pub fn split_frontmatter(path: &Path, raw: &str) -> Result<(String, Frontmatter)> {
    let text = raw.strip_prefix('\u{feff}').unwrap_or(raw);

    let Some((yaml, body)) = fenced_block(text) else {
        return Ok((text.to_string(), Frontmatter::new()));
    };

    if yaml.trim().is_empty() {
        return Ok((body.to_string(), Frontmatter::new()));
    }

    let value: Value = serde_yaml::from_str(yaml)
        .map_err(|e| NoteScanError::frontmatter(path, e.to_string()))?;

    let frontmatter = match value {
        Value::Object(map) => map,
        Value::Null => Frontmatter::new(),
        other => {
            return Err(NoteScanError::frontmatter(
                path,
                format!("expected a mapping, found {}", kind(&other)),
            ));
        }
    };

    debug!(path = %path.display(), keys = frontmatter.len(), "front matter parsed");
    Ok((body.to_string(), frontmatter))
}

/// Locate the fenced block. Returns `(yaml, body)` slices of `text`.
fn fenced_block(text: &str) -> Option<(&str, &str)> {
    let mut lines = text.split_inclusive('\n');
    let first = lines.next()?;
    if first.trim_end() != FENCE {
        return None;
    }

    let yaml_start = first.len();
    let mut offset = yaml_start;
    for line in lines {
        if line.trim_end() == FENCE {
            let yaml = &text[yaml_start..offset];
            let body = &text[offset + line.len()..];
            return Some((yaml, body));
        }
        offset += line.len();
    }
    None
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "a mapping",
    }
}

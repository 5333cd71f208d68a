//! Script-presence language heuristic.
//!
//! A title is treated as English unless it contains at least one character
//! from a listed non-Latin script. One hit is enough; there is no threshold.

use std::fmt;
use std::ops::RangeInclusive;

// Precomposed syllables only, the same range slugs keep.
const HANGUL: &[RangeInclusive<char>] = &['\u{AC00}'..='\u{D7A3}'];
// Hiragana and Katakana
const KANA: &[RangeInclusive<char>] = &['\u{3040}'..='\u{30FF}'];
const CJK_IDEOGRAPHS: &[RangeInclusive<char>] = &['\u{4E00}'..='\u{9FFF}'];
const CYRILLIC: &[RangeInclusive<char>] = &['\u{0400}'..='\u{04FF}'];

/// Non-Latin scripts that mark text as not English.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Script {
    Hangul,
    Kana,
    CjkIdeograph,
    Cyrillic,
}

impl Script {
    /// Checked in this order; the first script present wins.
    pub const DETECTION_ORDER: [Script; 4] = [
        Script::Hangul,
        Script::Kana,
        Script::CjkIdeograph,
        Script::Cyrillic,
    ];

    fn ranges(self) -> &'static [RangeInclusive<char>] {
        match self {
            Script::Hangul => HANGUL,
            Script::Kana => KANA,
            Script::CjkIdeograph => CJK_IDEOGRAPHS,
            Script::Cyrillic => CYRILLIC,
        }
    }

    /// Whether `c` belongs to this script.
    pub fn contains(self, c: char) -> bool {
        self.ranges().iter().any(|range| range.contains(&c))
    }
}

impl fmt::Display for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Script::Hangul => "hangul",
            Script::Kana => "kana",
            Script::CjkIdeograph => "cjk",
            Script::Cyrillic => "cyrillic",
        };
        f.write_str(name)
    }
}

/// First non-Latin script (in [`Script::DETECTION_ORDER`]) present in `text`.
pub fn detect_script(text: &str) -> Option<Script> {
    Script::DETECTION_ORDER
        .into_iter()
        .find(|script| text.chars().any(|c| script.contains(c)))
}

/// `true` when `text` is empty or contains none of the listed scripts.
pub fn is_likely_english(text: &str) -> bool {
    detect_script(text).is_none()
}

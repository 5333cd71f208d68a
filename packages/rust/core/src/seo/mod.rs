//! SEO title/description generation for a single note.
//!
//! Gates run first and short-circuit to a skip: the title must look English
//! and the body must be long enough. Past the gates, the prompt is built from
//! a word-truncated excerpt, sent to the [`TextGenerator`], and the reply is
//! parsed. Backend failures are logged and reported as skips; they never
//! reach the caller as errors.

pub mod language;
pub mod prompt;
pub mod response;

use std::fmt;

use tracing::{debug, instrument, warn};

use notescan_markdown::{excerpt_words, word_count};
use notescan_shared::{LlmConfig, Result, SeoData};

use crate::generator::{GenerationRequest, TextGenerator};

pub use language::{Script, detect_script, is_likely_english};
pub use prompt::{DESCRIPTION_LABEL, TITLE_LABEL, build_seo_prompt};
pub use response::parse_seo_response;

// ---------------------------------------------------------------------------
// Settings and outcomes
// ---------------------------------------------------------------------------

/// Thresholds and generation bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeoSettings {
    /// Minimum whitespace-delimited words in the body.
    pub min_content_words: usize,
    /// Words of the body included in the prompt.
    pub max_prompt_words: usize,
    pub min_new_tokens: u32,
    pub max_new_tokens: u32,
}

impl Default for SeoSettings {
    fn default() -> Self {
        Self::from(&LlmConfig::default())
    }
}

impl From<&LlmConfig> for SeoSettings {
    fn from(config: &LlmConfig) -> Self {
        Self {
            min_content_words: config.min_content_length_for_seo,
            max_prompt_words: config.max_content_length_for_prompt,
            min_new_tokens: config.min_new_tokens,
            max_new_tokens: config.max_new_tokens,
        }
    }
}

/// Why a note got no SEO record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    NonEnglishTitle { script: Script },
    ContentTooShort { words: usize, minimum: usize },
    EmptyGeneration,
    GenerationFailed(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonEnglishTitle { script } => write!(f, "title contains {script} script"),
            Self::ContentTooShort { words, minimum } => {
                write!(f, "content has {words} words, needs {minimum}")
            }
            Self::EmptyGeneration => f.write_str("model returned no text"),
            Self::GenerationFailed(e) => write!(f, "generation failed: {e}"),
        }
    }
}

/// Result of one SEO attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeoOutcome {
    Generated(SeoData),
    Skipped(SkipReason),
}

impl SeoOutcome {
    /// The record, or `None` for any skip.
    pub fn into_seo(self) -> Option<SeoData> {
        match self {
            Self::Generated(seo) => Some(seo),
            Self::Skipped(_) => None,
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped(_))
    }
}

// ---------------------------------------------------------------------------
// SeoGenerator
// ---------------------------------------------------------------------------

/// Gated, prompt-driven SEO generation over a text-generation backend.
#[derive(Debug)]
pub struct SeoGenerator<G> {
    generator: G,
    settings: SeoSettings,
}

impl<G: TextGenerator> SeoGenerator<G> {
    pub fn new(generator: G, settings: SeoSettings) -> Self {
        Self {
            generator,
            settings,
        }
    }

    pub fn settings(&self) -> &SeoSettings {
        &self.settings
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    /// Give the backend back, e.g. to shut it down.
    pub fn into_generator(self) -> G {
        self.generator
    }

    /// Generate SEO metadata for one note, or report why it was skipped.
    #[instrument(skip(self, content), fields(model = %self.generator.model_name()))]
    pub async fn generate(&self, original_title: &str, content: &str) -> SeoOutcome {
        if let Some(script) = detect_script(original_title) {
            debug!(%script, "skipping SEO: non-English title");
            return SeoOutcome::Skipped(SkipReason::NonEnglishTitle { script });
        }

        let words = word_count(content);
        if words < self.settings.min_content_words {
            debug!(words, minimum = self.settings.min_content_words, "skipping SEO: content too short");
            return SeoOutcome::Skipped(SkipReason::ContentTooShort {
                words,
                minimum: self.settings.min_content_words,
            });
        }

        match self.request_seo(original_title, content).await {
            Ok(Some(seo)) => SeoOutcome::Generated(seo),
            Ok(None) => {
                warn!("model returned no usable text, skipping SEO");
                SeoOutcome::Skipped(SkipReason::EmptyGeneration)
            }
            Err(e) => {
                warn!(error = %e, "SEO generation failed, skipping");
                SeoOutcome::Skipped(SkipReason::GenerationFailed(e.to_string()))
            }
        }
    }

    async fn request_seo(&self, original_title: &str, content: &str) -> Result<Option<SeoData>> {
        let excerpt = excerpt_words(content, self.settings.max_prompt_words);
        let request = GenerationRequest {
            prompt: build_seo_prompt(original_title, &excerpt),
            min_new_tokens: self.settings.min_new_tokens,
            max_new_tokens: self.settings.max_new_tokens,
        };

        let output = self.generator.generate(&request).await?;
        let Some(text) = output.first_text() else {
            return Ok(None);
        };

        let text = strip_prompt_echo(text, &request.prompt);
        if text.is_empty() {
            return Ok(None);
        }

        Ok(Some(parse_seo_response(Some(text), original_title)))
    }
}

/// Drop the prompt when a backend returns it in front of the completion.
fn strip_prompt_echo<'a>(text: &'a str, prompt: &str) -> &'a str {
    text.strip_prefix(prompt).unwrap_or(text).trim()
}

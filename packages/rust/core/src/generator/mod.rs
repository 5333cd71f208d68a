//! Text-generation backends.
//!
//! The SEO generator only needs "prompt in, generated text out". Backends
//! implement [`TextGenerator`]; [`ConfiguredGenerator`] picks one from the
//! `[llm]` config section at runtime.

mod bridge;
mod http;
#[cfg(test)]
pub(crate) mod scripted;

use std::future::Future;

use serde::{Deserialize, Serialize};

use notescan_shared::{GeneratorBackend, LlmConfig, Result};

pub use bridge::{BridgeGenerator, BridgeSettings};
pub use http::HttpGenerator;

// ---------------------------------------------------------------------------
// Request / response shapes
// ---------------------------------------------------------------------------

/// One generation call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationRequest {
    pub prompt: String,
    /// Floor on generated tokens.
    pub min_new_tokens: u32,
    /// Ceiling on generated tokens.
    pub max_new_tokens: u32,
}

/// A single generation result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedText {
    pub generated_text: String,
}

/// Backends answer with either one result or a list of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GenerationOutput {
    Single(GeneratedText),
    Batch(Vec<GeneratedText>),
}

impl GenerationOutput {
    /// Text of the first result. `None` when there is no result or the
    /// first one is blank; later results are never consulted.
    pub fn first_text(&self) -> Option<&str> {
        let first = match self {
            Self::Single(one) => Some(one),
            Self::Batch(many) => many.first(),
        };
        first
            .map(|t| t.generated_text.as_str())
            .filter(|t| !t.trim().is_empty())
    }
}

// ---------------------------------------------------------------------------
// TextGenerator
// ---------------------------------------------------------------------------

/// A text-generation model reachable through some runtime.
pub trait TextGenerator: Send + Sync {
    /// Model identifier, for logs.
    fn model_name(&self) -> &str;

    /// Run one generation.
    fn generate(
        &self,
        request: &GenerationRequest,
    ) -> impl Future<Output = Result<GenerationOutput>> + Send;
}

/// Placeholder generator type for indexers that never generate SEO.
#[derive(Debug, Clone, Copy)]
pub enum NoGenerator {}

impl TextGenerator for NoGenerator {
    fn model_name(&self) -> &str {
        match *self {}
    }

    async fn generate(&self, _request: &GenerationRequest) -> Result<GenerationOutput> {
        match *self {}
    }
}

// ---------------------------------------------------------------------------
// ConfiguredGenerator
// ---------------------------------------------------------------------------

/// Backend chosen from configuration.
#[derive(Debug)]
pub enum ConfiguredGenerator {
    Http(HttpGenerator),
    Bridge(BridgeGenerator),
}

impl ConfiguredGenerator {
    /// Build the backend named by `config.backend`. Nothing is loaded yet.
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        match config.backend {
            GeneratorBackend::Http => Ok(Self::Http(HttpGenerator::new(
                &config.model_name,
                &config.endpoint,
            )?)),
            GeneratorBackend::Bridge => Ok(Self::Bridge(BridgeGenerator::new(
                BridgeSettings::from_config(config),
            ))),
        }
    }

    /// Release backend resources (stops a running bridge subprocess).
    pub async fn shutdown(self) {
        if let Self::Bridge(bridge) = self {
            bridge.shutdown().await;
        }
    }
}

impl TextGenerator for ConfiguredGenerator {
    fn model_name(&self) -> &str {
        match self {
            Self::Http(g) => g.model_name(),
            Self::Bridge(g) => g.model_name(),
        }
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationOutput> {
        match self {
            Self::Http(g) => g.generate(request).await,
            Self::Bridge(g) => g.generate(request).await,
        }
    }
}

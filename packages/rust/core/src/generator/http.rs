//! Text generation over HTTP.
//!
//! Speaks the text-generation-inference request shape:
//! `{ inputs, parameters: { min_new_tokens, max_new_tokens, return_full_text } }`.
//! Hosted inference APIs answer with a list, a local server with a single
//! object; both decode into [`GenerationOutput`].

use reqwest::Client;
use serde::Serialize;
use tracing::{debug, instrument};
use url::Url;

use notescan_shared::{NoteScanError, Result};

use super::{GenerationOutput, GenerationRequest, TextGenerator};

/// User-Agent string for generation requests.
const USER_AGENT: &str = concat!("notescan/", env!("CARGO_PKG_VERSION"));

/// Longest error body echoed back in an error message.
const MAX_ERROR_BODY: usize = 200;

#[derive(Debug, Serialize)]
struct GenerateBody<'a> {
    model: &'a str,
    inputs: &'a str,
    parameters: GenerateParameters,
}

#[derive(Debug, Serialize)]
struct GenerateParameters {
    min_new_tokens: u32,
    max_new_tokens: u32,
    return_full_text: bool,
}

/// Generator backed by an HTTP endpoint.
#[derive(Debug, Clone)]
pub struct HttpGenerator {
    client: Client,
    endpoint: Url,
    model: String,
}

impl HttpGenerator {
    /// Create a generator for `model` served at `endpoint`.
    ///
    /// No request timeout is set; a slow model blocks the caller.
    pub fn new(model: &str, endpoint: &str) -> Result<Self> {
        let endpoint = Url::parse(endpoint).map_err(|e| {
            NoteScanError::config(format!("invalid generation endpoint '{endpoint}': {e}"))
        })?;

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| NoteScanError::config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint,
            model: model.to_string(),
        })
    }

    /// The endpoint requests are posted to.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

impl TextGenerator for HttpGenerator {
    fn model_name(&self) -> &str {
        &self.model
    }

    #[instrument(skip_all, fields(endpoint = %self.endpoint, model = %self.model))]
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationOutput> {
        let body = GenerateBody {
            model: &self.model,
            inputs: &request.prompt,
            parameters: GenerateParameters {
                min_new_tokens: request.min_new_tokens,
                max_new_tokens: request.max_new_tokens,
                return_full_text: false,
            },
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&body)
            .send()
            .await
            .map_err(|e| NoteScanError::Generation(format!("{}: {e}", self.endpoint)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let snippet: String = text.chars().take(MAX_ERROR_BODY).collect();
            return Err(NoteScanError::Generation(format!(
                "{}: HTTP {status}: {snippet}",
                self.endpoint
            )));
        }

        let output: GenerationOutput = response.json().await.map_err(|e| {
            NoteScanError::Generation(format!("{}: unexpected response body: {e}", self.endpoint))
        })?;

        debug!("generation response received");
        Ok(output)
    }
}

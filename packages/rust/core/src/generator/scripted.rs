//! In-memory generator for tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use notescan_shared::{NoteScanError, Result};

use super::{GeneratedText, GenerationOutput, GenerationRequest, TextGenerator};

/// One canned answer.
#[derive(Debug, Clone)]
pub(crate) enum Reply {
    Single(String),
    Batch(Vec<String>),
    Fail(String),
}

/// Replays canned replies in order and records every request.
/// Once the script runs out, the last reply repeats.
#[derive(Debug)]
pub(crate) struct ScriptedGenerator {
    replies: Mutex<VecDeque<Reply>>,
    last: Mutex<Option<Reply>>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedGenerator {
    pub(crate) fn new(replies: impl IntoIterator<Item = Reply>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            last: Mutex::new(None),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn always(text: &str) -> Self {
        Self::new([Reply::Single(text.to_string())])
    }

    pub(crate) fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn next_reply(&self) -> Reply {
        let mut last = self.last.lock().unwrap();
        if let Some(reply) = self.replies.lock().unwrap().pop_front() {
            *last = Some(reply);
        }
        last.clone()
            .unwrap_or_else(|| Reply::Fail("no scripted reply".into()))
    }
}

impl TextGenerator for ScriptedGenerator {
    fn model_name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationOutput> {
        self.requests.lock().unwrap().push(request.clone());
        match self.next_reply() {
            Reply::Single(text) => Ok(GenerationOutput::Single(GeneratedText {
                generated_text: text,
            })),
            Reply::Batch(texts) => Ok(GenerationOutput::Batch(
                texts
                    .into_iter()
                    .map(|generated_text| GeneratedText { generated_text })
                    .collect(),
            )),
            Reply::Fail(message) => Err(NoteScanError::Generation(message)),
        }
    }
}

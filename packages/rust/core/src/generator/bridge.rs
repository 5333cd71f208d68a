//! Local model runner over a JSON-lines subprocess bridge.
//!
//! The runner is spawned on the first generation request (that is when the
//! model gets loaded) and then kept alive for the rest of the scan. Requests
//! are serialized through an async mutex, so only one generation runs at a
//! time. A runner that fails to start is not restarted.

use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use notescan_shared::{LlmConfig, NoteScanError, Result};

use super::{GenerationOutput, GenerationRequest, TextGenerator};

// ---------------------------------------------------------------------------
// Protocol types
// ---------------------------------------------------------------------------

/// Request message sent to the runner.
#[derive(Debug, Serialize)]
#[serde(tag = "type")]
enum RequestMessage<'a> {
    #[serde(rename = "generate")]
    Generate {
        id: String,
        model: &'a str,
        #[serde(flatten)]
        request: &'a GenerationRequest,
    },
    #[serde(rename = "shutdown")]
    Shutdown,
}

/// Response message received from the runner.
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum ResponseMessage {
    #[serde(rename = "ready")]
    Ready,
    #[serde(rename = "result")]
    Result { id: String, output: GenerationOutput },
    #[serde(rename = "error")]
    Error { id: String, error: String },
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// How to launch the runner. Passed in at construction; the runner reads
/// its model settings from environment variables set on the child only.
#[derive(Debug, Clone)]
pub struct BridgeSettings {
    pub command: String,
    pub args: Vec<String>,
    pub working_dir: Option<PathBuf>,
    pub model: String,
    pub allow_local_models: bool,
    pub cache_dir: Option<PathBuf>,
}

impl BridgeSettings {
    pub fn from_config(config: &LlmConfig) -> Self {
        Self {
            command: config.bridge.command.clone(),
            args: config.bridge.args.clone(),
            working_dir: config.bridge.working_dir.clone(),
            model: config.model_name.clone(),
            allow_local_models: config.bridge.allow_local_models,
            cache_dir: config.bridge.cache_dir.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Bridge handle
// ---------------------------------------------------------------------------

/// Handle to the spawned runner subprocess.
#[derive(Debug)]
struct BridgeHandle {
    child: Child,
    stdin: ChildStdin,
    reader: BufReader<ChildStdout>,
    request_counter: u64,
}

impl BridgeHandle {
    /// Spawn the runner and wait until it reports ready.
    async fn spawn(settings: &BridgeSettings) -> Result<Self> {
        info!(cmd = %settings.command, model = %settings.model, "starting model runner");

        let mut command = Command::new(&settings.command);
        command
            .args(&settings.args)
            .env("NOTESCAN_MODEL", &settings.model)
            .env(
                "NOTESCAN_ALLOW_LOCAL_MODELS",
                if settings.allow_local_models { "1" } else { "0" },
            )
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit()) // Runner logs go to our stderr
            .kill_on_drop(true);
        if let Some(dir) = &settings.working_dir {
            command.current_dir(dir);
        }
        if let Some(cache) = &settings.cache_dir {
            command.env("NOTESCAN_CACHE_DIR", cache);
        }

        let mut child = command.spawn().map_err(|e| {
            NoteScanError::Generation(format!(
                "failed to spawn model runner: {e}. Is `{}` installed?",
                settings.command
            ))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| NoteScanError::Generation("failed to capture runner stdin".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| NoteScanError::Generation("failed to capture runner stdout".into()))?;

        let mut handle = Self {
            child,
            stdin,
            reader: BufReader::new(stdout),
            request_counter: 0,
        };
        handle.wait_for_ready().await?;
        Ok(handle)
    }

    async fn read_message(&mut self) -> Result<ResponseMessage> {
        let mut line = String::new();
        let read = self
            .reader
            .read_line(&mut line)
            .await
            .map_err(|e| NoteScanError::Generation(format!("runner read error: {e}")))?;

        if read == 0 {
            return Err(NoteScanError::Generation(
                "runner closed stdout unexpectedly".into(),
            ));
        }

        serde_json::from_str(line.trim()).map_err(|e| {
            let shown: String = line.chars().take(200).collect();
            NoteScanError::Generation(format!("invalid runner message: {e} (got: {shown})"))
        })
    }

    async fn wait_for_ready(&mut self) -> Result<()> {
        match self.read_message().await? {
            ResponseMessage::Ready => {
                info!("model runner is ready");
                Ok(())
            }
            other => Err(NoteScanError::Generation(format!(
                "expected ready message, got: {other:?}"
            ))),
        }
    }

    async fn write_message(&mut self, message: &RequestMessage<'_>) -> Result<()> {
        let mut json = serde_json::to_string(message).map_err(|e| {
            NoteScanError::Generation(format!("failed to serialize request: {e}"))
        })?;
        json.push('\n');

        self.stdin
            .write_all(json.as_bytes())
            .await
            .map_err(|e| NoteScanError::Generation(format!("failed to write to runner: {e}")))?;
        self.stdin
            .flush()
            .await
            .map_err(|e| NoteScanError::Generation(format!("failed to flush runner stdin: {e}")))
    }

    /// Send one generation request and wait for its answer.
    async fn send(&mut self, model: &str, request: &GenerationRequest) -> Result<GenerationOutput> {
        self.request_counter += 1;
        let id = format!("req-{}", self.request_counter);

        self.write_message(&RequestMessage::Generate {
            id: id.clone(),
            model,
            request,
        })
        .await?;

        match self.read_message().await? {
            ResponseMessage::Result {
                id: resp_id,
                output,
            } if resp_id == id => Ok(output),
            ResponseMessage::Result { id: resp_id, .. } => Err(NoteScanError::Generation(
                format!("runner answered {resp_id}, expected {id}"),
            )),
            ResponseMessage::Error { id: resp_id, error } => {
                debug!(id = %resp_id, "runner reported an error");
                Err(NoteScanError::Generation(error))
            }
            ResponseMessage::Ready => Err(NoteScanError::Generation(
                "unexpected ready message during generation".into(),
            )),
        }
    }

    fn exit_status(&mut self) -> Option<ExitStatus> {
        self.child.try_wait().ok().flatten()
    }

    /// Ask the runner to exit and wait for it.
    async fn shutdown(mut self) {
        if let Err(e) = self.write_message(&RequestMessage::Shutdown).await {
            debug!(error = %e, "could not send shutdown to runner");
        }
        drop(self.stdin);

        match self.child.wait().await {
            Ok(status) => info!(?status, "model runner exited"),
            Err(e) => warn!("model runner wait error: {e}"),
        }
    }
}

// ---------------------------------------------------------------------------
// BridgeGenerator
// ---------------------------------------------------------------------------

#[derive(Debug)]
enum BridgeState {
    Unloaded,
    Ready(BridgeHandle),
    Failed(String),
}

/// Generator backed by a lazily started local model runner.
#[derive(Debug)]
pub struct BridgeGenerator {
    settings: BridgeSettings,
    state: Mutex<BridgeState>,
}

impl BridgeGenerator {
    pub fn new(settings: BridgeSettings) -> Self {
        Self {
            settings,
            state: Mutex::new(BridgeState::Unloaded),
        }
    }

    /// Stop the runner if it was started.
    pub async fn shutdown(self) {
        if let BridgeState::Ready(handle) = self.state.into_inner() {
            handle.shutdown().await;
        }
    }
}

/// Start the runner on first use and hand out the live handle.
async fn ready_handle<'a>(
    settings: &BridgeSettings,
    state: &'a mut BridgeState,
) -> Result<&'a mut BridgeHandle> {
    if matches!(state, BridgeState::Unloaded) {
        *state = match BridgeHandle::spawn(settings).await {
            Ok(handle) => BridgeState::Ready(handle),
            Err(e) => {
                warn!(error = %e, "model runner failed to start");
                BridgeState::Failed(e.to_string())
            }
        };
    }

    match state {
        BridgeState::Ready(handle) => Ok(handle),
        BridgeState::Failed(reason) => Err(NoteScanError::Generation(format!(
            "model runner unavailable: {reason}"
        ))),
        BridgeState::Unloaded => Err(NoteScanError::Generation(
            "model runner not started".into(),
        )),
    }
}

impl TextGenerator for BridgeGenerator {
    fn model_name(&self) -> &str {
        &self.settings.model
    }

    #[instrument(skip_all, fields(model = %self.settings.model))]
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationOutput> {
        let mut state = self.state.lock().await;
        let handle = ready_handle(&self.settings, &mut state).await?;

        let result = handle.send(&self.settings.model, request).await;
        if result.is_err() {
            if let Some(status) = handle.exit_status() {
                warn!(?status, "model runner exited");
                *state = BridgeState::Failed(format!("runner exited with {status}"));
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> GenerationRequest {
        GenerationRequest {
            prompt: "Write SEO".into(),
            min_new_tokens: 15,
            max_new_tokens: 120,
        }
    }

    fn shell_runner(script: &str) -> BridgeGenerator {
        BridgeGenerator::new(BridgeSettings {
            command: "sh".into(),
            args: vec!["-c".into(), script.into()],
            working_dir: None,
            model: "tiny-model".into(),
            allow_local_models: true,
            cache_dir: None,
        })
    }

    // Answers every request with its sequential id; echoes the model env var.
    const ECHO_RUNNER: &str = r#"
echo '{"type":"ready"}'
i=0
while IFS= read -r line; do
  case "$line" in *'"shutdown"'*) exit 0;; esac
  i=$((i+1))
  echo "{\"type\":\"result\",\"id\":\"req-$i\",\"output\":[{\"generated_text\":\"SEO Title: $NOTESCAN_MODEL $i\"}]}"
done
"#;

    #[test]
    fn generate_message_serializes_flat() {
        let req = request();
        let msg = RequestMessage::Generate {
            id: "req-1".into(),
            model: "m",
            request: &req,
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "generate");
        assert_eq!(json["id"], "req-1");
        assert_eq!(json["model"], "m");
        assert_eq!(json["prompt"], "Write SEO");
        assert_eq!(json["min_new_tokens"], 15);
        assert_eq!(json["max_new_tokens"], 120);
    }

    #[test]
    fn shutdown_message_serializes_correctly() {
        let json = serde_json::to_string(&RequestMessage::Shutdown).unwrap();
        assert_eq!(json, r#"{"type":"shutdown"}"#);
    }

    #[test]
    fn result_message_accepts_both_output_shapes() {
        let single = r#"{"type":"result","id":"req-1","output":{"generated_text":"a"}}"#;
        let list = r#"{"type":"result","id":"req-2","output":[{"generated_text":"b"}]}"#;
        for (json, expected) in [(single, "a"), (list, "b")] {
            match serde_json::from_str::<ResponseMessage>(json).unwrap() {
                ResponseMessage::Result { output, .. } => {
                    assert_eq!(output.first_text(), Some(expected));
                }
                other => panic!("expected Result, got {other:?}"),
            }
        }
    }

    #[test]
    fn error_message_deserializes() {
        let json = r#"{"type":"error","id":"req-3","error":"out of memory"}"#;
        match serde_json::from_str::<ResponseMessage>(json).unwrap() {
            ResponseMessage::Error { id, error } => {
                assert_eq!(id, "req-3");
                assert_eq!(error, "out of memory");
            }
            other => panic!("expected Error, got {other:?}"),
        }
    }

    #[test]
    fn settings_come_from_llm_config() {
        let config = LlmConfig::default();
        let settings = BridgeSettings::from_config(&config);
        assert_eq!(settings.model, config.model_name);
        assert_eq!(settings.command, "python3");
        assert!(settings.allow_local_models);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn runner_starts_lazily_and_serves_requests() {
        let bridge = shell_runner(ECHO_RUNNER);
        assert!(matches!(*bridge.state.lock().await, BridgeState::Unloaded));

        let first = bridge.generate(&request()).await.unwrap();
        assert_eq!(first.first_text(), Some("SEO Title: tiny-model 1"));

        let second = bridge.generate(&request()).await.unwrap();
        assert_eq!(second.first_text(), Some("SEO Title: tiny-model 2"));

        bridge.shutdown().await;
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn runner_sees_local_model_permission_and_cache_dir() {
        let script = r#"
echo '{"type":"ready"}'
while IFS= read -r line; do
  case "$line" in *'"shutdown"'*) exit 0;; esac
  echo "{\"type\":\"result\",\"id\":\"req-1\",\"output\":{\"generated_text\":\"$NOTESCAN_ALLOW_LOCAL_MODELS $NOTESCAN_CACHE_DIR\"}}"
done
"#;
        let bridge = BridgeGenerator::new(BridgeSettings {
            command: "sh".into(),
            args: vec!["-c".into(), script.into()],
            working_dir: None,
            model: "tiny-model".into(),
            allow_local_models: true,
            cache_dir: Some(PathBuf::from("/tmp/models")),
        });

        let output = bridge.generate(&request()).await.unwrap();
        assert_eq!(output.first_text(), Some("1 /tmp/models"));
        bridge.shutdown().await;
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn runner_error_does_not_kill_the_bridge() {
        let script = r#"
echo '{"type":"ready"}'
i=0
while IFS= read -r line; do
  i=$((i+1))
  if [ "$i" = 1 ]; then
    echo "{\"type\":\"error\",\"id\":\"req-1\",\"error\":\"boom\"}"
  else
    echo "{\"type\":\"result\",\"id\":\"req-$i\",\"output\":{\"generated_text\":\"ok\"}}"
  fi
done
"#;
        let bridge = shell_runner(script);

        let err = bridge.generate(&request()).await.unwrap_err();
        assert_eq!(err.to_string(), "generation error: boom");

        let ok = bridge.generate(&request()).await.unwrap();
        assert_eq!(ok.first_text(), Some("ok"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn runner_exiting_before_ready_is_remembered() {
        let bridge = shell_runner("exit 3");

        let err = bridge.generate(&request()).await.unwrap_err();
        assert!(err.to_string().contains("unavailable"));
        assert!(matches!(*bridge.state.lock().await, BridgeState::Failed(_)));

        let again = bridge.generate(&request()).await.unwrap_err();
        assert!(again.to_string().contains("closed stdout"));
    }

    #[tokio::test]
    async fn missing_runner_binary_fails_fast() {
        let bridge = BridgeGenerator::new(BridgeSettings {
            command: "/nonexistent/notescan-runner".into(),
            args: vec![],
            working_dir: None,
            model: "m".into(),
            allow_local_models: false,
            cache_dir: None,
        });

        let err = bridge.generate(&request()).await.unwrap_err();
        assert!(err.to_string().contains("failed to spawn"));
        let again = bridge.generate(&request()).await.unwrap_err();
        assert!(again.to_string().contains("unavailable"));
    }
}

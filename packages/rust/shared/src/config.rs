//! Application configuration for notescan.
//!
//! User config lives at `~/.notescan/notescan.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{NoteScanError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "notescan.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".notescan";

// ---------------------------------------------------------------------------
// Config structs (matching notescan.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Scan defaults.
    #[serde(default)]
    pub scan: ScanConfig,

    /// Text-generation settings.
    #[serde(default)]
    pub llm: LlmConfig,
}

/// `[scan]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Glob patterns (relative to the scan root) excluded from the walk.
    #[serde(default = "default_ignore_patterns")]
    pub ignore_patterns: Vec<String>,

    /// Attach the document body to each note.
    #[serde(default = "default_true")]
    pub include_content: bool,

    /// Attach parsed front matter to each note.
    #[serde(default)]
    pub include_frontmatter: bool,

    /// Attach the file modification time to each note.
    #[serde(default)]
    pub include_last_modified: bool,

    /// Generate SEO title/description for English notes.
    #[serde(default)]
    pub generate_seo: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            ignore_patterns: default_ignore_patterns(),
            include_content: true,
            include_frontmatter: false,
            include_last_modified: false,
            generate_seo: false,
        }
    }
}

/// Version-control and dependency directories plus dotfiles.
pub fn default_ignore_patterns() -> Vec<String> {
    vec!["**/.git".into(), "**/node_modules".into(), "**/.*".into()]
}

fn default_true() -> bool {
    true
}

/// Which text-generation backend to talk to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeneratorBackend {
    /// A text-generation HTTP endpoint.
    #[default]
    Http,
    /// A local model-runner subprocess speaking JSON lines.
    Bridge,
}

/// `[llm]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Model identifier passed to the backend.
    #[serde(default = "default_model_name")]
    pub model_name: String,

    /// Minimum whitespace-delimited words before SEO generation is attempted.
    #[serde(default = "default_min_content_length")]
    pub min_content_length_for_seo: usize,

    /// Number of leading words of the document included in the prompt.
    #[serde(default = "default_max_prompt_length")]
    pub max_content_length_for_prompt: usize,

    /// Floor on generated tokens.
    #[serde(default = "default_min_new_tokens")]
    pub min_new_tokens: u32,

    /// Ceiling on generated tokens.
    #[serde(default = "default_max_new_tokens")]
    pub max_new_tokens: u32,

    /// Backend selection.
    #[serde(default)]
    pub backend: GeneratorBackend,

    /// Generation endpoint for the `http` backend.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Subprocess settings for the `bridge` backend.
    #[serde(default)]
    pub bridge: BridgeConfig,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model_name: default_model_name(),
            min_content_length_for_seo: default_min_content_length(),
            max_content_length_for_prompt: default_max_prompt_length(),
            min_new_tokens: default_min_new_tokens(),
            max_new_tokens: default_max_new_tokens(),
            backend: GeneratorBackend::default(),
            endpoint: default_endpoint(),
            bridge: BridgeConfig::default(),
        }
    }
}

fn default_model_name() -> String {
    "HuggingFaceTB/SmolLM2-360M-Instruct".into()
}
fn default_min_content_length() -> usize {
    50
}
fn default_max_prompt_length() -> usize {
    250
}
fn default_min_new_tokens() -> u32 {
    15
}
fn default_max_new_tokens() -> u32 {
    120
}
fn default_endpoint() -> String {
    "http://127.0.0.1:8080/generate".into()
}

/// `[llm.bridge]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Executable that runs the model (e.g. `python3`).
    #[serde(default = "default_bridge_command")]
    pub command: String,

    /// Arguments passed to the executable.
    #[serde(default = "default_bridge_args")]
    pub args: Vec<String>,

    /// Working directory for the subprocess. Defaults to the current directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<PathBuf>,

    /// Allow the runner to load model weights from local disk.
    #[serde(default = "default_true")]
    pub allow_local_models: bool,

    /// Directory where the runner caches downloaded models.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            command: default_bridge_command(),
            args: default_bridge_args(),
            working_dir: None,
            allow_local_models: true,
            cache_dir: None,
        }
    }
}

fn default_bridge_command() -> String {
    "python3".into()
}
fn default_bridge_args() -> Vec<String> {
    vec!["scripts/generate_bridge.py".into()]
}

// ---------------------------------------------------------------------------
// Scan options (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Override for the path-to-slug function.
pub type SlugFn = fn(&str) -> String;

/// Runtime scan configuration, merged from the config file and CLI flags.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Root directory to scan.
    pub content_path: PathBuf,
    /// Glob patterns excluded from the walk.
    pub ignore_patterns: Vec<String>,
    /// Replacement for the built-in slug generator.
    pub slugify: Option<SlugFn>,
    /// Attach the document body to each note.
    pub include_content: bool,
    /// Attach parsed front matter to each note.
    pub include_frontmatter: bool,
    /// Attach the file modification time to each note.
    pub include_last_modified: bool,
    /// Run SEO generation per note.
    pub generate_seo: bool,
    /// Text-generation settings.
    pub llm: LlmConfig,
}

impl ScanOptions {
    /// Options for `content_path` with every other field at its default.
    pub fn new(content_path: impl Into<PathBuf>) -> Self {
        Self::from_config(content_path, &AppConfig::default())
    }

    /// Options for `content_path` seeded from a loaded config file.
    pub fn from_config(content_path: impl Into<PathBuf>, config: &AppConfig) -> Self {
        Self {
            content_path: content_path.into(),
            ignore_patterns: config.scan.ignore_patterns.clone(),
            slugify: None,
            include_content: config.scan.include_content,
            include_frontmatter: config.scan.include_frontmatter,
            include_last_modified: config.scan.include_last_modified,
            generate_seo: config.scan.generate_seo,
            llm: config.llm.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.notescan/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| NoteScanError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.notescan/notescan.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| NoteScanError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| NoteScanError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let path = config_file_path()?;
    init_config_at(&path)?;
    Ok(path)
}

/// Write a default config file at `path`, creating parent directories.
pub fn init_config_at(path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| NoteScanError::io(dir, e))?;
    }

    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| NoteScanError::config(e.to_string()))?;

    std::fs::write(path, content).map_err(|e| NoteScanError::io(path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(())
}

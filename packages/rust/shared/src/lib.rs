//! Shared types, error model, and configuration for notescan.
//!
//! This crate is the foundation depended on by all other notescan crates.
//! It provides:
//! - [`NoteScanError`], the unified error type
//! - Domain types ([`ProcessedNode`], [`SeoData`], [`ScanResult`])
//! - Configuration ([`AppConfig`], [`ScanOptions`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, BridgeConfig, GeneratorBackend, LlmConfig, ScanConfig, ScanOptions, SlugFn,
    config_dir, config_file_path, default_ignore_patterns, init_config, init_config_at, load_config,
    load_config_from,
};
pub use error::{NoteScanError, Result};
pub use types::{Frontmatter, ProcessedNode, ScanResult, SeoData};

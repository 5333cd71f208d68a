//! Note indexing and SEO generation for notescan.
//!
//! This crate ties together discovery, front matter parsing, slug derivation,
//! and optional model-backed SEO metadata into a single scan (`NoteIndexer`).

pub mod generator;
pub mod pipeline;
pub mod seo;
pub mod slug;

pub use generator::{ConfiguredGenerator, NoGenerator, TextGenerator};
pub use pipeline::{NoteIndexer, ScanProgress, SilentProgress};
pub use seo::{SeoGenerator, SeoOutcome, SeoSettings, SkipReason};
pub use slug::{slugify, slugify_opt};

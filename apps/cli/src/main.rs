//! notescan CLI: index a folder of Markdown notes.
//!
//! Walks a notes directory, derives slugs and lookup maps, and optionally
//! asks a local text-generation model for SEO titles and descriptions.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}

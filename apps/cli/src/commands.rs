//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use notescan_core::pipeline::{NoteIndexer, ScanProgress};
use notescan_core::{ConfiguredGenerator, SeoGenerator, SeoSettings, slugify};
use notescan_shared::{
    AppConfig, ScanOptions, ScanResult, config_file_path, init_config, init_config_at, load_config,
    load_config_from,
};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// notescan: index Markdown notes into slugs, lookup maps, and SEO metadata.
#[derive(Parser)]
#[command(
    name = "notescan",
    version,
    about = "Index a folder of Markdown notes into slugs, lookup maps, and optional SEO metadata.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file to use instead of ~/.notescan/notescan.toml.
    #[arg(long, global = true, env = "NOTESCAN_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Scan a notes directory and print the index as JSON.
    Scan(ScanArgs),

    /// Print the slug of each input path or name.
    Slug {
        /// Paths or file names to slugify.
        #[arg(required = true)]
        inputs: Vec<String>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Flags for `notescan scan`. Boolean flags only ever switch a feature on
/// relative to the config file; `--no-content` switches content off.
#[derive(Args, Debug)]
pub(crate) struct ScanArgs {
    /// Root directory of the notes.
    pub path: PathBuf,

    /// Generate SEO titles and descriptions with the configured model.
    #[arg(long)]
    pub seo: bool,

    /// Include parsed front matter for each note.
    #[arg(long)]
    pub frontmatter: bool,

    /// Include each file's modification time.
    #[arg(long)]
    pub last_modified: bool,

    /// Omit note bodies from the output.
    #[arg(long)]
    pub no_content: bool,

    /// Extra ignore glob (repeatable), added to the configured patterns.
    #[arg(long = "ignore", value_name = "GLOB")]
    pub ignore: Vec<String>,

    /// Model name override.
    #[arg(long)]
    pub model: Option<String>,

    /// Write JSON here instead of stdout.
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
///
/// Logs go to stderr so stdout stays clean for JSON output.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "notescan=info",
        1 => "notescan=debug",
        _ => "notescan=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();
    match cli.command {
        Command::Scan(args) => cmd_scan(args, config_path).await,
        Command::Slug { inputs } => cmd_slug(&inputs),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(config_path),
            ConfigAction::Show => cmd_config_show(config_path),
        },
    }
}

fn resolve_config(config_path: Option<&Path>) -> Result<AppConfig> {
    let config = match config_path {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    Ok(config)
}

// ---------------------------------------------------------------------------
// scan
// ---------------------------------------------------------------------------

/// Merge config-file values with command-line flags.
fn scan_options(args: &ScanArgs, config: &AppConfig) -> ScanOptions {
    let mut options = ScanOptions::from_config(&args.path, config);
    options.ignore_patterns.extend(args.ignore.iter().cloned());
    options.include_frontmatter |= args.frontmatter;
    options.include_last_modified |= args.last_modified;
    options.generate_seo |= args.seo;
    if args.no_content {
        options.include_content = false;
    }
    if let Some(model) = &args.model {
        options.llm.model_name = model.clone();
    }
    options
}

async fn cmd_scan(args: ScanArgs, config_path: Option<&Path>) -> Result<()> {
    let config = resolve_config(config_path)?;
    let options = scan_options(&args, &config);
    let start = Instant::now();

    info!(
        path = %options.content_path.display(),
        seo = options.generate_seo,
        model = %options.llm.model_name,
        "scanning notes"
    );

    let progress = CliProgress::new();

    let result = if options.generate_seo {
        let generator = ConfiguredGenerator::from_config(&options.llm)?;
        let seo = SeoGenerator::new(generator, SeoSettings::from(&options.llm));
        let indexer = NoteIndexer::new(options).with_seo_generator(seo);

        let result = indexer.scan(&progress).await;
        if let Some(seo) = indexer.into_seo_generator() {
            seo.into_generator().shutdown().await;
        }
        result
    } else {
        NoteIndexer::new(options).scan(&progress).await
    };
    progress.clear();
    let result = result?;

    let json = serde_json::to_string_pretty(&result)?;
    match &args.out {
        Some(path) => std::fs::write(path, json)
            .wrap_err_with(|| format!("failed to write {}", path.display()))?,
        None => println!("{json}"),
    }

    print_summary(&result, start.elapsed().as_secs_f64(), args.out.as_deref());
    Ok(())
}

fn print_summary(result: &ScanResult, elapsed_secs: f64, out: Option<&Path>) {
    eprintln!();
    eprintln!("  Notes:      {}", result.all_notes.len());
    eprintln!("  SEO:        {}", result.seo_count());
    for (simple, full) in result.simple_slug_collisions() {
        let paths: Vec<&str> = full.iter().map(String::as_str).collect();
        eprintln!("  Collision:  {simple} -> {}", paths.join(", "));
    }
    if let Some(path) = out {
        eprintln!("  Output:     {}", path.display());
    }
    eprintln!("  Time:       {elapsed_secs:.1}s");
    eprintln!();
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            spinner.set_style(
                style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
            );
        }
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }

    fn clear(&self) {
        if !self.spinner.is_finished() {
            self.spinner.finish_and_clear();
        }
    }
}

impl ScanProgress for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn note_processed(&self, path: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Indexing [{current}/{total}] {path}"));
    }

    fn done(&self, _result: &ScanResult) {
        self.spinner.finish_and_clear();
    }
}

// ---------------------------------------------------------------------------
// slug / config
// ---------------------------------------------------------------------------

fn cmd_slug(inputs: &[String]) -> Result<()> {
    for input in inputs {
        println!("{}", slugify(input));
    }
    Ok(())
}

fn cmd_config_init(config_path: Option<&Path>) -> Result<()> {
    let path = match config_path {
        Some(path) => {
            init_config_at(path)?;
            path.to_path_buf()
        }
        None => init_config()?,
    };
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config_path: Option<&Path>) -> Result<()> {
    let config = resolve_config(config_path)?;
    let source = match config_path {
        Some(path) => path.to_path_buf(),
        None => config_file_path()?,
    };
    let toml_str = toml::to_string_pretty(&config)
        .map_err(|e| eyre!("failed to render config: {e}"))?;
    println!("# {}", source.display());
    println!("{toml_str}");
    Ok(())
}

//! valuescreen CLI: index scrape, statistics pipeline, and charts.
//!
//! Commands:
//! - `tickers`: print the index constituents (cached after the first fetch)
//! - `run`: fetch, normalize, join, and export the screen
//! - `plot`: browse or save a scatter chart of the last screen
//! - `config init`: write the default config file
//! - `cache status`: show the identifier cache

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use valuescreen_core::config::ScreenConfig;
use valuescreen_core::data::{fetch_identifiers, IdentifierCache, StdoutProgress};
use valuescreen_core::normalize::MalformedPolicy;
use valuescreen_runner::export::SCREEN_CSV_FILE;
use valuescreen_runner::{load_screen_csv, run_pipeline, save_artifacts, RunOptions};
use valuescreen_tui::paths::{load_config, resolve_config_path, user_config_path};
use valuescreen_tui::snapshot::{DEFAULT_HEIGHT, DEFAULT_WIDTH};

#[derive(Parser)]
#[command(
    name = "valuescreen",
    about = "valuescreen: value screen over the EURO STOXX 50"
)]
struct Cli {
    /// Config file. Defaults to ./valuescreen.toml, then the user config dir.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the index constituents.
    Tickers {
        /// Re-scrape the index page instead of reading the cache.
        #[arg(long, default_value_t = false)]
        reload: bool,
    },
    /// Fetch statistics for every constituent and export the screen.
    Run {
        /// Re-scrape the index page instead of reading the cache.
        #[arg(long, default_value_t = false)]
        reload: bool,

        /// Drop rows with unparseable numeric cells instead of aborting.
        #[arg(long, default_value_t = false)]
        skip_malformed: bool,

        /// Output directory. Overrides `pipeline.output_dir`.
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Plot a scatter chart of the screen.
    Plot {
        /// Chart kind, by name or alias (e.g. valuePS, valueDiv, valuePB, valueEBITDA).
        kind: String,

        /// Screen CSV. Defaults to screen.csv in the output directory.
        #[arg(long)]
        input: Option<PathBuf>,

        /// Write a text rendering here instead of opening the browser.
        #[arg(long)]
        save: Option<PathBuf>,

        #[arg(long, default_value_t = DEFAULT_WIDTH)]
        width: u16,

        #[arg(long, default_value_t = DEFAULT_HEIGHT)]
        height: u16,
    },
    /// Config file commands.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Identifier cache commands.
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Write the built-in defaults as a TOML file.
    Init {
        /// Target path. Defaults to the user config dir.
        #[arg(long)]
        path: Option<PathBuf>,

        /// Overwrite an existing file.
        #[arg(long, default_value_t = false)]
        force: bool,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// Show what the identifier cache holds.
    Status,
}

fn main() -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .try_init();

    let cli = Cli::parse();
    let explicit = cli.config.as_deref();

    match cli.command {
        Commands::Tickers { reload } => run_tickers(&load_config(explicit)?, reload),
        Commands::Run {
            reload,
            skip_malformed,
            output_dir,
        } => run_screen(&load_config(explicit)?, reload, skip_malformed, output_dir),
        Commands::Plot {
            kind,
            input,
            save,
            width,
            height,
        } => run_plot(
            &load_config(explicit)?,
            &kind,
            input,
            save.as_deref(),
            width,
            height,
        ),
        Commands::Config { action } => match action {
            ConfigAction::Init { path, force } => run_config_init(path, force),
        },
        Commands::Cache { action } => match action {
            CacheAction::Status => run_cache_status(&load_config(explicit)?, explicit),
        },
    }
}

fn run_tickers(config: &ScreenConfig, reload: bool) -> Result<()> {
    let source = config.identifier_source();
    let cache = IdentifierCache::new(&config.pipeline.cache_dir);
    let identifiers = fetch_identifiers(&source, &cache, reload)
        .with_context(|| format!("reading constituents from {}", config.source.url))?;

    for id in &identifiers {
        println!("{id}");
    }
    println!("\n{} identifiers", identifiers.len());
    Ok(())
}

fn run_screen(
    config: &ScreenConfig,
    reload: bool,
    skip_malformed: bool,
    output_dir: Option<PathBuf>,
) -> Result<()> {
    let source = config.identifier_source();
    let provider = config.statistics_provider();
    let cache = IdentifierCache::new(&config.pipeline.cache_dir);
    let progress = StdoutProgress::new("Fetching");
    let opts = RunOptions {
        force_refresh: reload,
        malformed: skip_malformed.then_some(MalformedPolicy::SkipRow),
    };

    let report = run_pipeline(config, &source, &cache, &provider, &progress, &opts)?;

    for (label, result) in [("valuation", &report.valuation), ("extended", &report.extended)] {
        for (id, err) in &result.failures {
            eprintln!("Skipped {id} ({label}): {err}");
        }
    }

    let output_dir = output_dir.unwrap_or_else(|| config.pipeline.output_dir.clone());
    let manifest = save_artifacts(&report, &output_dir)?;

    println!();
    println!("Identifiers: {}", manifest.identifiers);
    println!(
        "Valuation:   {}/{} fetched",
        manifest.valuation.succeeded, manifest.valuation.total
    );
    println!(
        "Extended:    {}/{} fetched",
        manifest.extended.succeeded, manifest.extended.total
    );
    println!(
        "Screen:      {} rows x {} columns",
        manifest.screen_rows, manifest.screen_columns
    );
    println!("Artifacts saved to: {}", output_dir.display());
    Ok(())
}

fn run_plot(
    config: &ScreenConfig,
    kind: &str,
    input: Option<PathBuf>,
    save: Option<&Path>,
    width: u16,
    height: u16,
) -> Result<()> {
    let input = input.unwrap_or_else(|| config.pipeline.output_dir.join(SCREEN_CSV_FILE));
    if !input.is_file() {
        bail!(
            "screen not found: {} (run `valuescreen run` first or pass --input)",
            input.display()
        );
    }
    let table = load_screen_csv(&input, &config.columns)?;
    valuescreen_tui::plot(&table, kind, save, width, height)?;
    Ok(())
}

fn run_config_init(path: Option<PathBuf>, force: bool) -> Result<()> {
    let path = path.unwrap_or_else(user_config_path);
    if path.exists() && !force {
        bail!(
            "{} already exists (pass --force to overwrite)",
            path.display()
        );
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    let toml = ScreenConfig::default().to_toml()?;
    std::fs::write(&path, toml).with_context(|| format!("writing {}", path.display()))?;
    println!("Wrote default config to {}", path.display());
    Ok(())
}

fn run_cache_status(config: &ScreenConfig, explicit: Option<&Path>) -> Result<()> {
    match resolve_config_path(explicit) {
        Some(path) => println!("Config: {}", path.display()),
        None => println!("Config: built-in defaults"),
    }

    let cache = IdentifierCache::new(&config.pipeline.cache_dir);
    println!("Cache:  {}", cache.path().display());

    match cache.load()? {
        Some(cached) => {
            println!("Source:      {}", cached.source);
            println!("Fetched at:  {}", cached.fetched_at);
            println!("Identifiers: {}", cached.identifiers.len());
            println!("Hash:        {}", cached.content_hash);
        }
        None => println!("No usable identifier cache; the next run will fetch."),
    }
    Ok(())
}

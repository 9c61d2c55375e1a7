//! Chart browser over the last screen written by `valuescreen run`.
//!
//! Usage: `valuescreen-tui [CHART_KIND]` (defaults to the price/sales chart).
//! Honours `VALUESCREEN_CONFIG` for the config path and `RUST_LOG` for logging.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use tracing_subscriber::EnvFilter;
use valuescreen_core::chart::ChartKind;
use valuescreen_runner::export::SCREEN_CSV_FILE;
use valuescreen_runner::load_screen_csv;
use valuescreen_tui::paths::load_config;
use valuescreen_tui::{parse_kind, run_interactive};

fn main() -> Result<()> {
    // Logs go to stderr so they never interleave with the alternate screen.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .try_init();

    // An unknown kind has already printed the usage list.
    let kind = match std::env::args().nth(1) {
        Some(name) => match parse_kind(&name) {
            Some(kind) => kind,
            None => return Ok(()),
        },
        None => ChartKind::RatioVsGrowthVsPe,
    };

    let explicit = std::env::var_os("VALUESCREEN_CONFIG").map(PathBuf::from);
    let config = load_config(explicit.as_deref())?;
    let screen_path = config.pipeline.output_dir.join(SCREEN_CSV_FILE);
    if !screen_path.is_file() {
        bail!(
            "no screen at {}; run `valuescreen run` first",
            screen_path.display()
        );
    }
    let table = load_screen_csv(&screen_path, &config.columns)
        .with_context(|| format!("reading {}", screen_path.display()))?;
    tracing::info!(rows = table.height(), chart = %kind, "opening chart browser");

    run_interactive(table, kind)
}

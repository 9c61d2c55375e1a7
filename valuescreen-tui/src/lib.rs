//! valuescreen TUI: scatter charts over a finished screen.
//!
//! - `scatter`: the chart widget (size shown as tertile buckets)
//! - `viewer`: interactive browser with a hover line
//! - `snapshot`: plain-text rendering for `--save`
//! - `paths`: config file discovery

pub mod paths;
pub mod scatter;
pub mod snapshot;
pub mod theme;
pub mod viewer;

use std::path::Path;

use anyhow::Result;
use valuescreen_core::chart::{usage, ChartKind};
use valuescreen_core::table::WideTable;

pub use theme::Theme;
pub use viewer::{run_interactive, Viewer};

/// What `plot` ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlotOutcome {
    /// The kind name was not recognised; usage was printed.
    UnknownKind,
    Saved,
    Browsed,
}

/// Chart kind by name or alias. An unknown name prints the valid kinds
/// to stdout and gives `None`.
pub fn parse_kind(name: &str) -> Option<ChartKind> {
    match name.parse() {
        Ok(kind) => Some(kind),
        Err(err) => {
            println!("{err}");
            print!("{}", usage());
            None
        }
    }
}

/// Plot `table` as the chart named `kind`.
///
/// An unrecognised name prints the list of valid kinds and draws nothing.
/// With `save`, the chart is written as text; otherwise the interactive
/// browser opens.
pub fn plot(
    table: &WideTable,
    kind: &str,
    save: Option<&Path>,
    width: u16,
    height: u16,
) -> Result<PlotOutcome> {
    let Some(kind) = parse_kind(kind) else {
        return Ok(PlotOutcome::UnknownKind);
    };

    match save {
        Some(path) => {
            snapshot::save(table, kind, path, width, height)?;
            println!("Saved {kind} to {}", path.display());
            Ok(PlotOutcome::Saved)
        }
        None => {
            run_interactive(table.clone(), kind)?;
            Ok(PlotOutcome::Browsed)
        }
    }
}

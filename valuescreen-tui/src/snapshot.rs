//! Non-interactive chart rendering to plain text, for `plot --save` and
//! for terminals where the browser cannot start.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use ratatui::backend::TestBackend;
use ratatui::buffer::Buffer;
use ratatui::Terminal;
use valuescreen_core::chart::{scatter_points, ChartKind, ScatterPoint};
use valuescreen_core::table::WideTable;

use crate::scatter::{self, size_buckets, BUCKET_NAMES};
use crate::theme::Theme;

pub const DEFAULT_WIDTH: u16 = 100;
pub const DEFAULT_HEIGHT: u16 = 30;

/// Render `kind` for `table` as text: the chart grid followed by one line
/// per plotted point.
pub fn render_text(table: &WideTable, kind: ChartKind, width: u16, height: u16) -> Result<String> {
    let points = scatter_points(table, kind);
    let spec = kind.spec();
    let theme = Theme::default();

    let mut terminal = Terminal::new(TestBackend::new(width.max(20), height.max(8)))?;
    terminal.draw(|f| {
        let area = f.area();
        scatter::render(f, area, &spec, &points, None, &theme);
    })?;

    let mut out = buffer_to_text(terminal.backend().buffer());
    out.push('\n');
    out.push_str(&point_listing(kind, &points));
    Ok(out)
}

/// Render and write to `path`, creating parent directories.
pub fn save(table: &WideTable, kind: ChartKind, path: &Path, width: u16, height: u16) -> Result<()> {
    let text = render_text(table, kind, width, height)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    fs::write(path, text).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

fn buffer_to_text(buffer: &Buffer) -> String {
    let width = buffer.area.width as usize;
    let mut out = String::new();
    for row in buffer.content.chunks(width.max(1)) {
        let line: String = row.iter().map(|c| c.symbol()).collect();
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

fn point_listing(kind: ChartKind, points: &[ScatterPoint]) -> String {
    let spec = kind.spec();
    if points.is_empty() {
        return format!("no plottable rows for {kind}\n");
    }
    let buckets = size_buckets(points);
    let mut out = format!(
        "{:<10} {:>12} {:>12} {:>12}  {}\n",
        "Ticker", "x", "y", "size", "bucket"
    );
    for (p, b) in points.iter().zip(buckets) {
        out.push_str(&format!(
            "{:<10} {:>12.2} {:>12.2} {:>12.2}  {}\n",
            p.identifier, p.x, p.y, p.size, BUCKET_NAMES[b]
        ));
    }
    out.push_str(&format!("x = {}, y = {}, size = {}\n", spec.x, spec.y, spec.size));
    out
}

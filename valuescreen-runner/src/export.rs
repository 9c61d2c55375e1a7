//! Run artifacts: long-form CSVs, the joined screen (CSV + Parquet) and a
//! JSON manifest.
//!
//! Layout under the output directory:
//! - `valuation_long.csv`: `Ticker,Attribute,Recent`
//! - `extended_long.csv`: `Ticker,Attribute,Value`
//! - `screen.csv` / `screen.parquet`: joined, normalized table
//! - `manifest.json`: counts, failures, dataset hash
//!
//! Manifests carry a `schema_version`; unknown versions are rejected on load.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use valuescreen_core::chart::{ChartKind, GROWTH_COLUMN, SIZE_COLUMN};
use valuescreen_core::config::ColumnsConfig;
use valuescreen_core::data::CollectResult;
use valuescreen_core::frame::write_parquet;
use valuescreen_core::table::{Column, LongTable, WideTable, ATTRIBUTE_COLUMN};

use crate::pipeline::PipelineReport;

pub const SCHEMA_VERSION: u32 = 1;

pub const VALUATION_LONG_FILE: &str = "valuation_long.csv";
pub const EXTENDED_LONG_FILE: &str = "extended_long.csv";
pub const SCREEN_CSV_FILE: &str = "screen.csv";
pub const SCREEN_PARQUET_FILE: &str = "screen.parquet";
pub const MANIFEST_FILE: &str = "manifest.json";

// ─── CSV export ─────────────────────────────────────────────────────

/// Long-form table as `Ticker,Attribute,<value label>`.
pub fn export_long_csv(long: &LongTable) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        valuescreen_core::table::INDEX_COLUMN,
        ATTRIBUTE_COLUMN,
        long.value_label(),
    ])?;
    for r in long.records() {
        wtr.write_record([&r.identifier, &r.attribute, &r.value])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Wide table with the index as first column. Absent cells are empty.
pub fn export_wide_csv(table: &WideTable) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    let mut header = vec![table.index_name()];
    header.extend(table.column_names());
    wtr.write_record(&header)?;

    for (row, id) in table.identifiers().iter().enumerate() {
        let mut record = Vec::with_capacity(table.width() + 1);
        record.push(id.clone());
        for col in table.columns() {
            record.push(col.values.display(row).unwrap_or_default());
        }
        wtr.write_record(&record)?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Names the screen holds as floats: every coerced column after renaming,
/// plus the columns the charts plot.
pub fn numeric_columns(columns: &ColumnsConfig) -> HashSet<String> {
    let mut names: HashSet<String> = columns
        .valuation
        .iter()
        .chain(columns.extended.iter())
        .filter(|spec| spec.coerce.is_some())
        .map(|spec| spec.output_name().to_string())
        .collect();
    names.insert(GROWTH_COLUMN.to_string());
    names.insert(SIZE_COLUMN.to_string());
    names.extend(ChartKind::ALL.iter().map(|k| k.y_column().to_string()));
    names
}

/// Parse a wide CSV written by [`export_wide_csv`].
///
/// Columns named in `numeric` come back as floats when every non-empty
/// cell parses; everything else stays text, however numeric it looks.
pub fn import_wide_csv(text: &str, numeric: &HashSet<String>) -> Result<WideTable> {
    let mut rdr = csv::Reader::from_reader(text.as_bytes());
    let headers = rdr.headers().context("CSV has no header row")?.clone();
    if headers.is_empty() {
        bail!("CSV header row is empty");
    }

    let width = headers.len();
    let mut identifiers = Vec::new();
    let mut cells: Vec<Vec<Option<String>>> = vec![Vec::new(); width - 1];
    for (i, record) in rdr.records().enumerate() {
        let record = record.with_context(|| format!("bad CSV record {}", i + 1))?;
        identifiers.push(record.get(0).unwrap_or_default().to_string());
        for (c, column) in cells.iter_mut().enumerate() {
            let cell = record.get(c + 1).unwrap_or_default();
            column.push((!cell.is_empty()).then(|| cell.to_string()));
        }
    }

    let mut table = WideTable::with_index_name(&headers[0], identifiers)?;
    for (name, values) in headers.iter().skip(1).zip(cells) {
        let column = if numeric.contains(name) {
            float_column(name, values)
        } else {
            Column::text(name, values)
        };
        table.push_column(column)?;
    }
    Ok(table)
}

fn float_column(name: &str, values: Vec<Option<String>>) -> Column {
    let parsed: Option<Vec<Option<f64>>> = values
        .iter()
        .map(|v| match v {
            None => Some(None),
            Some(s) => s.parse::<f64>().ok().map(Some),
        })
        .collect();
    match parsed {
        Some(floats) => Column::float(name, floats),
        None => {
            tracing::warn!(column = name, "numeric column has unparseable cells, keeping text");
            Column::text(name, values)
        }
    }
}

/// Read a `screen.csv` back for plotting, typing columns per `columns`.
pub fn load_screen_csv(path: &Path, columns: &ColumnsConfig) -> Result<WideTable> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_wide_csv(&text, &numeric_columns(columns))
        .with_context(|| format!("failed to parse {}", path.display()))
}

// ─── Manifest ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureEntry {
    pub identifier: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub total: usize,
    pub succeeded: usize,
    pub records: usize,
    pub failures: Vec<FailureEntry>,
}

impl From<&CollectResult> for DatasetSummary {
    fn from(result: &CollectResult) -> Self {
        Self {
            total: result.total,
            succeeded: result.succeeded,
            records: result.records.len(),
            failures: result
                .failures
                .iter()
                .map(|(id, e)| FailureEntry {
                    identifier: id.clone(),
                    reason: e.to_string(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunManifest {
    pub schema_version: u32,
    pub created_at: chrono::NaiveDateTime,
    pub identifiers: usize,
    pub valuation: DatasetSummary,
    pub extended: DatasetSummary,
    pub screen_rows: usize,
    pub screen_columns: usize,
    /// BLAKE3 of `screen.csv`.
    pub dataset_hash: String,
}

impl RunManifest {
    pub fn from_report(report: &PipelineReport, screen_csv: &str) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            created_at: chrono::Local::now().naive_local(),
            identifiers: report.identifiers.len(),
            valuation: DatasetSummary::from(&report.valuation),
            extended: DatasetSummary::from(&report.extended),
            screen_rows: report.screen.height(),
            screen_columns: report.screen.width(),
            dataset_hash: blake3::hash(screen_csv.as_bytes()).to_hex().to_string(),
        }
    }
}

pub fn load_manifest(dir: &Path) -> Result<RunManifest> {
    let path = dir.join(MANIFEST_FILE);
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let manifest: RunManifest =
        serde_json::from_str(&json).context("failed to deserialize run manifest")?;
    if manifest.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            manifest.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(manifest)
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Write every artifact of a run into `output_dir` (created if needed).
/// Returns the manifest that was written.
pub fn save_artifacts(report: &PipelineReport, output_dir: &Path) -> Result<RunManifest> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create output dir: {}", output_dir.display()))?;

    write(output_dir, VALUATION_LONG_FILE, &export_long_csv(&report.valuation.records)?)?;
    write(output_dir, EXTENDED_LONG_FILE, &export_long_csv(&report.extended.records)?)?;

    let screen_csv = export_wide_csv(&report.screen)?;
    write(output_dir, SCREEN_CSV_FILE, &screen_csv)?;
    write_parquet(&report.screen, &output_dir.join(SCREEN_PARQUET_FILE))
        .context("failed to write screen.parquet")?;

    let manifest = RunManifest::from_report(report, &screen_csv);
    let json = serde_json::to_string_pretty(&manifest).context("failed to serialize manifest")?;
    write(output_dir, MANIFEST_FILE, &json)?;

    tracing::info!(dir = %output_dir.display(), rows = manifest.screen_rows, "artifacts saved");
    Ok(manifest)
}

fn write(dir: &Path, name: &str, content: &str) -> Result<PathBuf> {
    let path = dir.join(name);
    std::fs::write(&path, content).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_long() -> LongTable {
        let mut long = LongTable::new("Recent");
        long.push("SAP.DE", "Trailing P/E", "15.2");
        long.push("SAP.DE", "Market Cap", "250.12B");
        long
    }

    fn sample_wide() -> WideTable {
        let mut t = WideTable::new(vec!["ADS.DE".into(), "SAP.DE".into()]).unwrap();
        t.push_column(Column::float("Trailing P/E", vec![None, Some(15.2)]))
            .unwrap();
        t.push_column(Column::text(
            "Market Cap",
            vec![Some("40.1B".into()), Some("250.12B".into())],
        ))
        .unwrap();
        t
    }

    #[test]
    fn long_csv_header_uses_value_label() {
        let csv = export_long_csv(&sample_long()).unwrap();
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("Ticker,Attribute,Recent"));
        assert_eq!(lines.next(), Some("SAP.DE,Trailing P/E,15.2"));
    }

    #[test]
    fn wide_csv_leaves_absent_cells_empty() {
        let csv = export_wide_csv(&sample_wide()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "Ticker,Trailing P/E,Market Cap");
        assert_eq!(lines[1], "ADS.DE,,40.1B");
        assert_eq!(lines[2], "SAP.DE,15.2,250.12B");
    }

    fn default_numeric() -> HashSet<String> {
        numeric_columns(&ColumnsConfig::default())
    }

    #[test]
    fn wide_csv_reads_back_with_types() {
        let table = sample_wide();
        let back = import_wide_csv(&export_wide_csv(&table).unwrap(), &default_numeric()).unwrap();
        assert_eq!(back, table);
    }

    #[test]
    fn unlisted_numeric_looking_column_stays_text() {
        let csv = "Ticker,Trailing P/E,Avg Vol (3 month)\nADS.DE,40.2,1234\nSAP.DE,15.2,5678\n";
        let back = import_wide_csv(csv, &default_numeric()).unwrap();
        assert!(back.column("Trailing P/E").unwrap().values.is_float());
        assert!(!back.column("Avg Vol (3 month)").unwrap().values.is_float());
        assert_eq!(back.text("SAP.DE", "Avg Vol (3 month)"), Some("5678"));
    }

    #[test]
    fn numeric_columns_follow_coercions_and_charts() {
        let names = default_numeric();
        assert!(names.contains("% Held by Insiders"));
        assert!(names.contains(GROWTH_COLUMN));
        assert!(names.contains("Price/Book (mrq)"));
        assert!(!names.contains("% Held by Insiders 1"));
        assert!(!names.contains("52-Week Change %"));
    }

    #[test]
    fn listed_column_with_text_cells_stays_text() {
        let back = import_wide_csv("Ticker,Trailing P/E\nA,n/a\nB,3.5\n", &default_numeric()).unwrap();
        assert!(!back.column("Trailing P/E").unwrap().values.is_float());
    }

    #[test]
    fn all_empty_columns() {
        let back = import_wide_csv("Ticker,x,Trailing P/E\nA,,\nB,,\n", &default_numeric()).unwrap();
        assert!(!back.column("x").unwrap().values.is_float());
        assert!(back.column("Trailing P/E").unwrap().values.is_float());
        assert_eq!(back.height(), 2);
    }

    #[test]
    fn manifest_rejects_future_schema() {
        let dir = tempfile::tempdir().unwrap();
        let json = r#"{"schema_version":99,"created_at":"2024-01-01T00:00:00","identifiers":0,
            "valuation":{"total":0,"succeeded":0,"records":0,"failures":[]},
            "extended":{"total":0,"succeeded":0,"records":0,"failures":[]},
            "screen_rows":0,"screen_columns":0,"dataset_hash":"x"}"#;
        std::fs::write(dir.path().join(MANIFEST_FILE), json).unwrap();
        let err = load_manifest(dir.path()).unwrap_err();
        assert!(err.to_string().contains("unsupported schema version"));
    }
}

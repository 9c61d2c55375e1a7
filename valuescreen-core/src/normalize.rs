//! Column normalization: footnote renames and numeric coercion.
//!
//! Both steps are driven by one declarative list of [`ColumnSpec`]s, each
//! mapping a raw provider label to an optional canonical name and an
//! optional coercion mode. Renames are exact-match lookups; labels outside
//! the list pass through untouched.

use crate::table::{Column, ColumnValues, WideTable};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// How a text cell becomes a float.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoercionMode {
    /// Direct numeric parse of the trimmed text.
    Number,
    /// Strip a trailing `%` marker, then parse.
    Percent,
}

/// What to do with a cell that does not parse under its coercion mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MalformedPolicy {
    /// Fail the whole run.
    #[default]
    Abort,
    /// Drop the offending row and keep going.
    SkipRow,
}

/// One entry of the column table: raw label → canonical name / coercion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub raw: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canonical: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coerce: Option<CoercionMode>,
}

impl ColumnSpec {
    pub fn rename(raw: &str, canonical: &str) -> Self {
        Self {
            raw: raw.into(),
            canonical: Some(canonical.into()),
            coerce: None,
        }
    }

    pub fn coerce(raw: &str, mode: CoercionMode) -> Self {
        Self {
            raw: raw.into(),
            canonical: None,
            coerce: Some(mode),
        }
    }

    pub fn rename_and_coerce(raw: &str, canonical: &str, mode: CoercionMode) -> Self {
        Self {
            raw: raw.into(),
            canonical: Some(canonical.into()),
            coerce: Some(mode),
        }
    }

    /// Column name after renaming.
    pub fn output_name(&self) -> &str {
        self.canonical.as_deref().unwrap_or(&self.raw)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SpecError {
    #[error("raw label '{0}' is listed more than once")]
    DuplicateRaw(String),

    #[error("canonical name '{canonical}' of '{raw}' is itself a raw label; renames would not be idempotent")]
    ChainedRename { raw: String, canonical: String },
}

/// Ordered column table for one dataset.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnSpecs(Vec<ColumnSpec>);

impl ColumnSpecs {
    pub fn new(specs: Vec<ColumnSpec>) -> Self {
        Self(specs)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ColumnSpec> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn find(&self, raw: &str) -> Option<&ColumnSpec> {
        self.0.iter().find(|s| s.raw == raw)
    }

    /// Reject tables that would make renaming ambiguous or non-idempotent.
    pub fn validate(&self) -> Result<(), SpecError> {
        let mut raws = HashSet::new();
        for spec in &self.0 {
            if !raws.insert(spec.raw.as_str()) {
                return Err(SpecError::DuplicateRaw(spec.raw.clone()));
            }
        }
        for spec in &self.0 {
            if let Some(canonical) = &spec.canonical {
                if canonical != &spec.raw && raws.contains(canonical.as_str()) {
                    return Err(SpecError::ChainedRename {
                        raw: spec.raw.clone(),
                        canonical: canonical.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Valuation-measure columns coerced by default.
    pub fn valuation_defaults() -> Self {
        use CoercionMode::Number;
        Self(vec![
            ColumnSpec::coerce("Trailing P/E", Number),
            ColumnSpec::coerce("Enterprise Value/EBITDA", Number),
            ColumnSpec::coerce("Enterprise Value/Revenue", Number),
            ColumnSpec::coerce("Forward P/E", Number),
            ColumnSpec::coerce("PEG Ratio (5 yr expected)", Number),
            ColumnSpec::coerce("Price/Book (mrq)", Number),
            ColumnSpec::coerce("Price/Sales (ttm)", Number),
        ])
    }

    /// Extended-statistics columns: footnote renames plus coercions.
    pub fn extended_defaults() -> Self {
        use CoercionMode::{Number, Percent};
        Self(vec![
            ColumnSpec::rename_and_coerce("% Held by Insiders 1", "% Held by Insiders", Percent),
            ColumnSpec::rename_and_coerce(
                "% Held by Institutions 1",
                "% Held by Institutions",
                Percent,
            ),
            ColumnSpec::rename_and_coerce(
                "200-Day Moving Average 3",
                "200-Day Moving Average",
                Number,
            ),
            ColumnSpec::rename_and_coerce(
                "5 Year Average Dividend Yield 4",
                "5 Year Average Dividend Yield %",
                Number,
            ),
            ColumnSpec::rename_and_coerce(
                "50-Day Moving Average 3",
                "50-Day Moving Average",
                Number,
            ),
            ColumnSpec::rename_and_coerce("52 Week High 3", "52 Week High", Number),
            ColumnSpec::rename_and_coerce("52 Week Low 3", "52 Week Low", Number),
            ColumnSpec::rename("52-Week Change 3", "52-Week Change %"),
            ColumnSpec::rename("Avg Vol (10 day) 3", "Avg Vol (10 day)"),
            ColumnSpec::rename("Avg Vol (3 month) 3", "Avg Vol (3 month)"),
            ColumnSpec::rename("Dividend Date 3", "Dividend Date"),
            ColumnSpec::rename("Ex-Dividend Date 4", "Ex-Dividend Date"),
            ColumnSpec::rename_and_coerce(
                "Forward Annual Dividend Rate 4",
                "Forward Annual Dividend Rate",
                Number,
            ),
            ColumnSpec::rename_and_coerce(
                "Forward Annual Dividend Yield 4",
                "Forward Annual Dividend Yield %",
                Percent,
            ),
            ColumnSpec::rename("Last Split Date 3", "Last Split Date"),
            ColumnSpec::rename("Last Split Factor 2", "Last Split Factor"),
            ColumnSpec::rename_and_coerce(
                "Operating Margin (ttm)",
                "Operating Margin (ttm) %",
                Percent,
            ),
            ColumnSpec::rename_and_coerce("Payout Ratio 4", "Payout Ratio %", Percent),
            ColumnSpec::rename_and_coerce("Profit Margin", "Profit Margin %", Percent),
            ColumnSpec::rename(
                "Quarterly Earnings Growth (yoy)",
                "Quarterly Earnings Growth (yoy) %",
            ),
            ColumnSpec::rename_and_coerce(
                "Quarterly Revenue Growth (yoy)",
                "Quarterly Revenue Growth (yoy) %",
                Percent,
            ),
            ColumnSpec::rename_and_coerce(
                "Return on Assets (ttm)",
                "Return on Assets (ttm) %",
                Percent,
            ),
            ColumnSpec::rename_and_coerce(
                "Return on Equity (ttm)",
                "Return on Equity (ttm) %",
                Percent,
            ),
            ColumnSpec::rename("S&P500 52-Week Change 3", "S&P500 52-Week Change %"),
            ColumnSpec::rename("Shares Outstanding 5", "Shares Outstanding"),
            ColumnSpec::rename_and_coerce(
                "Trailing Annual Dividend Rate 3",
                "Trailing Annual Dividend Rate",
                Number,
            ),
            ColumnSpec::rename_and_coerce(
                "Trailing Annual Dividend Yield 3",
                "Trailing Annual Dividend Yield %",
                Percent,
            ),
            ColumnSpec::coerce("Beta (5Y Monthly)", Number),
            ColumnSpec::coerce("Book Value Per Share (mrq)", Number),
            ColumnSpec::coerce("Current Ratio (mrq)", Number),
            ColumnSpec::coerce("Diluted EPS (ttm)", Number),
            ColumnSpec::coerce("Revenue Per Share (ttm)", Number),
            ColumnSpec::coerce("Total Cash Per Share (mrq)", Number),
            ColumnSpec::coerce("Total Debt/Equity (mrq)", Number),
        ])
    }
}

// ─── Renaming ───────────────────────────────────────────────────────

/// Rename decorated provider labels to their canonical names.
///
/// Exact match only. If the canonical column already exists, the decorated
/// column fills its absent cells and is dropped.
pub fn rename_footnoted_columns(mut table: WideTable, specs: &ColumnSpecs) -> WideTable {
    for spec in specs.iter() {
        let Some(canonical) = spec.canonical.as_deref() else {
            continue;
        };
        if canonical == spec.raw || table.column(&spec.raw).is_none() {
            continue;
        }
        if table.column(canonical).is_some() {
            tracing::debug!(raw = %spec.raw, canonical, "merging decorated column into existing one");
            table.merge_column_into(&spec.raw, canonical);
        } else if let Some(col) = table.column_mut(&spec.raw) {
            col.name = canonical.to_string();
        }
    }
    table
}

// ─── Coercion ───────────────────────────────────────────────────────

/// A cell that failed numeric conversion under `MalformedPolicy::Abort`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("cannot convert '{raw}' in column '{column}' for '{identifier}' ({mode:?})")]
pub struct CoercionError {
    pub column: String,
    pub identifier: String,
    pub raw: String,
    pub mode: CoercionMode,
}

/// Parse one raw cell under the given mode.
pub fn parse_numeric(raw: &str, mode: CoercionMode) -> Option<f64> {
    let text = match mode {
        CoercionMode::Number => raw.trim(),
        CoercionMode::Percent => raw.trim().trim_end_matches('%').trim_end(),
    };
    text.parse::<f64>().ok()
}

/// Convert every configured column present in the table to float.
///
/// Columns are looked up by their output (post-rename) name; configured columns
/// missing from the table are skipped. Already-numeric columns are left as is.
pub fn coerce_numeric(
    mut table: WideTable,
    specs: &ColumnSpecs,
    policy: MalformedPolicy,
) -> Result<WideTable, CoercionError> {
    let mut bad_rows: Vec<usize> = Vec::new();

    for spec in specs.iter() {
        let Some(mode) = spec.coerce else {
            continue;
        };
        let name = spec.output_name();
        let Some(col) = table.column(name) else {
            tracing::debug!(column = name, "coercion column not present, skipping");
            continue;
        };
        let ColumnValues::Text(cells) = &col.values else {
            continue;
        };

        let mut parsed = Vec::with_capacity(cells.len());
        for (row, cell) in cells.iter().enumerate() {
            let value = match cell {
                None => None,
                Some(raw) => match parse_numeric(raw, mode) {
                    Some(x) => Some(x),
                    None => {
                        let identifier = table.identifiers()[row].clone();
                        match policy {
                            MalformedPolicy::Abort => {
                                return Err(CoercionError {
                                    column: name.to_string(),
                                    identifier,
                                    raw: raw.clone(),
                                    mode,
                                });
                            }
                            MalformedPolicy::SkipRow => {
                                tracing::warn!(
                                    column = name,
                                    identifier = %identifier,
                                    raw = %raw,
                                    "malformed numeric cell, dropping row"
                                );
                                bad_rows.push(row);
                                None
                            }
                        }
                    }
                },
            };
            parsed.push(value);
        }

        let name = name.to_string();
        if let Some(col) = table.column_mut(&name) {
            *col = Column::float(name, parsed);
        }
    }

    if bad_rows.is_empty() {
        Ok(table)
    } else {
        Ok(table.filter_rows(|row| !bad_rows.contains(&row)))
    }
}

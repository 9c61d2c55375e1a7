//! Statistics provider trait and structured error types.
//!
//! The StatisticsProvider trait abstracts over where per-identifier tables come
//! from (Yahoo's key-statistics page today) so the aggregator can be driven
//! by a mock in tests.

use crate::table::Identifier;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Ordered `(attribute, value)` pairs scraped for one identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeTable {
    pub rows: Vec<(String, String)>,
}

impl AttributeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, attribute: impl Into<String>, value: impl Into<String>) {
        self.rows.push((attribute.into(), value.into()));
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, attribute: &str) -> Option<&str> {
        self.rows
            .iter()
            .find(|(a, _)| a == attribute)
            .map(|(_, v)| v.as_str())
    }
}

impl FromIterator<(String, String)> for AttributeTable {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            rows: iter.into_iter().collect(),
        }
    }
}

/// Why a single external lookup failed.
///
/// Displayable in both CLI and TUI contexts, and cheap to clone into the
/// collect report.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("rate limited by provider")]
    RateLimited,

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("HTTP {status} for {url}")]
    Http { status: u16, url: String },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),
}

/// The two per-identifier lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dataset {
    Valuation,
    ExtendedStats,
}

impl Dataset {
    pub const ALL: [Dataset; 2] = [Dataset::Valuation, Dataset::ExtendedStats];

    /// Header of the value column in long-form exports.
    pub fn value_label(self) -> &'static str {
        match self {
            Dataset::Valuation => "Recent",
            Dataset::ExtendedStats => "Value",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Dataset::Valuation => "valuation",
            Dataset::ExtendedStats => "extended",
        }
    }

    /// Run this dataset's lookup for one identifier.
    pub fn fetch(
        self,
        provider: &dyn StatisticsProvider,
        identifier: &str,
    ) -> Result<AttributeTable, FetchError> {
        match self {
            Dataset::Valuation => provider.fetch_valuation(identifier),
            Dataset::ExtendedStats => provider.fetch_extended_stats(identifier),
        }
    }
}

impl std::fmt::Display for Dataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-identifier statistics source.
///
/// One external lookup per call. No batching, retries or rate limiting live
/// here; the aggregator decides what to do with failures.
pub trait StatisticsProvider {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Valuation measures (Trailing P/E, Price/Book, ...).
    fn fetch_valuation(&self, identifier: &str) -> Result<AttributeTable, FetchError>;

    /// Extended statistics (margins, dividends, share statistics, ...).
    fn fetch_extended_stats(&self, identifier: &str) -> Result<AttributeTable, FetchError>;
}

/// Progress callback for multi-identifier collection.
pub trait CollectProgress {
    /// Called before looking up an identifier.
    fn on_start(&self, identifier: &str, index: usize, total: usize);

    /// Called when a lookup completes. `Ok` carries the number of usable rows.
    fn on_complete(
        &self,
        identifier: &str,
        index: usize,
        total: usize,
        result: &Result<usize, FetchError>,
    );

    /// Called when the whole batch is done.
    fn on_batch_complete(&self, succeeded: usize, failed: &[(Identifier, FetchError)], total: usize);
}

/// Progress reporter that prints to stdout.
pub struct StdoutProgress {
    label: String,
}

impl StdoutProgress {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }
}

impl CollectProgress for StdoutProgress {
    fn on_start(&self, identifier: &str, index: usize, total: usize) {
        println!("[{}/{}] {} {identifier}...", index + 1, total, self.label);
    }

    fn on_complete(
        &self,
        identifier: &str,
        _index: usize,
        _total: usize,
        result: &Result<usize, FetchError>,
    ) {
        match result {
            Ok(rows) => println!("  OK: {identifier} ({rows} rows)"),
            Err(e) => println!("  FAIL: {identifier}: {e}"),
        }
    }

    fn on_batch_complete(&self, succeeded: usize, failed: &[(Identifier, FetchError)], total: usize) {
        println!(
            "\n{} complete: {succeeded}/{total} succeeded, {} failed",
            self.label,
            failed.len()
        );
    }
}

/// Progress reporter that stays silent.
pub struct NoProgress;

impl CollectProgress for NoProgress {
    fn on_start(&self, _identifier: &str, _index: usize, _total: usize) {}

    fn on_complete(
        &self,
        _identifier: &str,
        _index: usize,
        _total: usize,
        _result: &Result<usize, FetchError>,
    ) {
    }

    fn on_batch_complete(&self, _succeeded: usize, _failed: &[(Identifier, FetchError)], _total: usize) {}
}

//! Collection orchestrator: runs one lookup per identifier and stacks the
//! results into a long-form table, recording failures instead of aborting.

use super::provider::{AttributeTable, CollectProgress, Dataset, FetchError, StatisticsProvider};
use crate::table::{Identifier, LongTable};
use std::collections::HashSet;

/// Cell texts treated as "no value" by default.
pub const DEFAULT_MISSING_MARKERS: &[&str] = &[
    "N/A", "NA", "n/a", "NaN", "nan", "null", "NULL", "None", "-", "--",
];

/// Outcome of one collection batch.
#[derive(Debug)]
pub struct CollectResult {
    pub records: LongTable,
    pub failures: Vec<(Identifier, FetchError)>,
    pub succeeded: usize,
    pub total: usize,
}

impl CollectResult {
    pub fn all_succeeded(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failed_identifiers(&self) -> Vec<&str> {
        self.failures.iter().map(|(id, _)| id.as_str()).collect()
    }
}

/// Whether a raw cell carries no value.
pub fn is_missing(value: &str, markers: &[String]) -> bool {
    let value = value.trim();
    value.is_empty() || markers.iter().any(|m| m == value)
}

/// Look up every identifier with `fetch` and stack the rows.
///
/// Rows are stamped with their identifier in input order. A repeated
/// identifier is looked up once, at its first position. Missing-value rows
/// are dropped. A failing identifier is recorded and skipped.
pub fn aggregate<F>(
    identifiers: &[Identifier],
    value_label: &str,
    mut fetch: F,
    missing_markers: &[String],
    progress: &dyn CollectProgress,
) -> CollectResult
where
    F: FnMut(&str) -> Result<AttributeTable, FetchError>,
{
    let identifiers = unique_identifiers(identifiers);
    let total = identifiers.len();
    let mut records = LongTable::new(value_label);
    let mut failures = Vec::new();
    let mut succeeded = 0;

    for (i, &id) in identifiers.iter().enumerate() {
        progress.on_start(id, i, total);

        let result = fetch(id.as_str()).map(|table| {
            let before = records.len();
            let mut dropped = 0usize;
            for (attribute, value) in table.rows {
                if is_missing(&value, missing_markers) {
                    dropped += 1;
                    continue;
                }
                records.push(id.clone(), attribute, value);
            }
            if dropped > 0 {
                tracing::debug!(identifier = %id, dropped, "dropped missing-value rows");
            }
            records.len() - before
        });
        progress.on_complete(id, i, total, &result);

        match result {
            Ok(_) => succeeded += 1,
            Err(e) => {
                tracing::warn!(identifier = %id, error = %e, "lookup failed, skipping");
                failures.push((id.clone(), e));
            }
        }
    }

    progress.on_batch_complete(succeeded, &failures, total);

    CollectResult {
        records,
        failures,
        succeeded,
        total,
    }
}

/// First occurrence of each identifier, in input order.
fn unique_identifiers(identifiers: &[Identifier]) -> Vec<&Identifier> {
    let mut seen = HashSet::with_capacity(identifiers.len());
    identifiers
        .iter()
        .filter(|&id| {
            let first = seen.insert(id.as_str());
            if !first {
                tracing::warn!(identifier = %id, "identifier listed more than once, fetching it once");
            }
            first
        })
        .collect()
}

/// Collect one dataset from a provider.
pub fn collect_dataset(
    provider: &dyn StatisticsProvider,
    dataset: Dataset,
    identifiers: &[Identifier],
    missing_markers: &[String],
    progress: &dyn CollectProgress,
) -> CollectResult {
    tracing::info!(provider = provider.name(), %dataset, count = identifiers.len(), "collecting");
    aggregate(
        identifiers,
        dataset.value_label(),
        |id| dataset.fetch(provider, id),
        missing_markers,
        progress,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::provider::NoProgress;

    fn markers() -> Vec<String> {
        DEFAULT_MISSING_MARKERS.iter().map(|s| s.to_string()).collect()
    }

    fn ids(list: &[&str]) -> Vec<Identifier> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn fake_fetch(id: &str) -> Result<AttributeTable, FetchError> {
        if id.starts_with("BAD") {
            return Err(FetchError::SymbolNotFound { symbol: id.into() });
        }
        let mut t = AttributeTable::new();
        t.push("Trailing P/E", format!("{}.5", id.len()));
        t.push("Forward P/E", "N/A");
        Ok(t)
    }

    #[test]
    fn failures_are_recorded_not_fatal() {
        let result = aggregate(
            &ids(&["AA", "BAD1", "CCC", "BAD2"]),
            "Recent",
            fake_fetch,
            &markers(),
            &NoProgress,
        );
        assert_eq!(result.total, 4);
        assert_eq!(result.succeeded, 2);
        assert_eq!(result.failed_identifiers(), vec!["BAD1", "BAD2"]);
        assert_eq!(result.records.identifiers(), vec!["AA", "CCC"]);
    }

    #[test]
    fn repeated_identifiers_are_fetched_once() {
        let mut calls = Vec::new();
        let result = aggregate(
            &ids(&["SAP.DE", "ADS.DE", "SAP.DE"]),
            "Recent",
            |id| {
                calls.push(id.to_string());
                fake_fetch(id)
            },
            &markers(),
            &NoProgress,
        );
        assert_eq!(calls, vec!["SAP.DE", "ADS.DE"]);
        assert_eq!(result.total, 2);
        assert_eq!(result.succeeded, 2);
        assert_eq!(result.records.identifiers(), vec!["SAP.DE", "ADS.DE"]);
        assert_eq!(result.records.len(), 2);
    }

    #[test]
    fn missing_values_are_dropped() {
        let result = aggregate(&ids(&["AA"]), "Recent", fake_fetch, &markers(), &NoProgress);
        assert_eq!(result.records.len(), 1);
        assert_eq!(result.records.records()[0].attribute, "Trailing P/E");
        assert_eq!(result.records.value_label(), "Recent");
    }

    #[test]
    fn empty_input_is_empty_result() {
        let result = aggregate(&[], "Value", fake_fetch, &markers(), &NoProgress);
        assert!(result.records.is_empty());
        assert!(result.all_succeeded());
        assert_eq!(result.total, 0);
    }

    #[test]
    fn missing_detection() {
        let m = markers();
        assert!(is_missing("", &m));
        assert!(is_missing("  N/A ", &m));
        assert!(!is_missing("0", &m));
        assert!(!is_missing("12%", &m));
    }
}

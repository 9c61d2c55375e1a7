//! End-to-end screen pipeline.
//!
//! identifiers → collect (valuation, extended) → pivot → rename → coerce
//! → join → required-column filter. Stages hand their results to the next
//! through return values only; nothing is shared between runs.

use thiserror::Error;
use valuescreen_core::config::ScreenConfig;
use valuescreen_core::data::{
    collect_dataset, fetch_identifiers, CollectProgress, CollectResult, Dataset, IdentifierCache,
    IdentifierSource, SourceError, StatisticsProvider,
};
use valuescreen_core::normalize::{
    coerce_numeric, rename_footnoted_columns, CoercionError, ColumnSpecs, MalformedPolicy,
};
use valuescreen_core::table::{pivot, Identifier, LongTable, TableError, WideTable};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("identifier source failed: {0}")]
    Source(#[from] SourceError),

    #[error("{dataset} table: {source}")]
    Table {
        dataset: Dataset,
        source: TableError,
    },

    #[error("{dataset} table: {source}")]
    Coercion {
        dataset: Dataset,
        source: CoercionError,
    },

    #[error("join failed: {0}")]
    Join(#[source] TableError),
}

/// Per-run switches that override the config file.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Refetch identifiers even when cached.
    pub force_refresh: bool,
    /// Override `pipeline.malformed`.
    pub malformed: Option<MalformedPolicy>,
}

/// Everything one run produced.
#[derive(Debug)]
pub struct PipelineReport {
    pub identifiers: Vec<Identifier>,
    pub valuation: CollectResult,
    pub extended: CollectResult,
    pub valuation_wide: WideTable,
    pub extended_wide: WideTable,
    pub screen: WideTable,
}

/// Normalized wide tables plus their join.
#[derive(Debug)]
pub struct Screen {
    pub valuation: WideTable,
    pub extended: WideTable,
    pub joined: WideTable,
}

/// Pivot, rename and coerce one dataset.
pub fn normalize_dataset(
    dataset: Dataset,
    long: &LongTable,
    specs: &ColumnSpecs,
    policy: MalformedPolicy,
) -> Result<WideTable, PipelineError> {
    let wide = pivot(long).map_err(|source| PipelineError::Table { dataset, source })?;
    let renamed = rename_footnoted_columns(wide, specs);
    let coerced = coerce_numeric(renamed, specs, policy)
        .map_err(|source| PipelineError::Coercion { dataset, source })?;
    tracing::info!(
        %dataset,
        rows = coerced.height(),
        columns = coerced.width(),
        "normalized"
    );
    Ok(coerced)
}

/// Build the screen from already-collected long-form tables.
pub fn build_screen(
    valuation: &LongTable,
    extended: &LongTable,
    config: &ScreenConfig,
    policy: MalformedPolicy,
) -> Result<Screen, PipelineError> {
    let valuation = normalize_dataset(
        Dataset::Valuation,
        valuation,
        &config.columns.valuation,
        policy,
    )?;
    let extended = normalize_dataset(
        Dataset::ExtendedStats,
        extended,
        &config.columns.extended,
        policy,
    )?;
    let joined = valuescreen_core::join::join(
        &valuation,
        &extended,
        &config.pipeline.required_column,
    )
    .map_err(PipelineError::Join)?;
    Ok(Screen {
        valuation,
        extended,
        joined,
    })
}

/// Run the full pipeline.
pub fn run_pipeline(
    config: &ScreenConfig,
    source: &dyn IdentifierSource,
    cache: &IdentifierCache,
    provider: &dyn StatisticsProvider,
    progress: &dyn CollectProgress,
    opts: &RunOptions,
) -> Result<PipelineReport, PipelineError> {
    let identifiers = fetch_identifiers(source, cache, opts.force_refresh)?;
    let markers = &config.pipeline.missing_markers;

    let valuation = collect_dataset(provider, Dataset::Valuation, &identifiers, markers, progress);
    let extended = collect_dataset(
        provider,
        Dataset::ExtendedStats,
        &identifiers,
        markers,
        progress,
    );

    let policy = opts.malformed.unwrap_or(config.pipeline.malformed);
    let screen = build_screen(&valuation.records, &extended.records, config, policy)?;

    if screen.joined.is_empty() {
        tracing::warn!("screen is empty after join and filter");
    }

    Ok(PipelineReport {
        identifiers,
        valuation,
        extended,
        valuation_wide: screen.valuation,
        extended_wide: screen.extended,
        screen: screen.joined,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valuation_long() -> LongTable {
        let mut long = LongTable::new("Recent");
        long.push("SAP.DE", "Trailing P/E", "15.2");
        long.push("SAP.DE", "Price/Book (mrq)", "5.67");
        long.push("ADS.DE", "Price/Book (mrq)", "9.1");
        long
    }

    fn extended_long() -> LongTable {
        let mut long = LongTable::new("Value");
        long.push("SAP.DE", "% Held by Insiders 1", "42%");
        long.push("ADS.DE", "% Held by Insiders 1", "3%");
        long
    }

    #[test]
    fn screen_keeps_rows_with_required_value() {
        let screen = build_screen(
            &valuation_long(),
            &extended_long(),
            &ScreenConfig::default(),
            MalformedPolicy::Abort,
        )
        .unwrap();
        assert_eq!(screen.valuation.height(), 2);
        assert_eq!(screen.joined.identifiers(), &["SAP.DE".to_string()]);
        assert_eq!(screen.joined.float("SAP.DE", "Trailing P/E"), Some(15.2));
        assert_eq!(screen.joined.float("SAP.DE", "% Held by Insiders"), Some(42.0));
    }

    #[test]
    fn duplicate_pairs_are_reported_with_dataset() {
        let mut long = valuation_long();
        long.push("SAP.DE", "Trailing P/E", "16.0");
        let err = build_screen(
            &long,
            &extended_long(),
            &ScreenConfig::default(),
            MalformedPolicy::Abort,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Table {
                dataset: Dataset::Valuation,
                ..
            }
        ));
    }

    #[test]
    fn malformed_cell_aborts_by_default() {
        let mut long = extended_long();
        long.push("SAP.DE", "Beta (5Y Monthly)", "n.a.");
        let err = build_screen(
            &valuation_long(),
            &long,
            &ScreenConfig::default(),
            MalformedPolicy::Abort,
        )
        .unwrap_err();
        match err {
            PipelineError::Coercion { dataset, source } => {
                assert_eq!(dataset, Dataset::ExtendedStats);
                assert_eq!(source.column, "Beta (5Y Monthly)");
                assert_eq!(source.raw, "n.a.");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}

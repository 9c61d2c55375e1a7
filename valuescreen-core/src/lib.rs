//! valuescreen core: scraping, reshaping, cleaning and joining of index
//! constituent statistics for value screening.
//!
//! - `data`: identifier source and cache, Yahoo key-statistics fetcher,
//!   batch collection with per-identifier failure tolerance
//! - `table`: long/wide tables, pivot and melt
//! - `normalize`: footnote renames and numeric coercion from a column table
//! - `join`: inner join on identifier with a required-column filter
//! - `chart`: chart kinds and scatter extraction
//! - `frame`: polars conversion and Parquet I/O

pub mod chart;
pub mod config;
pub mod data;
pub mod frame;
pub mod join;
pub mod normalize;
pub mod table;

pub use chart::{scatter_points, ChartKind, ScatterPoint};
pub use config::{ConfigError, ScreenConfig};
pub use join::join;
pub use normalize::{
    coerce_numeric, rename_footnoted_columns, CoercionError, CoercionMode, ColumnSpec,
    ColumnSpecs, MalformedPolicy,
};
pub use table::{melt, pivot, Identifier, LongTable, TableError, WideTable};

//! Scraping layer: identifier source, per-identifier statistics and
//! batch collection.

pub mod cache;
pub mod collect;
pub mod html;
pub mod http;
pub mod provider;
pub mod source;
pub mod yahoo;

pub use cache::{CachedIdentifiers, IdentifierCache};
pub use collect::{aggregate, collect_dataset, CollectResult, DEFAULT_MISSING_MARKERS};
pub use http::HttpClient;
pub use provider::{
    AttributeTable, CollectProgress, Dataset, FetchError, NoProgress, StatisticsProvider,
    StdoutProgress,
};
pub use source::{fetch_identifiers, IdentifierSource, SourceError, WikipediaSource};
pub use yahoo::YahooStatistics;

//! Index constituent identifiers from a reference page.
//!
//! The page is expected to hold a table with a header cell whose text equals
//! the configured header (`Ticker` by default). Every data row of that table
//! contributes the text of one `<td>`. Anything else about the page layout
//! is a structure error for the whole list; there is no partial recovery.

use super::cache::{CachedIdentifiers, IdentifierCache};
use super::html::parse_tables;
use super::http::HttpClient;
use super::provider::FetchError;
use crate::table::Identifier;
use thiserror::Error;

pub const DEFAULT_SOURCE_URL: &str = "https://en.wikipedia.org/wiki/EURO_STOXX_50";
pub const DEFAULT_HEADER: &str = "Ticker";

#[derive(Debug, Error)]
pub enum SourceError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("unexpected page structure: {0}")]
    Structure(String),

    #[error("identifier cache error: {0}")]
    Cache(String),
}

/// Where the identifier list comes from.
pub trait IdentifierSource {
    /// Source location, recorded in the cache.
    fn location(&self) -> &str;

    /// Fetch and parse the current identifier list.
    fn fetch(&self) -> Result<Vec<Identifier>, SourceError>;
}

/// Reads the constituents table of a Wikipedia index article.
pub struct WikipediaSource {
    client: HttpClient,
    url: String,
    header: String,
    column: usize,
}

impl WikipediaSource {
    pub fn new(client: HttpClient, url: impl Into<String>, header: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
            header: header.into(),
            column: 0,
        }
    }

    /// Which `<td>` of each data row holds the identifier.
    pub fn with_column(mut self, column: usize) -> Self {
        self.column = column;
        self
    }
}

impl Default for WikipediaSource {
    fn default() -> Self {
        Self::new(HttpClient::default(), DEFAULT_SOURCE_URL, DEFAULT_HEADER)
    }
}

impl IdentifierSource for WikipediaSource {
    fn location(&self) -> &str {
        &self.url
    }

    fn fetch(&self) -> Result<Vec<Identifier>, SourceError> {
        let body = self.client.get_text(&self.url, &self.url)?;
        parse_identifiers(&body, &self.header, self.column)
    }
}

/// Extract identifiers from the table whose header row contains `header`.
pub fn parse_identifiers(
    html: &str,
    header: &str,
    column: usize,
) -> Result<Vec<Identifier>, SourceError> {
    let tables = parse_tables(html);
    let table = tables
        .iter()
        .find(|t| t.has_header(header))
        .ok_or_else(|| SourceError::Structure(format!("no table with a '{header}' header")))?;

    let mut identifiers = Vec::new();
    for (i, row) in table.data_rows().enumerate() {
        let cell = row
            .iter()
            .filter(|c| !c.header)
            .nth(column)
            .ok_or_else(|| {
                SourceError::Structure(format!("data row {} has no cell at column {column}", i + 1))
            })?;
        if cell.text.is_empty() {
            return Err(SourceError::Structure(format!(
                "data row {} has an empty identifier cell",
                i + 1
            )));
        }
        identifiers.push(cell.text.clone());
    }

    if identifiers.is_empty() {
        return Err(SourceError::Structure(format!(
            "table with '{header}' has no data rows"
        )));
    }
    Ok(identifiers)
}

/// Identifier list, from the cache unless `force_refresh` is set or the
/// cache is missing. A fresh fetch is written back to the cache.
pub fn fetch_identifiers(
    source: &dyn IdentifierSource,
    cache: &IdentifierCache,
    force_refresh: bool,
) -> Result<Vec<Identifier>, SourceError> {
    if !force_refresh {
        if let Some(cached) = cache.load()? {
            tracing::info!(
                count = cached.identifiers.len(),
                fetched_at = %cached.fetched_at,
                "using cached identifiers"
            );
            return Ok(cached.identifiers);
        }
    }

    let identifiers = source.fetch()?;
    tracing::info!(count = identifiers.len(), source = source.location(), "fetched identifiers");
    cache.store(&CachedIdentifiers::new(source.location(), identifiers.clone()))?;
    Ok(identifiers)
}

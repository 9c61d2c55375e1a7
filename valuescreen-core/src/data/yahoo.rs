//! Yahoo Finance key-statistics fetcher.
//!
//! Scrapes `/quote/{symbol}/key-statistics`. The page carries one
//! multi-column valuation table (current value plus quarterly history)
//! followed by a set of two-column statistic tables.
//!
//! Yahoo has no official API for this page and changes its markup without
//! notice; a page with none of the expected tables is reported as
//! `ResponseFormatChanged` for that identifier only.

use super::html::{parse_tables, HtmlTable};
use super::http::HttpClient;
use super::provider::{AttributeTable, FetchError, StatisticsProvider};

pub const DEFAULT_BASE_URL: &str = "https://finance.yahoo.com";

/// First-column label that marks the valuation table.
const VALUATION_MARKER: &str = "Trailing P/E";

pub struct YahooStatistics {
    client: HttpClient,
    base_url: String,
}

impl YahooStatistics {
    pub fn new(client: HttpClient, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn statistics_url(&self, symbol: &str) -> String {
        format!("{}/quote/{symbol}/key-statistics?p={symbol}", self.base_url)
    }

    fn fetch_tables(&self, symbol: &str) -> Result<Vec<HtmlTable>, FetchError> {
        let body = self.client.get_text(&self.statistics_url(symbol), symbol)?;
        Ok(parse_tables(&body))
    }
}

impl Default for YahooStatistics {
    fn default() -> Self {
        Self::new(HttpClient::default(), DEFAULT_BASE_URL)
    }
}

/// The first table whose first column holds the `Trailing P/E` label.
pub fn parse_valuation(symbol: &str, tables: &[HtmlTable]) -> Result<AttributeTable, FetchError> {
    let table = tables
        .iter()
        .find(|t| t.first_column().any(|label| label == VALUATION_MARKER))
        .ok_or_else(|| {
            FetchError::ResponseFormatChanged(format!(
                "no valuation table for {symbol} (no '{VALUATION_MARKER}' row)"
            ))
        })?;
    Ok(table.leading_pairs().collect())
}

/// Every table after the first that is exactly two columns wide, in page order.
pub fn parse_extended(symbol: &str, tables: &[HtmlTable]) -> Result<AttributeTable, FetchError> {
    let stats: AttributeTable = tables
        .iter()
        .skip(1)
        .filter(|t| t.width() == 2)
        .flat_map(HtmlTable::leading_pairs)
        .collect();
    if stats.is_empty() {
        return Err(FetchError::ResponseFormatChanged(format!(
            "no statistics tables for {symbol}"
        )));
    }
    Ok(stats)
}

impl StatisticsProvider for YahooStatistics {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn fetch_valuation(&self, identifier: &str) -> Result<AttributeTable, FetchError> {
        parse_valuation(identifier, &self.fetch_tables(identifier)?)
    }

    fn fetch_extended_stats(&self, identifier: &str) -> Result<AttributeTable, FetchError> {
        parse_extended(identifier, &self.fetch_tables(identifier)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <table>
          <thead><tr><th></th><th>Current</th><th>9/30/2024</th></tr></thead>
          <tbody>
            <tr><td>Market Cap</td><td>250.1B</td><td>240.0B</td></tr>
            <tr><td>Trailing P/E</td><td>15.2</td><td>14.9</td></tr>
          </tbody>
        </table>
        <table><tr><td>Beta (5Y Monthly)</td><td>1.12</td></tr></table>
        <table><tr><td>a</td><td>b</td><td>c</td></tr></table>
        <table><tr><td>Profit Margin</td><td>18.5%</td></tr></table>
    "#;

    #[test]
    fn valuation_keeps_two_leading_columns() {
        let tables = parse_tables(PAGE);
        let v = parse_valuation("SAP.DE", &tables).unwrap();
        assert_eq!(
            v.rows,
            vec![
                ("Market Cap".to_string(), "250.1B".to_string()),
                ("Trailing P/E".to_string(), "15.2".to_string()),
            ]
        );
    }

    #[test]
    fn extended_concatenates_two_column_tables() {
        let tables = parse_tables(PAGE);
        let e = parse_extended("SAP.DE", &tables).unwrap();
        assert_eq!(e.len(), 2);
        assert_eq!(e.get("Beta (5Y Monthly)"), Some("1.12"));
        assert_eq!(e.get("Profit Margin"), Some("18.5%"));
        assert_eq!(e.get("a"), None);
    }

    #[test]
    fn missing_tables_are_format_errors() {
        let tables = parse_tables("<p>consent wall</p>");
        assert!(matches!(
            parse_valuation("X", &tables),
            Err(FetchError::ResponseFormatChanged(_))
        ));
        assert!(matches!(
            parse_extended("X", &tables),
            Err(FetchError::ResponseFormatChanged(_))
        ));
    }

    #[test]
    fn statistics_url_layout() {
        let y = YahooStatistics::new(HttpClient::default(), "http://localhost:1234/");
        assert_eq!(
            y.statistics_url("SAP.DE"),
            "http://localhost:1234/quote/SAP.DE/key-statistics?p=SAP.DE"
        );
    }
}

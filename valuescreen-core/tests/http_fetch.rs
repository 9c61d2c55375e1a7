//! Integration tests for the scraping layer against a local mock server
//! serving frozen page fixtures.

use httpmock::prelude::*;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use valuescreen_core::data::{
    collect_dataset, fetch_identifiers, http::DEFAULT_USER_AGENT, Dataset, FetchError, HttpClient,
    IdentifierCache, IdentifierSource, NoProgress, SourceError, StatisticsProvider,
    WikipediaSource, YahooStatistics, DEFAULT_MISSING_MARKERS,
};

static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

fn fixture(name: &str) -> String {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name);
    std::fs::read_to_string(path).unwrap()
}

fn temp_dir() -> PathBuf {
    let id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
    let dir = std::env::temp_dir().join(format!("valuescreen_http_{}_{id}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

fn client() -> HttpClient {
    HttpClient::new(Duration::from_secs(5), DEFAULT_USER_AGENT)
}

fn markers() -> Vec<String> {
    DEFAULT_MISSING_MARKERS.iter().map(|s| s.to_string()).collect()
}

#[test]
fn wikipedia_source_reads_constituents() {
    let server = MockServer::start();
    let page = server.mock(|when, then| {
        when.method(GET).path("/wiki/EURO_STOXX_50");
        then.status(200)
            .header("content-type", "text/html; charset=utf-8")
            .body(fixture("euro_stoxx_50.html"));
    });

    let source = WikipediaSource::new(client(), server.url("/wiki/EURO_STOXX_50"), "Ticker");
    let ids = source.fetch().unwrap();

    page.assert();
    assert_eq!(ids, vec!["ADS.DE", "AIR.PA", "ASML.AS", "SAP.DE"]);
}

#[test]
fn identifier_cache_avoids_second_request() {
    let server = MockServer::start();
    let page = server.mock(|when, then| {
        when.method(GET).path("/wiki/EURO_STOXX_50");
        then.status(200).body(fixture("euro_stoxx_50.html"));
    });

    let dir = temp_dir();
    let cache = IdentifierCache::new(&dir);
    let source = WikipediaSource::new(client(), server.url("/wiki/EURO_STOXX_50"), "Ticker");

    let first = fetch_identifiers(&source, &cache, false).unwrap();
    let second = fetch_identifiers(&source, &cache, false).unwrap();
    assert_eq!(first, second);
    page.assert_hits(1);

    let meta = cache.load().unwrap().unwrap();
    assert_eq!(meta.source, server.url("/wiki/EURO_STOXX_50"));
    assert_eq!(meta.identifiers.len(), 4);

    fetch_identifiers(&source, &cache, true).unwrap();
    page.assert_hits(2);
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn page_without_ticker_table_is_fatal() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/wiki/Other");
        then.status(200).body("<html><body><p>moved</p></body></html>");
    });

    let source = WikipediaSource::new(client(), server.url("/wiki/Other"), "Ticker");
    assert!(matches!(source.fetch(), Err(SourceError::Structure(_))));
}

#[test]
fn source_http_failure_is_fetch_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/wiki/EURO_STOXX_50");
        then.status(500);
    });

    let source = WikipediaSource::new(client(), server.url("/wiki/EURO_STOXX_50"), "Ticker");
    assert!(matches!(
        source.fetch(),
        Err(SourceError::Fetch(FetchError::Http { status: 500, .. }))
    ));
}

#[test]
fn yahoo_valuation_and_extended_stats() {
    let server = MockServer::start();
    let page = server.mock(|when, then| {
        when.method(GET)
            .path("/quote/SAP.DE/key-statistics")
            .query_param("p", "SAP.DE");
        then.status(200).body(fixture("key_statistics.html"));
    });

    let yahoo = YahooStatistics::new(client(), server.base_url());

    let valuation = yahoo.fetch_valuation("SAP.DE").unwrap();
    assert_eq!(valuation.len(), 9);
    assert_eq!(valuation.get("Trailing P/E"), Some("15.2"));
    assert_eq!(valuation.get("PEG Ratio (5 yr expected)"), Some("N/A"));

    let extended = yahoo.fetch_extended_stats("SAP.DE").unwrap();
    assert_eq!(extended.get("% Held by Insiders 1"), Some("42%"));
    assert_eq!(extended.get("S&P500 52-Week Change 3"), Some("32.01%"));
    assert_eq!(extended.get("Quarterly Revenue Growth (yoy)"), Some("9.40%"));
    assert_eq!(extended.get("Market Cap"), None);

    page.assert_hits(2);
}

#[test]
fn unknown_symbol_is_not_found() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/quote/NOPE.XX/key-statistics");
        then.status(404);
    });

    let yahoo = YahooStatistics::new(client(), server.base_url());
    assert_eq!(
        yahoo.fetch_valuation("NOPE.XX"),
        Err(FetchError::SymbolNotFound {
            symbol: "NOPE.XX".into()
        })
    );
}

#[test]
fn collection_skips_failing_identifiers() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/quote/SAP.DE/key-statistics");
        then.status(200).body(fixture("key_statistics.html"));
    });
    server.mock(|when, then| {
        when.method(GET).path("/quote/BAD.XX/key-statistics");
        then.status(404);
    });

    let yahoo = YahooStatistics::new(client(), server.base_url());
    let ids = vec!["BAD.XX".to_string(), "SAP.DE".to_string()];
    let result = collect_dataset(&yahoo, Dataset::Valuation, &ids, &markers(), &NoProgress);

    assert_eq!(result.total, 2);
    assert_eq!(result.succeeded, 1);
    assert_eq!(result.failed_identifiers(), vec!["BAD.XX"]);
    assert_eq!(result.records.identifiers(), vec!["SAP.DE"]);
    // PEG Ratio is "N/A" and dropped
    assert_eq!(result.records.len(), 8);
    assert_eq!(result.records.value_label(), "Recent");
}

//! Blocking HTTP client shared by the identifier source and the Yahoo fetcher.

use super::provider::FetchError;
use std::time::Duration;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Thin wrapper over `reqwest::blocking::Client` that always carries a
/// timeout and maps transport failures onto [`FetchError`].
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::blocking::Client,
}

impl HttpClient {
    pub fn new(timeout: Duration, user_agent: &str) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .expect("failed to build HTTP client");
        Self { client }
    }

    /// GET a page and return its body as text.
    ///
    /// 404 maps to `SymbolNotFound` with the given subject; 429 to
    /// `RateLimited`; any other non-success status to `Http`.
    pub fn get_text(&self, url: &str, subject: &str) -> Result<String, FetchError> {
        tracing::debug!(url, "GET");
        let resp = self.client.get(url).send().map_err(map_transport)?;
        let status = resp.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(FetchError::SymbolNotFound {
                symbol: subject.to_string(),
            });
        }
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(FetchError::RateLimited);
        }
        if !status.is_success() {
            return Err(FetchError::Http {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        resp.text().map_err(|e| {
            FetchError::ResponseFormatChanged(format!("failed to read body of {url}: {e}"))
        })
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new(Duration::from_secs(30), DEFAULT_USER_AGENT)
    }
}

fn map_transport(e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout(e.to_string())
    } else {
        FetchError::NetworkUnreachable(e.to_string())
    }
}

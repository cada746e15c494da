//! Snapshot retrieval: one HTTP page per query instant.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::html::extract_table_rows;
use crate::http_client::{HttpClient, HttpRequest};
use crate::{QuoteTime, RawRow};

pub const DEFAULT_BASE_URL: &str = "http://150.158.125.175:8080/QH20D/";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/114.0.0.0 Safari/537.36";
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Snapshot URL for `at`: the base URL followed by the compact timestamp key.
pub fn snapshot_url(base_url: &str, at: QuoteTime) -> String {
    format!("{base_url}{}", at.url_key())
}

pub type FetchFuture<'a> = Pin<Box<dyn Future<Output = Option<Vec<RawRow>>> + Send + 'a>>;

/// Source of raw snapshot rows.
///
/// `None` means the snapshot could not be obtained. Implementations never
/// raise; the caller records the miss and moves on.
pub trait Fetcher: Send + Sync {
    fn fetch<'a>(&'a self, at: QuoteTime) -> FetchFuture<'a>;
}

/// Fetches `{base_url}{YYYYMMDD-HHMMSS}` and reads the first HTML table.
#[derive(Clone)]
pub struct HttpTableFetcher {
    client: Arc<dyn HttpClient>,
    base_url: String,
    user_agent: String,
    timeout_ms: u64,
}

impl std::fmt::Debug for HttpTableFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTableFetcher")
            .field("base_url", &self.base_url)
            .field("timeout_ms", &self.timeout_ms)
            .finish_non_exhaustive()
    }
}

impl HttpTableFetcher {
    pub fn new(client: Arc<dyn HttpClient>, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url_for(&self, at: QuoteTime) -> String {
        snapshot_url(&self.base_url, at)
    }

    fn request_for(&self, url: String) -> HttpRequest {
        let request = HttpRequest::get(url).with_timeout_ms(self.timeout_ms);
        if self.user_agent.is_empty() {
            request
        } else {
            request.with_header("User-Agent", self.user_agent.as_str())
        }
    }
}

impl Fetcher for HttpTableFetcher {
    fn fetch<'a>(&'a self, at: QuoteTime) -> FetchFuture<'a> {
        Box::pin(async move {
            let url = self.url_for(at);
            debug!(%url, "fetching snapshot");

            let response = match self.client.execute(self.request_for(url.clone())).await {
                Ok(response) => response,
                Err(error) => {
                    warn!(%url, %error, "snapshot request failed");
                    return None;
                }
            };

            if !response.is_success() {
                warn!(%url, status = response.status, "snapshot returned non-success status");
                return None;
            }

            match extract_table_rows(&response.body) {
                Some(rows) => {
                    debug!(%url, rows = rows.len(), "snapshot parsed");
                    Some(rows)
                }
                None => {
                    warn!(%url, "snapshot page has no table");
                    None
                }
            }
        })
    }
}

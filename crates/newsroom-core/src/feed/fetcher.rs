use bytes::Bytes;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_ENCODING, ACCEPT_LANGUAGE, USER_AGENT};
use reqwest::{Client, Proxy, StatusCode};
use url::Url;

use super::aggregator::FeedSource;
use crate::config::AppConfig;
use crate::{Error, Result};

const MAX_FEED_BYTES: usize = 5 * 1024 * 1024;
const MAX_RETRIES: u32 = 3;
const INITIAL_RETRY_DELAY_MS: u64 = 500;

// Rotating User-Agent pool - some news sites reject non-browser clients
static USER_AGENT_INDEX: AtomicUsize = AtomicUsize::new(0);
const USER_AGENTS: &[&str] = &[
    // Chrome on macOS
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    // Chrome on Windows
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    // Firefox on macOS
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:121.0) Gecko/20100101 Firefox/121.0",
    // Safari on macOS
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2 Safari/605.1.15",
];

/// Get the next User-Agent in rotation
fn next_user_agent() -> &'static str {
    let index = USER_AGENT_INDEX.fetch_add(1, Ordering::Relaxed) % USER_AGENTS.len();
    USER_AGENTS[index]
}

enum Attempt {
    Done(StatusCode, Bytes),
    Retry(Error),
}

/// HTTP feed fetcher
pub struct FeedFetcher {
    client: Client,
    timeout_secs: u64,
}

impl FeedFetcher {
    /// Create a new feed fetcher with configuration
    pub fn new(config: &AppConfig) -> Result<Self> {
        let timeout_secs = config.sync.request_timeout_secs.max(1);
        let client = Self::build_client(timeout_secs, &config.sync.proxy_url)?;

        Ok(Self { client, timeout_secs })
    }

    /// Build HTTP client with optional proxy
    fn build_client(timeout_secs: u64, proxy_url: &Option<String>) -> Result<Client> {
        let mut builder = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .redirect(reqwest::redirect::Policy::limited(10));

        if let Some(ref proxy) = proxy_url {
            let proxy = Proxy::all(proxy)
                .map_err(|e| Error::Config(format!("Invalid proxy URL: {}", e)))?;
            builder = builder.proxy(proxy);
            tracing::info!("Using HTTP proxy for feed fetching");
        }

        builder.build().map_err(Error::Http)
    }

    /// Build browser-like headers for a request
    fn build_headers(user_agent: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "application/rss+xml,application/atom+xml,application/xml;q=0.9,text/xml;q=0.9,*/*;q=0.8"
            )
        );
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_static("en-US,en;q=0.9")
        );
        headers.insert(
            ACCEPT_ENCODING,
            HeaderValue::from_static("gzip, deflate, br")
        );
        if let Ok(ua) = HeaderValue::from_str(user_agent) {
            headers.insert(USER_AGENT, ua);
        }
        headers
    }

    /// One GET. Throttling and transport errors are worth another try.
    async fn attempt(&self, url: &str, user_agent: &str) -> Attempt {
        let response = match self.client.get(url).headers(Self::build_headers(user_agent)).send().await {
            Ok(response) => response,
            Err(e) => return Attempt::Retry(Error::Http(e)),
        };

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS || status == StatusCode::SERVICE_UNAVAILABLE {
            return Attempt::Retry(Error::FeedParse(format!("HTTP {} for URL: {}", status, url)));
        }

        match response.bytes().await {
            Ok(body) => Attempt::Done(status, body),
            Err(e) => Attempt::Retry(Error::Http(e)),
        }
    }

    /// Fetch with retry and exponential backoff
    async fn fetch_with_retry(&self, url: &str) -> Result<(StatusCode, Bytes)> {
        let mut delay = Duration::from_millis(INITIAL_RETRY_DELAY_MS);
        let mut attempt = 1;

        loop {
            let user_agent = next_user_agent();
            tracing::debug!("Fetch attempt {} for {}, User-Agent: {}", attempt, url, user_agent);

            let error = match self.attempt(url, user_agent).await {
                Attempt::Done(status, body) => return Ok((status, body)),
                Attempt::Retry(error) => error,
            };

            if attempt >= MAX_RETRIES {
                return Err(error);
            }

            tracing::warn!("Attempt {} for {} failed ({}), retrying in {:?}", attempt, url, error, delay);
            tokio::time::sleep(delay).await;
            delay *= 2;
            attempt += 1;
        }
    }

    /// Fetch feed content as raw bytes
    pub async fn fetch_raw(&self, url: &str) -> Result<Vec<u8>> {
        Url::parse(url)?;

        let (status, bytes) = self.fetch_with_retry(url).await?;

        ensure_content_size(bytes.len(), url)?;

        if !status.is_success() {
            return Err(Error::FeedParse(format!(
                "HTTP {} for URL: {}",
                status,
                url
            )));
        }

        Ok(bytes.to_vec())
    }
}

#[async_trait::async_trait]
impl FeedSource for FeedFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        self.fetch_raw(url).await
    }

    fn timeout(&self) -> Duration {
        // Retries with backoff fit inside the outer bound
        Duration::from_secs(self.timeout_secs * u64::from(MAX_RETRIES) + 4)
    }
}

fn ensure_content_size(size: usize, url: &str) -> Result<()> {
    if size > MAX_FEED_BYTES {
        return Err(Error::FeedParse(format!(
            "Feed too large ({} bytes) for URL: {}",
            size,
            url
        )));
    }
    Ok(())
}

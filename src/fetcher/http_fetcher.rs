use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::Client;

use crate::app::{ResolveError, Result};
use crate::config::FetchConfig;
use crate::fetcher::{FailureKind, FetchFailure, Fetcher};

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/rss+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );

        let client = Client::builder()
            .timeout(config.timeout())
            .gzip(true)
            .brotli(true)
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .build()
            .map_err(|e| ResolveError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { client })
    }
}

fn classify(err: &reqwest::Error) -> FailureKind {
    if err.is_timeout() {
        FailureKind::Timeout
    } else if err.is_connect() || err.is_request() {
        FailureKind::Connection
    } else {
        FailureKind::Permanent
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> std::result::Result<Vec<u8>, FetchFailure> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchFailure::new(classify(&e), e.to_string()))?;

        let status = response.status();
        if status.as_u16() == 429 || status.is_server_error() {
            return Err(FetchFailure::new(
                FailureKind::Throttled(status.as_u16()),
                format!("HTTP {status}"),
            ));
        }
        if !status.is_success() {
            return Err(FetchFailure::new(
                FailureKind::Permanent,
                format!("HTTP {status}"),
            ));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchFailure::new(classify(&e), e.to_string()))?;

        tracing::debug!("Fetched {} ({} bytes)", url, body.len());
        Ok(body.to_vec())
    }
}

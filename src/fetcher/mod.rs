pub mod http_fetcher;
pub mod retry;

use async_trait::async_trait;

pub use http_fetcher::HttpFetcher;
pub use retry::{RetryPolicy, RetryingFetcher};

/// Why a single fetch attempt failed, as far as retrying is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Timeout,
    Connection,
    /// HTTP status worth retrying (429, 5xx)
    Throttled(u16),
    /// Anything else (4xx, invalid URL, body decoding)
    Permanent,
}

/// A failed fetch attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl FetchFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        !matches!(self.kind, FailureKind::Permanent)
    }
}

/// A single attempt at retrieving a document. Retries live in [`RetryingFetcher`].
#[async_trait]
pub trait Fetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchFailure>;
}

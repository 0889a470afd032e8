//! Document fetching seam.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use ureq::Agent;

/// Error from a document fetch.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Non-2xx response.
    #[error("document fetch returned status {0}")]
    Status(u16),
    /// Network or I/O failure.
    #[error("document fetch failed: {0}")]
    Transport(String),
}

/// Asynchronous document source.
///
/// Implementations return the raw document text for a fetch path. A non-2xx
/// response is an error; the caller degrades to fixed not-found content
/// rather than propagating it.
#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    /// Fetch raw document text.
    async fn fetch(&self, path: &str) -> Result<String, FetchError>;
}

/// HTTP fetcher over a base URL.
///
/// The blocking HTTP client runs on the blocking thread pool so the
/// cooperative pipeline never stalls on I/O.
pub struct HttpFetcher {
    base_url: String,
    agent: Agent,
}

impl HttpFetcher {
    /// Create a fetcher with a 30 second timeout.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_timeout(base_url, Duration::from_secs(30))
    }

    /// Create a fetcher with an explicit timeout.
    #[must_use]
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Self {
        let agent: Agent = Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .into();
        Self {
            base_url: base_url.into(),
            agent,
        }
    }
}

#[async_trait]
impl DocumentFetcher for HttpFetcher {
    async fn fetch(&self, path: &str) -> Result<String, FetchError> {
        let url = format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        let agent = self.agent.clone();

        tokio::task::spawn_blocking(move || match agent.get(&url).call() {
            Ok(mut response) => response
                .body_mut()
                .read_to_string()
                .map_err(|e| FetchError::Transport(e.to_string())),
            Err(ureq::Error::StatusCode(code)) => Err(FetchError::Status(code)),
            Err(e) => Err(FetchError::Transport(e.to_string())),
        })
        .await
        .map_err(|e| FetchError::Transport(e.to_string()))?
    }
}

/// In-memory fetcher for tests and embedded content.
///
/// Paths not registered return status 404.
#[derive(Debug, Default)]
pub struct MemoryFetcher {
    documents: HashMap<String, String>,
}

impl MemoryFetcher {
    /// Create an empty fetcher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a document at a fetch path.
    #[must_use]
    pub fn with_document(mut self, path: impl Into<String>, text: impl Into<String>) -> Self {
        self.documents.insert(path.into(), text.into());
        self
    }
}

#[async_trait]
impl DocumentFetcher for MemoryFetcher {
    async fn fetch(&self, path: &str) -> Result<String, FetchError> {
        self.documents
            .get(path)
            .cloned()
            .ok_or(FetchError::Status(404))
    }
}

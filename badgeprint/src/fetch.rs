//!
//! Document fetching
//!
use std::time::Duration;

use async_trait::async_trait;
use http::Uri;
use log::debug;
use reqwest::ClientBuilder;

use crate::{error::PrintError, locator::DocumentLocator, payload::Document, USER_AGENT};

/// Default timeout for remote document downloads
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Retrieves documents to print.
///
/// Implementations make a single attempt per call; retrying is up to the caller.
#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    async fn fetch(&self, locator: &DocumentLocator) -> Result<Document, PrintError>;
}

/// Fetcher reading local files with tokio and downloading remote documents with reqwest
#[derive(Debug, Clone)]
pub struct HttpDocumentFetcher {
    timeout: Duration,
}

impl Default for HttpDocumentFetcher {
    fn default() -> Self {
        HttpDocumentFetcher::new(DEFAULT_FETCH_TIMEOUT)
    }
}

impl HttpDocumentFetcher {
    /// Create fetcher with the given download timeout
    pub fn new(timeout: Duration) -> Self {
        HttpDocumentFetcher { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn download(&self, uri: &Uri) -> Result<Document, PrintError> {
        let client = ClientBuilder::new()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(self.timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(PrintError::Fetch)?;

        let response = client.get(uri.to_string()).send().await.map_err(|e| self.map_error(e))?;

        if !response.status().is_success() {
            debug!("Document request for {} answered {}", uri, response.status());
            return Err(PrintError::FetchStatus(response.status().as_u16()));
        }

        let body = response.bytes().await.map_err(|e| self.map_error(e))?;
        debug!("Downloaded {} bytes from {}", body.len(), uri);
        Ok(Document::Raw(body))
    }

    fn map_error(&self, error: reqwest::Error) -> PrintError {
        if error.is_timeout() {
            PrintError::FetchTimeout(self.timeout)
        } else {
            PrintError::Fetch(error)
        }
    }
}

#[async_trait]
impl DocumentFetcher for HttpDocumentFetcher {
    async fn fetch(&self, locator: &DocumentLocator) -> Result<Document, PrintError> {
        match locator {
            DocumentLocator::Local(path) => {
                debug!("Reading local document {}", path.display());
                let data = tokio::fs::read(path)
                    .await
                    .map_err(|source| PrintError::DocumentNotFound {
                        path: path.clone(),
                        source,
                    })?;
                Ok(Document::from(data))
            }
            DocumentLocator::Remote(uri) => {
                debug!("Fetching remote document {}", uri);
                tokio::time::timeout(self.timeout, self.download(uri))
                    .await
                    .map_err(|_| PrintError::FetchTimeout(self.timeout))?
            }
        }
    }
}

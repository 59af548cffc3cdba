use crate::{FetchError, Fetcher};
use bookmark_core::FetcherConfig;
use reqwest::{Client as HttpClient, Url};
use tokio_util::sync::CancellationToken;
use tracing::instrument;

/// Fetcher backed by a reqwest client
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: HttpClient,
}

impl HttpFetcher {
    /// Build a client with the configured user agent and request timeout
    pub fn new(config: &FetcherConfig) -> Result<Self, FetchError> {
        let client = HttpClient::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout())
            .build()?;
        Ok(Self { client })
    }

    async fn get(&self, url: Url) -> Result<Vec<u8>, FetchError> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!("Fetch failed with status {}, headers:", status);
            for (name, value) in response.headers() {
                tracing::warn!("    {}: {:?}", name, value);
            }
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status { status: status.as_u16(), body });
        }

        let body = response.bytes().await?;
        tracing::debug!("Fetched {} bytes", body.len());
        Ok(body.to_vec())
    }
}

#[async_trait::async_trait]
impl Fetcher for HttpFetcher {
    #[instrument(skip(self, cancel))]
    async fn fetch(&self, cancel: &CancellationToken, url: &str) -> Result<Vec<u8>, FetchError> {
        if cancel.is_cancelled() {
            return Err(FetchError::Cancelled);
        }

        let url = Url::parse(url).map_err(|e| FetchError::invalid_url(url, e))?;

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!("Fetch cancelled");
                Err(FetchError::Cancelled)
            }
            result = self.get(url) => result,
        }
    }
}

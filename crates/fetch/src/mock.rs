use crate::{FetchError, Fetcher};
use bookmark_core::BookmarkData;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio_util::sync::CancellationToken;

/// Fetcher that never touches the network.
///
/// Every page is titled `title for <url>`. A failing fetcher answers every request
/// with a 500 status error instead.
#[derive(Debug, Clone, Default)]
pub struct StaticFetcher {
    fail: bool,
    calls: Arc<AtomicUsize>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self { fail: true, ..Self::default() }
    }

    /// Number of fetches made so far, across clones
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn title_for(url: &str) -> String {
        format!("title for {url}")
    }
}

#[async_trait::async_trait]
impl Fetcher for StaticFetcher {
    async fn fetch(&self, cancel: &CancellationToken, url: &str) -> Result<Vec<u8>, FetchError> {
        Ok(self.fetch_bookmark(cancel, url).await?.title.into_bytes())
    }

    async fn fetch_bookmark(&self, cancel: &CancellationToken, url: &str) -> Result<BookmarkData, FetchError> {
        if cancel.is_cancelled() {
            return Err(FetchError::Cancelled);
        }
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.fail {
            return Err(FetchError::Status { status: 500, body: "static failure".to_string() });
        }
        Ok(BookmarkData::new(Self::title_for(url)))
    }
}

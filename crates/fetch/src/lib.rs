//! Page fetching for new bookmarks
//!
//! [`Fetcher`] retrieves a page and extracts the data stored with a bookmark.
//! [`HttpFetcher`] does this over HTTP; [`StaticFetcher`] answers without the network.

mod error;
mod http;
mod mock;
mod title;

pub use error::FetchError;
pub use http::HttpFetcher;
pub use mock::StaticFetcher;
pub use title::extract_title;

use bookmark_core::BookmarkData;
use tokio_util::sync::CancellationToken;

/// Retrieves pages for bookmarking
#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch the raw page body
    async fn fetch(&self, cancel: &CancellationToken, url: &str) -> Result<Vec<u8>, FetchError>;

    /// Fetch the page and extract its title
    async fn fetch_bookmark(&self, cancel: &CancellationToken, url: &str) -> Result<BookmarkData, FetchError> {
        let page = self.fetch(cancel, url).await?;
        Ok(BookmarkData::new(extract_title(&page)))
    }
}

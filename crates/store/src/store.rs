//! The storage interface shared by the SQLite and in-memory stores

use crate::error::Result;
use bookmark_core::{BookmarkData, BookmarkEntry};
use tokio_util::sync::CancellationToken;

/// Persistence, ranking and search over bookmarks.
///
/// Every operation takes the caller's cancellation token. A token that is already
/// cancelled fails the operation with [`Error::Cancelled`](crate::Error::Cancelled)
/// before the store is touched.
#[async_trait::async_trait]
pub trait BookmarkStore: Send + Sync {
    /// Insert a new bookmark with zero hits, not a favorite, accessed now.
    ///
    /// Fails with [`Error::AlreadyExists`](crate::Error::AlreadyExists) when the URL
    /// is already stored; the existing row is left unchanged.
    async fn insert(&self, cancel: &CancellationToken, url: &str, data: &BookmarkData) -> Result<()>;

    /// Look up a bookmark by exact URL and refresh its last access time.
    async fn get(&self, cancel: &CancellationToken, url: &str) -> Result<Option<BookmarkData>>;

    /// Increment the hit count by one. No-op when the URL is absent.
    async fn hit(&self, cancel: &CancellationToken, url: &str) -> Result<()>;

    /// Set the favorite flag. No-op when the URL is absent.
    async fn set_favorite(&self, cancel: &CancellationToken, url: &str, favorite: bool) -> Result<()>;

    /// Most recently accessed bookmarks first
    async fn recents(&self, cancel: &CancellationToken, limit: i64) -> Result<Vec<BookmarkEntry>>;

    /// Favorite bookmarks, most hit first
    async fn favorites(&self, cancel: &CancellationToken, limit: i64) -> Result<Vec<BookmarkEntry>>;

    /// Full-text search over titles, most relevant first
    async fn search(&self, cancel: &CancellationToken, pattern: &str) -> Result<Vec<BookmarkEntry>>;
}

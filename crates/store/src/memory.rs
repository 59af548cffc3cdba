//! In-memory bookmark store
//!
//! Keeps the bookmark rows and the title index behind one lock. Every write
//! updates both before the lock is released, so searches never see a row the
//! index is missing. Search has no stemming and ranks shorter titles first.
use crate::error::{Error, Result};
use crate::query::{Query, rewrite_pattern, tokenize};
use crate::store::BookmarkStore;

use bookmark_core::{BookmarkData, BookmarkEntry, PLACEHOLDER_TITLE};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use tokio::sync::{Mutex, MutexGuard};
use tokio_util::sync::CancellationToken;
use tracing::instrument;

#[derive(Debug, Clone)]
struct Row {
    rowid: u64,
    title: String,
    last_access: DateTime<Utc>,
    /// Logical clock value of the last access, orders rows with equal timestamps
    touched: u64,
    hit_count: i64,
    favorite: bool,
}

#[derive(Debug, Clone)]
struct IndexEntry {
    url: String,
    tokens: Vec<String>,
}

#[derive(Debug, Default)]
struct Inner {
    rows: HashMap<String, Row>,
    /// Title index keyed by rowid
    index: BTreeMap<u64, IndexEntry>,
    next_rowid: u64,
    clock: u64,
}

impl Inner {
    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    fn insert(&mut self, url: &str, title: &str, last_access: DateTime<Utc>) -> Result<()> {
        if self.rows.contains_key(url) {
            return Err(Error::already_exists(url));
        }

        self.next_rowid += 1;
        let rowid = self.next_rowid;
        let touched = self.tick();

        self.rows.insert(
            url.to_owned(),
            Row { rowid, title: title.to_owned(), last_access, touched, hit_count: 0, favorite: false },
        );
        self.index.insert(rowid, IndexEntry { url: url.to_owned(), tokens: tokenize(title) });
        Ok(())
    }

    fn entry(url: &str, row: &Row) -> BookmarkEntry {
        BookmarkEntry::new(row.title.clone(), url, row.favorite)
    }

    /// Rows shown by the ranking views, sorted by `key` descending
    fn ranked<K: Ord>(
        &self, limit: i64, filter: impl Fn(&Row) -> bool, key: impl Fn(&Row) -> K,
    ) -> Vec<BookmarkEntry> {
        let limit = usize::try_from(limit).unwrap_or(0);
        let mut rows: Vec<(&String, &Row)> = self
            .rows
            .iter()
            .filter(|(_, row)| row.title != PLACEHOLDER_TITLE && filter(row))
            .collect();
        rows.sort_by(|(_, a), (_, b)| key(b).cmp(&key(a)));
        rows.into_iter().take(limit).map(|(url, row)| Self::entry(url, row)).collect()
    }
}

/// A [`BookmarkStore`] that keeps everything in process memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a bookmark with an explicit last access time
    pub async fn insert_with_access(&self, url: &str, data: &BookmarkData, last_access: DateTime<Utc>) -> Result<()> {
        self.inner.lock().await.insert(url, &data.title, last_access)
    }

    async fn lock(&self, cancel: &CancellationToken) -> Result<MutexGuard<'_, Inner>> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(Error::Cancelled),
            guard = self.inner.lock() => Ok(guard),
        }
    }
}

#[async_trait::async_trait]
impl BookmarkStore for MemoryStore {
    #[instrument(skip(self, cancel, data))]
    async fn insert(&self, cancel: &CancellationToken, url: &str, data: &BookmarkData) -> Result<()> {
        self.lock(cancel).await?.insert(url, &data.title, Utc::now())
    }

    #[instrument(skip(self, cancel))]
    async fn get(&self, cancel: &CancellationToken, url: &str) -> Result<Option<BookmarkData>> {
        let mut inner = self.lock(cancel).await?;
        let touched = inner.tick();

        Ok(inner.rows.get_mut(url).map(|row| {
            row.last_access = Utc::now();
            row.touched = touched;
            BookmarkData::new(row.title.clone())
        }))
    }

    #[instrument(skip(self, cancel))]
    async fn hit(&self, cancel: &CancellationToken, url: &str) -> Result<()> {
        if let Some(row) = self.lock(cancel).await?.rows.get_mut(url) {
            row.hit_count += 1;
        }
        Ok(())
    }

    #[instrument(skip(self, cancel))]
    async fn set_favorite(&self, cancel: &CancellationToken, url: &str, favorite: bool) -> Result<()> {
        if let Some(row) = self.lock(cancel).await?.rows.get_mut(url) {
            row.favorite = favorite;
        }
        Ok(())
    }

    #[instrument(skip(self, cancel))]
    async fn recents(&self, cancel: &CancellationToken, limit: i64) -> Result<Vec<BookmarkEntry>> {
        let inner = self.lock(cancel).await?;
        Ok(inner.ranked(limit, |_| true, |row| (row.last_access, row.touched)))
    }

    #[instrument(skip(self, cancel))]
    async fn favorites(&self, cancel: &CancellationToken, limit: i64) -> Result<Vec<BookmarkEntry>> {
        let inner = self.lock(cancel).await?;
        Ok(inner.ranked(limit, |row| row.favorite, |row| (row.hit_count, row.rowid)))
    }

    #[instrument(skip(self, cancel))]
    async fn search(&self, cancel: &CancellationToken, pattern: &str) -> Result<Vec<BookmarkEntry>> {
        let Some(expr) = rewrite_pattern(pattern) else {
            return Ok(Vec::new());
        };
        let query = Query::parse(&expr)?;

        let inner = self.lock(cancel).await?;
        let mut hits: Vec<(usize, u64, &IndexEntry)> = inner
            .index
            .iter()
            .filter(|(_, entry)| query.matches(&entry.tokens))
            .map(|(rowid, entry)| (entry.tokens.len(), *rowid, entry))
            .collect();
        hits.sort_by_key(|(len, rowid, _)| (*len, *rowid));

        let results: Vec<BookmarkEntry> = hits
            .into_iter()
            .filter_map(|(_, _, entry)| inner.rows.get(&entry.url).map(|row| Inner::entry(&entry.url, row)))
            .collect();

        tracing::debug!("Search returned {} hits", results.len());
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2016, 3, d, 0, 0, 0).unwrap()
    }

    fn urls(entries: &[BookmarkEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.url.as_str()).collect()
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let store = MemoryStore::new();
        let cancel = CancellationToken::new();
        store.insert(&cancel, "http://example.com", &BookmarkData::new("Example Domain")).await.unwrap();

        let data = store.get(&cancel, "http://example.com").await.unwrap();
        assert_eq!(data, Some(BookmarkData::new("Example Domain")));
        assert!(store.get(&cancel, "http://missing.example").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_insert_keeps_first() {
        let store = MemoryStore::new();
        let cancel = CancellationToken::new();
        store.insert(&cancel, "http://example.com", &BookmarkData::new("first")).await.unwrap();

        let err = store
            .insert(&cancel, "http://example.com", &BookmarkData::new("second"))
            .await
            .unwrap_err();
        assert!(err.is_already_exists());
        assert_eq!(store.get(&cancel, "http://example.com").await.unwrap(), Some(BookmarkData::new("first")));
        assert!(store.search(&cancel, "second").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_promotes_in_recents() {
        let store = MemoryStore::new();
        let cancel = CancellationToken::new();
        store.insert_with_access("http://earlier.example", &BookmarkData::new("earlier"), day(29)).await.unwrap();
        store.insert_with_access("http://later.example", &BookmarkData::new("later"), day(30)).await.unwrap();

        assert_eq!(urls(&store.recents(&cancel, 1).await.unwrap()), vec!["http://later.example"]);

        store.get(&cancel, "http://earlier.example").await.unwrap();
        assert_eq!(urls(&store.recents(&cancel, 1).await.unwrap()), vec!["http://earlier.example"]);
    }

    #[tokio::test]
    async fn test_recents_ties_prefer_latest_access() {
        let store = MemoryStore::new();
        let cancel = CancellationToken::new();
        store.insert_with_access("http://a.example", &BookmarkData::new("a"), day(29)).await.unwrap();
        store.insert_with_access("http://b.example", &BookmarkData::new("b"), day(29)).await.unwrap();

        assert_eq!(urls(&store.recents(&cancel, 5).await.unwrap()), vec!["http://b.example", "http://a.example"]);
        assert!(store.recents(&cancel, 0).await.unwrap().is_empty());
        assert!(store.recents(&cancel, -3).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_favorites_ordered_by_hits() {
        let store = MemoryStore::new();
        let cancel = CancellationToken::new();
        for url in ["http://a.example", "http://b.example", "http://c.example"] {
            store.insert(&cancel, url, &BookmarkData::new(url)).await.unwrap();
        }
        store.set_favorite(&cancel, "http://a.example", true).await.unwrap();
        store.set_favorite(&cancel, "http://b.example", true).await.unwrap();
        store.hit(&cancel, "http://a.example").await.unwrap();

        let favorites = store.favorites(&cancel, 5).await.unwrap();
        assert_eq!(urls(&favorites), vec!["http://a.example", "http://b.example"]);

        store.hit(&cancel, "http://b.example").await.unwrap();
        store.hit(&cancel, "http://b.example").await.unwrap();
        let favorites = store.favorites(&cancel, 5).await.unwrap();
        assert_eq!(urls(&favorites), vec!["http://b.example", "http://a.example"]);
    }

    #[tokio::test]
    async fn test_placeholder_title_hidden_from_views() {
        let store = MemoryStore::new();
        let cancel = CancellationToken::new();
        store.insert(&cancel, "http://blank.example", &BookmarkData::new(PLACEHOLDER_TITLE)).await.unwrap();
        store.set_favorite(&cancel, "http://blank.example", true).await.unwrap();

        assert!(store.recents(&cancel, 5).await.unwrap().is_empty());
        assert!(store.favorites(&cancel, 5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search() {
        let store = MemoryStore::new();
        let cancel = CancellationToken::new();
        store.insert(&cancel, "http://one-two.example", &BookmarkData::new("one two")).await.unwrap();
        store.insert(&cancel, "http://one-three.example", &BookmarkData::new("one three")).await.unwrap();

        assert_eq!(store.search(&cancel, "one").await.unwrap().len(), 2);
        assert_eq!(store.search(&cancel, "one two").await.unwrap().len(), 1);
        assert!(store.search(&cancel, "one two three").await.unwrap().is_empty());
        assert_eq!(urls(&store.search(&cancel, "one thr").await.unwrap()), vec!["http://one-three.example"]);
        assert_eq!(store.search(&cancel, "\"one three\"").await.unwrap().len(), 1);
        assert!(store.search(&cancel, "\"one thr\"").await.unwrap().is_empty());
        assert!(store.search(&cancel, " ").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_ranks_shorter_titles_first() {
        let store = MemoryStore::new();
        let cancel = CancellationToken::new();
        store.insert(&cancel, "http://long.example", &BookmarkData::new("rust by example book")).await.unwrap();
        store.insert(&cancel, "http://short.example", &BookmarkData::new("rust")).await.unwrap();

        let hits = store.search(&cancel, "rust").await.unwrap();
        assert_eq!(urls(&hits), vec!["http://short.example", "http://long.example"]);
    }

    #[tokio::test]
    async fn test_search_invalid_query() {
        let store = MemoryStore::new();
        let err = store.search(&CancellationToken::new(), "\"one").await.unwrap_err();
        assert!(matches!(err, Error::InvalidQuery(_)));
    }

    #[tokio::test]
    async fn test_cancelled_token_skips_write() {
        let store = MemoryStore::new();
        let cancelled = CancellationToken::new();
        cancelled.cancel();

        let err = store
            .insert(&cancelled, "http://example.com", &BookmarkData::new("Example"))
            .await
            .unwrap_err();
        assert!(err.is_cancelled());
        assert!(store.get(&CancellationToken::new(), "http://example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_cancel_while_waiting_for_lock() {
        let store = MemoryStore::new();
        let cancel = CancellationToken::new();
        let held = store.inner.lock().await;

        let (result, _) = tokio::join!(store.recents(&cancel, 5), async {
            tokio::task::yield_now().await;
            cancel.cancel();
        });
        assert!(result.unwrap_err().is_cancelled());
        drop(held);
    }
}

//! Bookmark store backed by SQLite with an FTS5 title index
//!
//! All statements run on the single worker thread owned by the
//! [`tokio_rusqlite::Connection`]. Each operation is one statement; the FTS index is
//! maintained by triggers inside that statement.
use crate::error::{Error, Result};
use crate::migration::MigrationManager;
use crate::query::rewrite_pattern;
use crate::store::BookmarkStore;

use bookmark_core::{BookmarkData, BookmarkEntry, DatabaseConfig, PLACEHOLDER_TITLE};
use rusqlite::{OptionalExtension, params};
use std::{path::Path, sync::Arc};
use tokio_rusqlite::Connection;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

/// A handle to the bookmark database
///
/// Cloning is cheap; clones share the same connection and worker thread.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Connection>,
}

/// Next value of the access sequence, evaluated inside the writing statement
const NEXT_ACCESS_SEQ: &str = "(SELECT COALESCE(MAX(access_seq), 0) + 1 FROM bookmarks)";

/// Whether an insert failed on the url primary key rather than any other constraint
fn is_duplicate_url(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _) if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
    )
}

fn entry_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<BookmarkEntry> {
    Ok(BookmarkEntry { title: row.get(0)?, url: row.get(1)?, is_favorite: row.get(2)? })
}

impl SqliteStore {
    /// Open the database named by the configuration, creating its directory if needed
    pub async fn open(config: &DatabaseConfig) -> Result<Self> {
        if let Some(parent) = config.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        Self::open_path(&config.path).await
    }

    /// Open or create a bookmark database at the given path
    ///
    /// Applies any pending schema increments before returning. A migration failure
    /// is returned as [`Error::Schema`] and no store is constructed.
    #[instrument(skip_all, fields(db_path = %db_path.display()))]
    pub async fn open_path(db_path: &Path) -> Result<Self> {
        tracing::info!("Opening bookmark store at {}", db_path.display());

        let conn = Connection::open(db_path)
            .await
            .map_err(|e| Error::database(format!("Failed to open database: {e}")))?;

        conn.call(|conn| conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;"))
            .await?;

        Self::init(conn).await
    }

    /// Open a private in-memory database, used by tests and throwaway runs
    pub async fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| Error::database(format!("Failed to open in-memory database: {e}")))?;
        Self::init(conn).await
    }

    async fn init(conn: Connection) -> Result<Self> {
        let version = conn
            .call(|conn| {
                tracing::debug!("Running migrations");
                Ok::<_, rusqlite::Error>(MigrationManager::default().migrate(conn))
            })
            .await??;

        tracing::info!("Bookmark store opened at schema version {}", version);
        Ok(Self { conn: Arc::new(conn) })
    }

    /// Run one closure on the worker thread, honouring the cancellation token.
    ///
    /// The token is checked before dispatch and again on the worker before the
    /// closure runs. While waiting, the reply is raced against the token; a closure
    /// that has already started still runs to completion.
    async fn run<R, F>(&self, cancel: &CancellationToken, f: F) -> Result<R>
    where
        R: Send + 'static,
        F: FnOnce(&mut rusqlite::Connection) -> rusqlite::Result<R> + Send + 'static,
    {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let token = cancel.clone();
        let call = self.conn.call(move |conn| {
            if token.is_cancelled() {
                tracing::trace!("Skipping statement, request was cancelled while queued");
                return Ok(None);
            }
            f(conn).map(Some)
        });

        tokio::select! {
            biased;
            result = call => result?.ok_or(Error::Cancelled),
            _ = cancel.cancelled() => Err(Error::Cancelled),
        }
    }
}

#[async_trait::async_trait]
impl BookmarkStore for SqliteStore {
    #[instrument(skip(self, cancel, data))]
    async fn insert(&self, cancel: &CancellationToken, url: &str, data: &BookmarkData) -> Result<()> {
        tracing::debug!("Inserting bookmark: {}", url);

        let owned_url = url.to_owned();
        let title = data.title.clone();

        let inserted = self
            .run(cancel, move |conn| {
                let mut stmt = conn.prepare_cached(&format!(
                    r#"
                    INSERT INTO bookmarks (url, title, last_access, hit_count, favorite, access_seq)
                    VALUES (?1, ?2, strftime('%Y-%m-%d %H:%M:%f', 'now'), 0, 0, {NEXT_ACCESS_SEQ})
                    "#
                ))?;

                match stmt.execute(params![&owned_url, &title]) {
                    Ok(_) => Ok(true),
                    Err(e) if is_duplicate_url(&e) => Ok(false),
                    Err(e) => Err(e),
                }
            })
            .await?;

        if !inserted {
            tracing::debug!("Bookmark already present: {}", url);
            return Err(Error::already_exists(url));
        }
        Ok(())
    }

    #[instrument(skip(self, cancel))]
    async fn get(&self, cancel: &CancellationToken, url: &str) -> Result<Option<BookmarkData>> {
        tracing::trace!("Getting bookmark: {}", url);

        let url = url.to_owned();
        let title = self
            .run(cancel, move |conn| {
                let mut stmt = conn.prepare_cached(&format!(
                    r#"
                    UPDATE bookmarks
                    SET last_access = strftime('%Y-%m-%d %H:%M:%f', 'now'), access_seq = {NEXT_ACCESS_SEQ}
                    WHERE url = ?1
                    RETURNING title
                    "#
                ))?;
                stmt.query_row(params![&url], |row| row.get::<_, String>(0)).optional()
            })
            .await?;

        Ok(title.map(BookmarkData::new))
    }

    #[instrument(skip(self, cancel))]
    async fn hit(&self, cancel: &CancellationToken, url: &str) -> Result<()> {
        let url = url.to_owned();
        let updated = self
            .run(cancel, move |conn| {
                let mut stmt = conn.prepare_cached("UPDATE bookmarks SET hit_count = hit_count + 1 WHERE url = ?1")?;
                stmt.execute(params![&url])
            })
            .await?;

        tracing::trace!("Hit updated {} rows", updated);
        Ok(())
    }

    #[instrument(skip(self, cancel))]
    async fn set_favorite(&self, cancel: &CancellationToken, url: &str, favorite: bool) -> Result<()> {
        let url = url.to_owned();
        let updated = self
            .run(cancel, move |conn| {
                let mut stmt = conn.prepare_cached("UPDATE bookmarks SET favorite = ?2 WHERE url = ?1")?;
                stmt.execute(params![&url, favorite])
            })
            .await?;

        tracing::trace!("Favorite updated {} rows", updated);
        Ok(())
    }

    #[instrument(skip(self, cancel))]
    async fn recents(&self, cancel: &CancellationToken, limit: i64) -> Result<Vec<BookmarkEntry>> {
        let limit = limit.max(0);
        let entries = self
            .run(cancel, move |conn| {
                let mut stmt = conn.prepare_cached(
                    r#"
                    SELECT title, url, favorite FROM bookmarks
                    WHERE title != ?2
                    ORDER BY last_access DESC, access_seq DESC, rowid DESC
                    LIMIT ?1
                    "#,
                )?;
                stmt.query_map(params![limit, PLACEHOLDER_TITLE], entry_from_row)?
                    .collect::<rusqlite::Result<Vec<_>>>()
            })
            .await?;

        tracing::debug!("Recents returned {} entries", entries.len());
        Ok(entries)
    }

    #[instrument(skip(self, cancel))]
    async fn favorites(&self, cancel: &CancellationToken, limit: i64) -> Result<Vec<BookmarkEntry>> {
        let limit = limit.max(0);
        let entries = self
            .run(cancel, move |conn| {
                let mut stmt = conn.prepare_cached(
                    r#"
                    SELECT title, url, favorite FROM bookmarks
                    WHERE favorite = 1 AND title != ?2
                    ORDER BY hit_count DESC, rowid DESC
                    LIMIT ?1
                    "#,
                )?;
                stmt.query_map(params![limit, PLACEHOLDER_TITLE], entry_from_row)?
                    .collect::<rusqlite::Result<Vec<_>>>()
            })
            .await?;

        tracing::debug!("Favorites returned {} entries", entries.len());
        Ok(entries)
    }

    /// Search titles with FTS5, best bm25 rank first.
    ///
    /// A malformed MATCH expression is reported by SQLite and returned as a storage error.
    #[instrument(skip(self, cancel))]
    async fn search(&self, cancel: &CancellationToken, pattern: &str) -> Result<Vec<BookmarkEntry>> {
        let Some(expr) = rewrite_pattern(pattern) else {
            tracing::trace!("Empty search pattern");
            return Ok(Vec::new());
        };
        tracing::debug!("Searching with query: {}", expr);

        let hits = self
            .run(cancel, move |conn| {
                let mut stmt = conn.prepare_cached(
                    r#"
                    SELECT b.title, b.url, b.favorite
                    FROM bookmarks_fts
                    JOIN bookmarks b ON b.rowid = bookmarks_fts.rowid
                    WHERE bookmarks_fts MATCH ?1
                    ORDER BY bookmarks_fts.rank
                    "#,
                )?;
                stmt.query_map(params![&expr], entry_from_row)?
                    .collect::<rusqlite::Result<Vec<_>>>()
            })
            .await?;

        tracing::debug!("Search returned {} hits", hits.len());
        Ok(hits)
    }
}

//! Bookmark persistence, ranking and full-text search
//!
//! [`BookmarkStore`] is implemented by [`SqliteStore`], which keeps bookmarks in one
//! table with an FTS5 title index maintained by triggers, and by [`MemoryStore`],
//! which keeps both in process memory.
//!
//! # Example
//!
//! ```ignore
//! use bookmark_core::BookmarkData;
//! use bookmark_store::{BookmarkStore, SqliteStore};
//! use tokio_util::sync::CancellationToken;
//!
//! let store = SqliteStore::open_path(&db_path).await?;
//! let cancel = CancellationToken::new();
//!
//! store.insert(&cancel, "http://example.com", &BookmarkData::new("Example Domain")).await?;
//! store.set_favorite(&cancel, "http://example.com", true).await?;
//!
//! // The final token is matched as a prefix
//! for entry in store.search(&cancel, "exam").await? {
//!     println!("{} ({})", entry.title, entry.url);
//! }
//! ```

mod error;
mod memory;
mod migration;
mod query;
mod schema;
mod sqlite_store;
mod store;

pub use error::{Error, Result};
pub use memory::MemoryStore;
pub use migration::MigrationManager;
pub use query::rewrite_pattern;
pub use schema::{MIGRATIONS, SCHEMA_VERSION};
pub use sqlite_store::SqliteStore;
pub use store::BookmarkStore;

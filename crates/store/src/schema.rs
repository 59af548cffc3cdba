//! SQLite schema for the bookmark store
//!
//! Each entry of [`MIGRATIONS`] is one schema increment; entry `i` upgrades the
//! database from version `i` to `i + 1`. Entries are append-only: never edit one
//! that has shipped, add a new increment instead.

/// Ordered schema increments
pub const MIGRATIONS: &[&str] = &[V1_BOOKMARKS_AND_FTS, V2_FAVORITES, V3_RANKING_INDEXES, V4_ACCESS_SEQUENCE];

/// Schema version after all increments are applied
pub const SCHEMA_VERSION: usize = MIGRATIONS.len();

/// Singleton row id of the metadata table
pub const METADATA_ID: i64 = 0;

/// Version 1: metadata, bookmarks content table and its FTS5 title index.
///
/// The FTS table uses external content pointing at `bookmarks` and shares its rowid,
/// so the index holds no copy of the text. Triggers keep it in sync with every write
/// to `bookmarks`.
const V1_BOOKMARKS_AND_FTS: &str = r#"
CREATE TABLE IF NOT EXISTS metadata (
    id INTEGER PRIMARY KEY,
    schema_version INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS bookmarks (
    url TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    last_access TEXT NOT NULL,
    hit_count INTEGER NOT NULL DEFAULT 0
);

DROP TABLE IF EXISTS bookmarks_fts;

CREATE VIRTUAL TABLE bookmarks_fts USING fts5(
    url UNINDEXED,
    title,
    content='bookmarks',
    prefix='1 2 3',
    tokenize='porter unicode61'
);

DROP TRIGGER IF EXISTS bookmarks_ai;
CREATE TRIGGER bookmarks_ai AFTER INSERT ON bookmarks BEGIN
    INSERT INTO bookmarks_fts(rowid, url, title) VALUES (NEW.rowid, NEW.url, NEW.title);
END;

DROP TRIGGER IF EXISTS bookmarks_ad;
CREATE TRIGGER bookmarks_ad AFTER DELETE ON bookmarks BEGIN
    INSERT INTO bookmarks_fts(bookmarks_fts, rowid, url, title) VALUES ('delete', OLD.rowid, OLD.url, OLD.title);
END;

DROP TRIGGER IF EXISTS bookmarks_au;
CREATE TRIGGER bookmarks_au AFTER UPDATE ON bookmarks BEGIN
    INSERT INTO bookmarks_fts(bookmarks_fts, rowid, url, title) VALUES ('delete', OLD.rowid, OLD.url, OLD.title);
    INSERT INTO bookmarks_fts(rowid, url, title) VALUES (NEW.rowid, NEW.url, NEW.title);
END;

INSERT INTO bookmarks_fts(bookmarks_fts) VALUES ('rebuild');
"#;

/// Version 2: favorite flag
const V2_FAVORITES: &str = r#"
ALTER TABLE bookmarks ADD COLUMN favorite INTEGER NOT NULL DEFAULT 0;
"#;

/// Version 3: indexes backing the recents and favorites views
const V3_RANKING_INDEXES: &str = r#"
CREATE INDEX IF NOT EXISTS idx_bookmarks_last_access ON bookmarks(last_access);
CREATE INDEX IF NOT EXISTS idx_bookmarks_favorite_hits ON bookmarks(favorite, hit_count);
"#;


/// Version 4: access sequence, a monotonic counter bumped by every insert and lookup.
///
/// Orders bookmarks whose `last_access` stamps fall in the same millisecond.
const V4_ACCESS_SEQUENCE: &str = r#"
ALTER TABLE bookmarks ADD COLUMN access_seq INTEGER NOT NULL DEFAULT 0;
DROP INDEX IF EXISTS idx_bookmarks_last_access;
CREATE INDEX IF NOT EXISTS idx_bookmarks_recents ON bookmarks(last_access, access_seq);
"#;

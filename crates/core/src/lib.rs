//! Shared building blocks for the bookmark server: configuration, logging,
//! the core error type and the bookmark data passed between crates.

pub mod bookmark;
pub mod config;
pub mod error;
pub mod logging;

pub use bookmark::{BookmarkData, BookmarkEntry, PLACEHOLDER_TITLE};
pub use config::{Config, DatabaseConfig, FetcherConfig, LoggingConfig, ServerConfig};
pub use error::{Error, Result};

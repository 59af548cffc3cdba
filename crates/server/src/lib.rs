//! Bookmark server: HTTP API over the bookmark store plus the frontend files.

pub mod http;

use std::path::Path;
use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use bookmark_fetch::Fetcher;
use bookmark_store::BookmarkStore;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

/// Shared application state
pub struct AppState {
    pub store: Arc<dyn BookmarkStore>,
    pub fetcher: Arc<dyn Fetcher>,
    /// Root token; every request runs under a child of it
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(store: Arc<dyn BookmarkStore>, fetcher: Arc<dyn Fetcher>) -> Self {
        Self { store, fetcher, shutdown: CancellationToken::new() }
    }
}

/// Create the router: the `/api` endpoints, `/assets` and `/static` from the frontend
/// directory, and `index.html` for every other path.
pub fn create_router(state: Arc<AppState>, frontend: &Path) -> Router {
    Router::new()
        .route("/api/add", post(http::add))
        .route("/api/recents", get(http::recents))
        .route("/api/favorites", get(http::favorites))
        .route("/api/search", get(http::search))
        .route("/api/hit", post(http::hit))
        .route("/api/setFavorite", post(http::set_favorite))
        .nest_service("/assets", ServeDir::new(frontend.join("assets")))
        .nest_service("/static", ServeDir::new(frontend.join("static")))
        .fallback_service(ServeFile::new(frontend.join("index.html")))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve until the state's shutdown token is cancelled, then drain open connections
pub async fn serve(listener: TcpListener, state: Arc<AppState>, frontend: &Path) -> std::io::Result<()> {
    let shutdown = state.shutdown.clone();
    let app = create_router(state, frontend);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
}

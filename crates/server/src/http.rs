//! HTTP endpoint handlers

use std::convert::Infallible;
use std::ops::Deref;
use std::sync::Arc;

use axum::{
    Json,
    extract::{FromRequestParts, Query, State},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use bookmark_core::BookmarkEntry;
use bookmark_fetch::FetchError;
use serde::Deserialize;
use tokio_util::sync::{CancellationToken, DropGuard};

use crate::AppState;

/// Number of entries returned by the list endpoints when `count` is absent
pub const DEFAULT_COUNT: i64 = 5;

/// Non-standard status for a request abandoned by the client
const CLIENT_CLOSED_REQUEST: u16 = 499;

/// Errors a handler can answer with
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Error retrieving site: {0}")]
    Fetch(#[from] FetchError),

    #[error("Error accessing bookmarks: {0}")]
    Store(#[from] bookmark_store::Error),
}

impl ApiError {
    fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::Fetch(FetchError::Cancelled) | ApiError::Store(bookmark_store::Error::Cancelled) => {
                StatusCode::from_u16(CLIENT_CLOSED_REQUEST).unwrap_or(StatusCode::BAD_REQUEST)
            }
            ApiError::BadRequest(_) | ApiError::Fetch(_) | ApiError::Store(bookmark_store::Error::InvalidQuery(_)) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let msg = self.to_string();

        if status.is_server_error() {
            tracing::error!("{} {}", status.as_u16(), msg);
        } else if status == StatusCode::BAD_REQUEST {
            tracing::warn!("{} {}", status.as_u16(), msg);
        } else {
            tracing::debug!("{} {}", status.as_u16(), msg);
        }

        (status, msg).into_response()
    }
}

/// Cancellation token scoped to one request.
///
/// A child of the server's shutdown token, cancelled when the handler future is
/// dropped (the client went away) or when the server shuts down.
pub struct RequestToken {
    token: CancellationToken,
    _guard: DropGuard,
}

impl Deref for RequestToken {
    type Target = CancellationToken;

    fn deref(&self) -> &Self::Target {
        &self.token
    }
}

impl FromRequestParts<Arc<AppState>> for RequestToken {
    type Rejection = Infallible;

    async fn from_request_parts(_parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let token = state.shutdown.child_token();
        Ok(Self { _guard: token.clone().drop_guard(), token })
    }
}

#[derive(Debug, Deserialize)]
pub struct UrlParams {
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CountParams {
    pub count: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteParams {
    pub url: Option<String>,
    pub is_favorite: Option<String>,
}

fn require_url(url: Option<String>) -> Result<String, ApiError> {
    url.ok_or_else(|| ApiError::bad_request("No url provided"))
}

fn parse_count(count: Option<&str>) -> Result<i64, ApiError> {
    match count {
        None => Ok(DEFAULT_COUNT),
        Some(raw) => raw
            .parse()
            .map_err(|_| ApiError::bad_request(format!("Invalid count specification: {raw}"))),
    }
}

fn parse_favorite(value: &str) -> Result<bool, ApiError> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ApiError::bad_request("Expected true/false for isFavorite")),
    }
}

/// Add a bookmark, fetching its title when the URL is new
pub async fn add(
    State(state): State<Arc<AppState>>, cancel: RequestToken, Query(params): Query<UrlParams>,
) -> Result<StatusCode, ApiError> {
    let url = require_url(params.url)?;

    if state.store.get(&cancel, &url).await?.is_some() {
        tracing::debug!("Bookmark already stored: {}", url);
        return Ok(StatusCode::OK);
    }

    tracing::info!("Fetching bookmark {}", url);
    let data = state.fetcher.fetch_bookmark(&cancel, &url).await?;

    match state.store.insert(&cancel, &url, &data).await {
        Ok(()) => Ok(StatusCode::OK),
        Err(e) if e.is_already_exists() => {
            tracing::debug!("Bookmark added concurrently: {}", url);
            Ok(StatusCode::OK)
        }
        Err(e) => Err(e.into()),
    }
}

/// Most recently accessed bookmarks
pub async fn recents(
    State(state): State<Arc<AppState>>, cancel: RequestToken, Query(params): Query<CountParams>,
) -> Result<Json<Vec<BookmarkEntry>>, ApiError> {
    let count = parse_count(params.count.as_deref())?;
    Ok(Json(state.store.recents(&cancel, count).await?))
}

/// Favorite bookmarks by hit count
pub async fn favorites(
    State(state): State<Arc<AppState>>, cancel: RequestToken, Query(params): Query<CountParams>,
) -> Result<Json<Vec<BookmarkEntry>>, ApiError> {
    let count = parse_count(params.count.as_deref())?;
    Ok(Json(state.store.favorites(&cancel, count).await?))
}

pub async fn search(
    State(state): State<Arc<AppState>>, cancel: RequestToken, Query(params): Query<SearchParams>,
) -> Result<Json<Vec<BookmarkEntry>>, ApiError> {
    let pattern = params.q.ok_or_else(|| ApiError::bad_request("No search terms provided"))?;
    Ok(Json(state.store.search(&cancel, &pattern).await?))
}

pub async fn hit(
    State(state): State<Arc<AppState>>, cancel: RequestToken, Query(params): Query<UrlParams>,
) -> Result<StatusCode, ApiError> {
    let url = require_url(params.url)?;
    state.store.hit(&cancel, &url).await?;
    Ok(StatusCode::OK)
}

pub async fn set_favorite(
    State(state): State<Arc<AppState>>, cancel: RequestToken, Query(params): Query<FavoriteParams>,
) -> Result<StatusCode, ApiError> {
    let url = require_url(params.url)?;
    let value = params
        .is_favorite
        .ok_or_else(|| ApiError::bad_request("No isFavorite value provided"))?;
    let favorite = parse_favorite(&value)?;

    state.store.set_favorite(&cancel, &url, favorite).await?;
    Ok(StatusCode::OK)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count(None).unwrap(), DEFAULT_COUNT);
        assert_eq!(parse_count(Some("12")).unwrap(), 12);
        assert_eq!(parse_count(Some("-1")).unwrap(), -1);

        let err = parse_count(Some("five")).unwrap_err();
        assert_eq!(err.to_string(), "Invalid count specification: five");
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_parse_favorite() {
        assert!(parse_favorite("true").unwrap());
        assert!(!parse_favorite("false").unwrap());
        assert!(parse_favorite("TRUE").is_err());
        assert!(parse_favorite("1").is_err());
    }

    #[test]
    fn test_error_status() {
        assert_eq!(ApiError::from(bookmark_store::Error::Cancelled).status().as_u16(), 499);
        assert_eq!(ApiError::from(FetchError::Cancelled).status().as_u16(), 499);
        assert_eq!(
            ApiError::from(bookmark_store::Error::database("disk full")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::from(FetchError::Status { status: 404, body: String::new() }).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(bookmark_store::Error::invalid_query("\"one")).status(),
            StatusCode::BAD_REQUEST
        );
    }
}

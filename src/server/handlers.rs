use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;

use super::AppState;
use crate::models::{Book, SourceReport};
use crate::search::SearchError;
use crate::utils::paginate;

const BOOKS_USAGE: &str = "/api/books?author=Author Name";

/// Query parameters for the books endpoint
///
/// Numbers are taken as strings so malformed values get a JSON error body.
#[derive(Debug, Default, Deserialize)]
pub struct BooksQuery {
    pub author: Option<String>,

    /// Zero-based page index
    pub page: Option<String>,

    pub page_size: Option<String>,
}

/// One page of books by an author
#[derive(Debug, Serialize, Deserialize)]
pub struct BooksResponse {
    pub author: String,

    /// Number of distinct books across all pages
    pub count: usize,
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub has_more: bool,
    pub books: Vec<Book>,
    pub sources: BTreeMap<String, SourceReport>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

/// GET / and GET /api
pub async fn api_docs() -> Json<Value> {
    Json(json!({
        "name": "Book Finder API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "/api": "API documentation",
            "/health": "Health check",
            "/api/books": "Search books by author (GET with ?author=name)"
        },
        "usage": {
            "example": "/api/books?author=Isaac Asimov",
            "parameters": {
                "author": "Author name (required)",
                "page": "Zero-based page index (default 0)",
                "page_size": "Books per page (default 50)"
            }
        }
    }))
}

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
    })
}

/// GET /api/books?author=<name>
pub async fn get_books(
    State(state): State<AppState>,
    Query(query): Query<BooksQuery>,
) -> Result<Json<BooksResponse>, ApiError> {
    let author = query
        .author
        .as_deref()
        .filter(|a| !a.trim().is_empty())
        .ok_or(ApiError::MissingAuthor)?;

    let settings = state.finder.settings();
    let page = parse_number("page", query.page.as_deref())?.unwrap_or(0);
    let page_size = parse_number("page_size", query.page_size.as_deref())?
        .unwrap_or(settings.page_size)
        .clamp(1, settings.max_page_size.max(1));

    let result = state.finder.search_books_by_author(author).await?;
    let page = paginate(result.books(), page, page_size);

    Ok(Json(BooksResponse {
        author: result.author().to_string(),
        count: page.total_count,
        page: page.page,
        page_size: page.page_size,
        total_pages: page.total_pages,
        has_more: page.has_more,
        books: page.books,
        sources: result.sources().clone(),
    }))
}

fn parse_number(name: &'static str, raw: Option<&str>) -> Result<Option<usize>, ApiError> {
    match raw.map(str::trim).filter(|r| !r.is_empty()) {
        None => Ok(None),
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| ApiError::InvalidParameter(name)),
    }
}

/// Errors returned by the API as `{error, usage}` JSON
#[derive(Debug)]
pub enum ApiError {
    MissingAuthor,
    InvalidParameter(&'static str),
    Search(SearchError),
}

impl From<SearchError> for ApiError {
    fn from(err: SearchError) -> Self {
        ApiError::Search(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = match self {
            ApiError::MissingAuthor => "Missing required parameter: author".to_string(),
            ApiError::InvalidParameter(name) => {
                format!("Invalid parameter: {} must be a non-negative integer", name)
            }
            ApiError::Search(err) => err.to_string(),
        };

        tracing::debug!("Rejected request: {}", message);
        (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": message,
                "usage": BOOKS_USAGE
            })),
        )
            .into_response()
    }
}

//! HTTP API over the book finder.
//!
//! Routes:
//!
//! - `GET /` and `GET /api`: API documentation
//! - `GET /health`: health check
//! - `GET /api/books?author=<name>[&page=<n>][&page_size=<k>]`: paginated search

mod handlers;

pub use handlers::{ApiError, BooksQuery, BooksResponse, HealthResponse};

use axum::{routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::search::BookFinder;

/// Application state shared across HTTP handlers
#[derive(Debug, Clone)]
pub struct AppState {
    pub finder: Arc<BookFinder>,
}

impl AppState {
    pub fn new(finder: BookFinder) -> Self {
        Self {
            finder: Arc::new(finder),
        }
    }
}

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::api_docs))
        .route("/api", get(handlers::api_docs))
        .route("/health", get(handlers::health))
        .route("/api/books", get(handlers::get_books))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve the API on `addr` until Ctrl+C or SIGTERM
pub async fn serve(state: AppState, addr: SocketAddr) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            tracing::info!("Received terminate signal, shutting down");
        },
    }
}

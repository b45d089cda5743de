//! HTTP router setup
//!
//! Wires the handlers to their routes and applies CORS and request tracing.

use crate::state::AppContext;
use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Build the application router
pub fn create_router(ctx: AppContext) -> Router {
    Router::new()
        // Health endpoint
        .route("/health", get(super::handlers::health))
        // Accounts
        .route("/register", post(super::handlers::register))
        .route("/login", post(super::handlers::login))
        .route("/logout", post(super::handlers::logout))
        // Shelf views
        .route("/profile", get(super::handlers::profile))
        .route("/search_books", get(super::handlers::search_books))
        // Classification interview
        .route("/books", post(super::handlers::add_book))
        .route("/books/compare", post(super::handlers::compare_books))
        .route("/books/:book_id/rerank", post(super::handlers::rerank_book))
        .route("/books/:book_id", delete(super::handlers::delete_book))
        // Attach application context
        .with_state(ctx)
        // Enable CORS for local access
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

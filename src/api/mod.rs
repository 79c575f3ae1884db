//! HTTP boundary: routing, `page` validation, and error-to-status mapping.

pub mod error;
pub mod handlers;

use crate::AppState;
use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use error::ApiError;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route(handlers::HEALTH_PATH, get(handlers::health))
        .route(handlers::REVIEWS_PATH, get(handlers::get_reviews))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

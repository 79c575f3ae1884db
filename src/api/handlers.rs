use super::error::ApiError;
use crate::core::types::*;
use crate::AppState;
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;
use tracing::{error, info};
use url::Url;

pub const HEALTH_PATH: &str = "/health";
pub const REVIEWS_PATH: &str = "/api/reviews";

pub async fn root() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Welcome to Review Scraper API".to_string(),
    })
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        endpoints: HealthEndpoints {
            health: HEALTH_PATH.to_string(),
            reviews: format!("{}?page=<url>", REVIEWS_PATH),
        },
    })
}

/// Accepts absolute `http`/`https` URLs only.
pub fn validate_page_url(page: Option<&str>) -> Result<Url, ApiError> {
    let raw = page.map(str::trim).filter(|p| !p.is_empty()).ok_or(ApiError::MissingUrl)?;
    let url = Url::parse(raw).map_err(|e| ApiError::InvalidUrl(format!("{}: {}", raw, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ApiError::InvalidUrl(format!("unsupported scheme '{}'", other))),
    }
}

pub async fn get_reviews(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ReviewsQuery>, QueryRejection>,
) -> Response {
    let outcome = match query {
        Ok(Query(query)) => fetch_reviews(&state, query).await,
        // e.g. `page` given twice
        Err(rejection) => Err(ApiError::InvalidUrl(rejection.body_text())),
    };
    match outcome {
        Ok(body) => Json(body).into_response(),
        Err(e) => {
            if matches!(e, ApiError::Scrape(_)) {
                error!("Review scraping failed: {}", e);
            }
            e.into_response_with(state.development)
        }
    }
}

async fn fetch_reviews(state: &AppState, query: ReviewsQuery) -> Result<ReviewsResponse, ApiError> {
    let url = validate_page_url(query.page.as_deref())?;

    let _permit = state
        .scrape_limit
        .acquire()
        .await
        .map_err(|_| ApiError::ShuttingDown)?;

    let reviews = state.scraper.scrape(url.as_str()).await?;
    info!("Returning {} reviews for {}", reviews.len(), url);
    Ok(ReviewsResponse::from(reviews))
}

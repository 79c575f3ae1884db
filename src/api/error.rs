use crate::core::error::ScrapeError;
use crate::core::types::ErrorResponse;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("missing page parameter")]
    MissingUrl,

    #[error("invalid page URL: {0}")]
    InvalidUrl(String),

    #[error("scrape limiter closed")]
    ShuttingDown,

    #[error(transparent)]
    Scrape(#[from] ScrapeError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingUrl | ApiError::InvalidUrl(_) => StatusCode::BAD_REQUEST,
            ApiError::ShuttingDown => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Scrape(e) if e.is_navigation_timeout() => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Scrape(e) if e.is_connection_refused() => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Scrape(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Response body; `development` adds the underlying message as `details`.
    pub fn body(&self, development: bool) -> ErrorResponse {
        let body = match self {
            ApiError::MissingUrl => ErrorResponse::new(
                "Missing URL",
                "Please provide a product URL using the page parameter",
            ),
            ApiError::InvalidUrl(_) => {
                ErrorResponse::new("Invalid URL", "Please provide a valid URL")
            }
            ApiError::ShuttingDown => ErrorResponse::new(
                "Service Unavailable",
                "The server is shutting down. Please try again later.",
            ),
            ApiError::Scrape(e) if e.is_navigation_timeout() => ErrorResponse::new(
                "Gateway Timeout",
                "The page took too long to load. Please try again later.",
            ),
            ApiError::Scrape(e) if e.is_connection_refused() => ErrorResponse::new(
                "Service Unavailable",
                "Could not connect to the target website. Please try again later.",
            ),
            ApiError::Scrape(_) => ErrorResponse::new(
                "Failed to fetch reviews",
                "Unable to scrape reviews from the provided URL",
            ),
        };
        body.with_details(development.then(|| self.to_string()))
    }

    pub fn into_response_with(self, development: bool) -> Response {
        (self.status(), Json(self.body(development))).into_response()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.into_response_with(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nav(message: &str) -> ApiError {
        ApiError::Scrape(ScrapeError::NavigationFailed {
            message: message.into(),
        })
    }

    #[test]
    fn maps_status_codes() {
        assert_eq!(ApiError::MissingUrl.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::InvalidUrl("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            nav("Navigation timeout of 30000 ms exceeded (domcontentloaded)").status(),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            nav("net::ERR_CONNECTION_REFUSED at http://localhost:1/").status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            nav("net::ERR_NAME_NOT_RESOLVED").status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::Scrape(ScrapeError::Extraction("Target closed".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn details_only_in_development() {
        let err = ApiError::Scrape(ScrapeError::Launch("no browser".into()));
        assert_eq!(err.body(false).details, None);
        assert_eq!(
            err.body(true).details.as_deref(),
            Some("browser launch failed: no browser")
        );
        assert_eq!(err.body(true).error, "Failed to fetch reviews");
    }
}

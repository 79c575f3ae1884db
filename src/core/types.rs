use serde::{Deserialize, Serialize};

pub const DEFAULT_REVIEW_TITLE: &str = "Product Review";
pub const DEFAULT_REVIEWER: &str = "Anonymous";
pub const DEFAULT_RATING: u8 = 5;

/// One normalized customer review.
///
/// `body` is never empty and `rating` is always within `0..=5`; the extractor
/// drops or clamps anything that would violate that.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Hash)]
pub struct ReviewRecord {
    pub title: String,
    pub body: String,
    pub rating: u8,
    pub reviewer: String,
}

impl ReviewRecord {
    /// Record with every field but the body defaulted.
    pub fn with_body(body: impl Into<String>) -> Self {
        Self {
            title: DEFAULT_REVIEW_TITLE.to_string(),
            body: body.into(),
            rating: DEFAULT_RATING,
            reviewer: DEFAULT_REVIEWER.to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct ReviewsQuery {
    #[serde(default)]
    pub page: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReviewsResponse {
    pub reviews_count: usize,
    pub reviews: Vec<ReviewRecord>,
}

impl From<Vec<ReviewRecord>> for ReviewsResponse {
    fn from(reviews: Vec<ReviewRecord>) -> Self {
        Self {
            reviews_count: reviews.len(),
            reviews,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthEndpoints {
    pub health: String,
    pub reviews: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub endpoints: HealthEndpoints,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    /// Underlying error text, only populated in development mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: Option<String>) -> Self {
        self.details = details;
        self
    }
}

use thiserror::Error;

/// Failures of a single scrape request.
///
/// Everything below navigation is best-effort and never surfaces here: scroll,
/// screenshot and teardown problems are logged and swallowed.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("browser launch failed: {0}")]
    Launch(String),

    /// Every navigation strategy failed; carries the last underlying message.
    #[error("Failed to load page with all strategies: {message}")]
    NavigationFailed { message: String },

    #[error("review extraction failed: {0}")]
    Extraction(String),
}

impl ScrapeError {
    pub fn is_navigation_timeout(&self) -> bool {
        matches!(self, ScrapeError::NavigationFailed { message } if message.contains("Navigation timeout"))
    }

    pub fn is_connection_refused(&self) -> bool {
        matches!(self, ScrapeError::NavigationFailed { message } if message.contains("net::ERR_CONNECTION_REFUSED"))
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectorError {
    #[error("platform '{platform}': invalid CSS selector '{selector}'")]
    Invalid { platform: String, selector: String },

    #[error("platform '{platform}': selector list for {field} is empty")]
    Empty {
        platform: String,
        field: &'static str,
    },
}

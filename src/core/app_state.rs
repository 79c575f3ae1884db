use crate::tools::reviews::ReviewScraper;
use std::sync::Arc;
use tokio::sync::Semaphore;

#[derive(Clone)]
pub struct AppState {
    pub scraper: Arc<ReviewScraper>,
    // Admission control: each scrape owns a whole browser process.
    pub scrape_limit: Arc<Semaphore>,
    /// Expose underlying error text in error responses.
    pub development: bool,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("available_scrape_slots", &self.scrape_limit.available_permits())
            .field("development", &self.development)
            .finish()
    }
}

impl AppState {
    pub fn new(scraper: ReviewScraper, max_concurrent_scrapes: usize) -> Self {
        Self {
            scraper: Arc::new(scraper),
            scrape_limit: Arc::new(Semaphore::new(max_concurrent_scrapes.max(1))),
            development: false,
        }
    }

    pub fn with_development(mut self, development: bool) -> Self {
        self.development = development;
        self
    }

    /// Stop admitting scrapes. Requests still queued for a slot fail with 503;
    /// scrapes already running finish normally.
    pub fn close_admission(&self) {
        self.scrape_limit.close();
    }
}

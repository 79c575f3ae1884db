use crate::core::error::ScrapeError;
use crate::core::types::ReviewRecord;
use crate::extraction::{extract_reviews, Extraction, SelectorCatalog};
use crate::scraping::dynamic::{settle, SettleSettings};
use crate::scraping::navigation::{load, NavigationPlan};
use crate::scraping::session::{BrowserSession, SessionLauncher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Drives one browser session per request through
/// navigate → settle → extract, and always tears the session down.
pub struct ReviewScraper {
    launcher: Arc<dyn SessionLauncher>,
    catalog: Arc<SelectorCatalog>,
    navigation: NavigationPlan,
    settle: SettleSettings,
    screenshot_path: Option<PathBuf>,
}

impl ReviewScraper {
    pub fn new(launcher: Arc<dyn SessionLauncher>, catalog: Arc<SelectorCatalog>) -> Self {
        Self {
            launcher,
            catalog,
            navigation: NavigationPlan::default(),
            settle: SettleSettings::default(),
            screenshot_path: Some(PathBuf::from(crate::core::config::DEFAULT_SCREENSHOT_PATH)),
        }
    }

    pub fn with_navigation(mut self, navigation: NavigationPlan) -> Self {
        self.navigation = navigation;
        self
    }

    pub fn with_settle(mut self, settle: SettleSettings) -> Self {
        self.settle = settle;
        self
    }

    /// `None` disables the failure screenshot.
    pub fn with_screenshot_path(mut self, path: Option<PathBuf>) -> Self {
        self.screenshot_path = path;
        self
    }

    pub fn catalog(&self) -> &SelectorCatalog {
        &self.catalog
    }

    pub async fn scrape(&self, url: &str) -> Result<Vec<ReviewRecord>, ScrapeError> {
        self.scrape_detailed(url).await.map(|e| e.reviews)
    }

    /// Like [`scrape`](Self::scrape), also reporting which bundle matched.
    pub async fn scrape_detailed(&self, url: &str) -> Result<Extraction, ScrapeError> {
        info!("Scraping reviews: {}", url);

        let session = self
            .launcher
            .acquire()
            .await
            .map_err(|e| ScrapeError::Launch(e.to_string()))?;

        let outcome = self.run(session.as_ref(), url).await;

        if let Err(e) = &outcome {
            error!("Error scraping reviews from {}: {}", url, e);
            if let Some(path) = &self.screenshot_path {
                capture_failure_screenshot(session.as_ref(), path).await;
            }
        }

        if let Err(e) = session.release().await {
            warn!("Session release error (non-fatal): {}", e);
        }

        outcome
    }

    async fn run(&self, session: &dyn BrowserSession, url: &str) -> Result<Extraction, ScrapeError> {
        load(session, url, &self.navigation).await?;
        settle(session, &self.settle).await;

        let html = session
            .content()
            .await
            .map_err(|e| ScrapeError::Extraction(e.to_string()))?;

        // Parsing and selector matching are synchronous; the DOM never crosses an await.
        let extraction = extract_reviews(&html, &self.catalog);
        info!("Total reviews found: {}", extraction.reviews.len());
        Ok(extraction)
    }
}

async fn capture_failure_screenshot(session: &dyn BrowserSession, path: &Path) {
    match session.save_screenshot(path).await {
        Ok(()) => info!("Failure screenshot written to {}", path.display()),
        Err(e) => warn!("Failure screenshot skipped: {}", e),
    }
}

//! Fixture browser sessions: serve canned HTML instead of launching Chromium.
#![allow(dead_code)]

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use review_scraper::extraction::SelectorCatalog;
use review_scraper::scraping::dynamic::SettleSettings;
use review_scraper::scraping::navigation::{NavigationPlan, NavigationStrategy, WaitCondition};
use review_scraper::scraping::{BrowserSession, SessionLauncher};
use review_scraper::ReviewScraper;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Default)]
pub struct FixtureStats {
    pub acquired: AtomicUsize,
    pub released: AtomicUsize,
    pub gotos: AtomicUsize,
    pub scrolls: AtomicUsize,
    pub screenshots: AtomicUsize,
}

impl FixtureStats {
    pub fn get(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

#[derive(Clone)]
pub struct FixtureLauncher {
    html: String,
    /// Every `goto` fails with this message.
    navigation_error: Option<String>,
    /// `content()` fails, as if the page was detached.
    detached: bool,
    pub stats: Arc<FixtureStats>,
}

impl FixtureLauncher {
    pub fn serving(html: &str) -> Self {
        Self {
            html: html.to_string(),
            navigation_error: None,
            detached: false,
            stats: Arc::new(FixtureStats::default()),
        }
    }

    pub fn unreachable(message: &str) -> Self {
        Self {
            navigation_error: Some(message.to_string()),
            ..Self::serving("")
        }
    }

    pub fn detached(html: &str) -> Self {
        Self {
            detached: true,
            ..Self::serving(html)
        }
    }
}

#[async_trait]
impl SessionLauncher for FixtureLauncher {
    async fn acquire(&self) -> Result<Box<dyn BrowserSession>> {
        self.stats.acquired.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FixtureSession {
            launcher: self.clone(),
        }))
    }
}

pub struct FixtureSession {
    launcher: FixtureLauncher,
}

#[async_trait]
impl BrowserSession for FixtureSession {
    async fn goto(&self, url: &str, _wait_until: WaitCondition) -> Result<()> {
        self.launcher.stats.gotos.fetch_add(1, Ordering::SeqCst);
        match &self.launcher.navigation_error {
            Some(msg) => Err(anyhow!("{} at {}", msg, url)),
            None => Ok(()),
        }
    }

    async fn scroll_by(&self, _distance: u32) -> Result<()> {
        self.launcher.stats.scrolls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn scroll_height(&self) -> Result<u64> {
        Ok(300)
    }

    async fn content(&self) -> Result<String> {
        if self.launcher.detached {
            return Err(anyhow!("Target closed"));
        }
        Ok(self.launcher.html.clone())
    }

    async fn save_screenshot(&self, _path: &Path) -> Result<()> {
        self.launcher.stats.screenshots.fetch_add(1, Ordering::SeqCst);
        Err(anyhow!("screenshots unsupported in fixtures"))
    }

    async fn release(self: Box<Self>) -> Result<()> {
        self.launcher.stats.released.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Scraper over `launcher` with the built-in catalog and no real waiting.
pub fn fast_scraper(launcher: FixtureLauncher) -> ReviewScraper {
    ReviewScraper::new(Arc::new(launcher), Arc::new(SelectorCatalog::builtin()))
        .with_navigation(NavigationPlan {
            strategies: vec![
                NavigationStrategy::new(WaitCondition::DomContentLoaded, 200),
                NavigationStrategy::new(WaitCondition::Load, 200),
                NavigationStrategy::new(WaitCondition::NetworkIdle, 200),
            ],
            retry_backoff: Duration::ZERO,
        })
        .with_settle(SettleSettings::immediate())
}

pub const YOTPO_PAGE: &str = r#"<!doctype html>
<html><body>
  <div class="yotpo-reviews">
    <div class="yotpo-review">
      <span class="yotpo-user-name">Alex P.</span>
      <span class="yotpo-stars" data-score="10"></span>
      <div class="yotpo-review-title">Best mug ever</div>
      <div class="content-review">Keeps coffee hot for hours.</div>
    </div>
    <div class="yotpo-review">
      <span class="yotpo-user-name">Jordan</span>
      <span class="yotpo-stars">8</span>
      <div class="yotpo-review-title">Pretty good</div>
      <div class="content-review">Handle gets warm, otherwise great.</div>
    </div>
    <div class="yotpo-review">
      <span class="yotpo-user-name">Riley</span>
      <span class="yotpo-stars" data-rating="2"></span>
      <div class="yotpo-review-title">Chipped</div>
      <div class="content-review">Arrived with a chip on the rim.</div>
    </div>
  </div>
  <div class="spr-review"><p class="spr-review-content-body">Shopify widget left over</p></div>
  <div class="review"><p>Theme testimonial block</p></div>
</body></html>"#;

pub const NO_WIDGET_PAGE: &str = r#"<!doctype html>
<html><body>
  <h1>Ceramic Mug</h1>
  <section><div>Great rating, 5 stars, review was excellent and detailed enough</div></section>
</body></html>"#;

//! Native browser management using `chromiumoxide`.
//!
//! This module owns:
//! * Finding a usable browser executable (Chrome → Chromium → Brave, cross-platform).
//! * Building the headless launch config (sandbox flags, viewport, identity).
//! * `ChromiumLauncher`: one fresh browser process per scrape request.
//! * Request interception that drops images, stylesheets, fonts and media.
//! * Load-condition waits (page lifecycle events, network-idle heuristic).

use super::navigation::{WaitCondition, NETWORK_IDLE_QUIET};
use super::session::{BrowserSession, SessionLauncher};
use aho_corasick::AhoCorasick;
use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use chromiumoxide::browser::BrowserConfig;
use chromiumoxide::cdp::browser_protocol::fetch::{
    ContinueRequestParams, EnableParams, EventRequestPaused, FailRequestParams,
};
use chromiumoxide::cdp::browser_protocol::network::{ErrorReason, ResourceType};
use chromiumoxide::cdp::browser_protocol::page::{
    CaptureScreenshotFormat, EventDomContentEventFired, EventLoadEventFired, NavigateParams,
};
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::{Browser, Page};
use futures::future::BoxFuture;
use futures::{FutureExt, StreamExt};
use std::future::Future;
use std::path::Path;
use std::sync::OnceLock;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Launch-time settings for each scrape's browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserSettings {
    /// Explicit executable; auto-discovered when `None`.
    pub executable: Option<String>,
    pub user_agent: String,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub launch_timeout: Duration,
    /// Default timeout for every CDP command on the page.
    pub request_timeout: Duration,
    /// Also abort requests to known ad/analytics hosts.
    pub block_trackers: bool,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            executable: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            viewport_width: 1920,
            viewport_height: 1080,
            launch_timeout: Duration::from_secs(60),
            request_timeout: Duration::from_secs(60),
            block_trackers: false,
        }
    }
}

// ── Browser executable discovery ─────────────────────────────────────────────

/// Find a usable Chromium-family browser executable.
///
/// Resolution order:
/// 1. `CHROME_EXECUTABLE` env var (explicit override)
/// 2. PATH lookup
/// 3. OS-specific well-known install paths
pub fn find_chrome_executable() -> Option<String> {
    if let Some(p) = crate::core::config::chrome_executable_override() {
        return Some(p);
    }

    for exe in [
        "google-chrome",
        "google-chrome-stable",
        "chromium",
        "chromium-browser",
        "chrome",
        "brave-browser",
    ] {
        if let Ok(path) = which::which(exe) {
            return Some(path.to_string_lossy().to_string());
        }
    }

    #[cfg(target_os = "macos")]
    let candidates: &[&str] = &[
        "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
        "/Applications/Chromium.app/Contents/MacOS/Chromium",
        "/Applications/Brave Browser.app/Contents/MacOS/Brave Browser",
    ];

    #[cfg(target_os = "windows")]
    let candidates: &[&str] = &[
        r"C:\Program Files\Google\Chrome\Application\chrome.exe",
        r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
        r"C:\Program Files\BraveSoftware\Brave-Browser\Application\brave.exe",
    ];

    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    let candidates: &[&str] = &[
        "/usr/bin/google-chrome",
        "/usr/bin/chromium",
        "/usr/bin/chromium-browser",
        "/snap/bin/chromium",
        "/usr/local/bin/chromium",
    ];

    candidates
        .iter()
        .find(|c| Path::new(c).exists())
        .map(|c| c.to_string())
}

pub fn native_browser_available() -> bool {
    find_chrome_executable().is_some()
}

// ── Headless browser config builder ──────────────────────────────────────────

/// Build a `BrowserConfig` for unattended headless scraping.
///
/// * `--no-sandbox` / `--disable-dev-shm-usage` / `--no-zygote` for containers and CI.
/// * Same-origin and site isolation off so cross-origin review iframes render inline.
/// * Large desktop viewport so responsive themes render their desktop review widget.
pub fn build_headless_config(exe: &str, settings: &BrowserSettings) -> Result<BrowserConfig> {
    let (width, height) = (settings.viewport_width, settings.viewport_height);

    BrowserConfig::builder()
        .chrome_executable(exe)
        .viewport(Viewport {
            width,
            height,
            device_scale_factor: Some(1.0),
            emulating_mobile: false,
            is_landscape: true,
            has_touch: false,
        })
        .window_size(width, height)
        .launch_timeout(settings.launch_timeout)
        .request_timeout(settings.request_timeout)
        .arg("--no-sandbox")
        .arg("--disable-setuid-sandbox")
        .arg("--disable-web-security")
        .arg("--disable-features=IsolateOrigins")
        .arg("--disable-site-isolation-trials")
        .arg("--disable-dev-shm-usage")
        .arg("--no-zygote")
        .arg("--disable-gpu")
        .arg("--no-first-run")
        .arg("--no-default-browser-check")
        .arg("--mute-audio")
        .arg(format!("--window-size={},{}", width, height))
        .build()
        .map_err(|e| anyhow!("Failed to build browser config: {}", e))
}

// ── Resource blocking ────────────────────────────────────────────────────────

const TRACKER_PATTERNS: &[&str] = &[
    "doubleclick.net",
    "googlesyndication.com",
    "googletagservices.com",
    "adservice.google.",
    "amazon-adsystem.com",
    "criteo.com",
    "taboola.com",
    "outbrain.com",
    "moatads.com",
    "adnxs.com",
    "google-analytics.com",
    "analytics.google.com",
    "hotjar.com",
    "mouseflow.com",
    "fullstory.com",
    "connect.facebook.net",
];

static TRACKER_MATCHER: OnceLock<Option<AhoCorasick>> = OnceLock::new();

fn tracker_matcher() -> Option<&'static AhoCorasick> {
    TRACKER_MATCHER
        .get_or_init(|| match AhoCorasick::new(TRACKER_PATTERNS) {
            Ok(m) => Some(m),
            Err(e) => {
                warn!("tracker matcher unavailable: {}", e);
                None
            }
        })
        .as_ref()
}

/// Resource types that never carry review text.
pub fn should_block_resource_type(resource_type: &ResourceType) -> bool {
    matches!(
        resource_type,
        ResourceType::Image | ResourceType::Stylesheet | ResourceType::Font | ResourceType::Media
    )
}

/// `true` when `url` points at a known ad/analytics host.
pub fn is_tracker_url(url: &str) -> bool {
    tracker_matcher().is_some_and(|m| m.is_match(url))
}

/// Intercept every request on `page`, failing the blocked ones and letting the
/// rest through. Runs until the page goes away or the task is aborted.
async fn install_request_filter(page: &Page, block_trackers: bool) -> Result<JoinHandle<()>> {
    let mut paused = page
        .event_listener::<EventRequestPaused>()
        .await
        .map_err(|e| anyhow!("Failed to subscribe to paused requests: {}", e))?;

    page.execute(EnableParams::default())
        .await
        .map_err(|e| anyhow!("Failed to enable request interception: {}", e))?;

    let page = page.clone();
    Ok(tokio::spawn(async move {
        while let Some(event) = paused.next().await {
            let blocked = should_block_resource_type(&event.resource_type)
                || (block_trackers && is_tracker_url(&event.request.url));

            let outcome = if blocked {
                page.execute(FailRequestParams::new(
                    event.request_id.clone(),
                    ErrorReason::BlockedByClient,
                ))
                .await
                .map(|_| ())
            } else {
                page.execute(ContinueRequestParams::new(event.request_id.clone()))
                    .await
                    .map(|_| ())
            };

            if let Err(e) = outcome {
                debug!("request filter: {} ({})", e, event.request.url);
            }
        }
    }))
}

// ── Load-condition waits ─────────────────────────────────────────────────────

async fn ready_state(page: &Page) -> Option<String> {
    page.evaluate("document.readyState")
        .await
        .ok()
        .and_then(|v| v.into_value::<String>().ok())
}

async fn resource_count(page: &Page) -> u64 {
    page.evaluate("performance.getEntriesByType('resource').length")
        .await
        .ok()
        .and_then(|v| v.into_value::<u64>().ok())
        .unwrap_or(0)
}

/// Poll `document.readyState` until it is one of `accepted`. Unbounded; the
/// navigation executor owns the timeout.
async fn wait_for_ready_state(page: &Page, accepted: &[&str]) {
    loop {
        if let Some(state) = ready_state(page).await {
            if accepted.contains(&state.as_str()) {
                return;
            }
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

/// Playwright-style network idle: the document is complete and the number of
/// `performance` resource entries has not changed for `quiet`.
async fn wait_for_network_idle(page: &Page, quiet: Duration) {
    wait_for_ready_state(page, &["complete"]).await;

    let start = Instant::now();
    let mut last_count = resource_count(page).await;
    let mut stable_since = Instant::now();

    loop {
        tokio::time::sleep(POLL_INTERVAL.min(quiet)).await;
        let count = resource_count(page).await;
        if count != last_count {
            last_count = count;
            stable_since = Instant::now();
        } else if stable_since.elapsed() >= quiet {
            info!(
                "network idle after {}ms ({} resources)",
                start.elapsed().as_millis(),
                count
            );
            return;
        }
    }
}

/// `true` when Chrome replaced the document with its own error page.
async fn is_error_page(page: &Page) -> bool {
    page.evaluate("document.URL")
        .await
        .ok()
        .and_then(|v| v.into_value::<String>().ok())
        .is_some_and(|u| u.starts_with("chrome-error://"))
}

/// Runs one navigation until `lifecycle` (the awaited page event) resolves.
///
/// `navigate` yields the `Page.navigate` reply's `errorText`. chromiumoxide
/// holds that reply until the `load` event, so for earlier conditions the
/// lifecycle event wins and the reply is dropped. Error pages fire lifecycle
/// events too; if the page landed on one, the reply is awaited for the reason.
async fn drive_navigation<N, L, E, F>(navigate: N, lifecycle: L, landed_on_error_page: E) -> Result<()>
where
    N: Future<Output = Result<Option<String>>>,
    L: Future<Output = Result<()>>,
    E: FnOnce() -> F,
    F: Future<Output = bool>,
{
    tokio::pin!(navigate);
    tokio::pin!(lifecycle);

    tokio::select! {
        biased;
        reply = &mut navigate => {
            if let Some(error_text) = reply? {
                bail!("{}", error_text);
            }
            return lifecycle.await;
        }
        reached = &mut lifecycle => reached?,
    }

    if landed_on_error_page().await {
        return match navigate.await? {
            Some(error_text) => Err(anyhow!("{}", error_text)),
            None => Err(anyhow!("net::ERR_FAILED")),
        };
    }
    Ok(())
}

// ── Chromium-backed session ──────────────────────────────────────────────────

/// Launches a fresh, isolated browser process for every session.
pub struct ChromiumLauncher {
    settings: BrowserSettings,
}

impl ChromiumLauncher {
    pub fn new(settings: BrowserSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &BrowserSettings {
        &self.settings
    }
}

#[async_trait]
impl SessionLauncher for ChromiumLauncher {
    async fn acquire(&self) -> Result<Box<dyn BrowserSession>> {
        let exe = self
            .settings
            .executable
            .clone()
            .or_else(find_chrome_executable)
            .ok_or_else(|| anyhow!("No browser found. Install Chrome or Chromium, or set CHROME_EXECUTABLE."))?;

        info!("🚀 Launching headless browser ({})", exe);
        let config = build_headless_config(&exe, &self.settings)?;

        let (mut browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| anyhow!("Failed to launch browser ({}): {}", exe, e))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("CDP handler error: {}", e);
                }
            }
        });

        match open_page(&browser, &self.settings).await {
            Ok((page, request_filter)) => Ok(Box::new(ChromiumSession {
                browser: Mutex::new(browser),
                page,
                handler_task,
                request_filter,
            })),
            Err(e) => {
                // The process is already running; don't leak it.
                if let Err(close_err) = browser.close().await {
                    warn!("Browser close error (non-fatal): {}", close_err);
                }
                browser.wait().await.ok();
                handler_task.abort();
                Err(e)
            }
        }
    }
}

async fn open_page(browser: &Browser, settings: &BrowserSettings) -> Result<(Page, JoinHandle<()>)> {
    let page = browser
        .new_page("about:blank")
        .await
        .map_err(|e| anyhow!("Failed to open page: {}", e))?;

    page.set_user_agent(settings.user_agent.as_str())
        .await
        .map_err(|e| anyhow!("Failed to set user agent: {}", e))?;

    let request_filter = install_request_filter(&page, settings.block_trackers).await?;
    Ok((page, request_filter))
}

pub struct ChromiumSession {
    browser: Mutex<Browser>,
    page: Page,
    handler_task: JoinHandle<()>,
    request_filter: JoinHandle<()>,
}

#[async_trait]
impl BrowserSession for ChromiumSession {
    async fn goto(&self, url: &str, wait_until: WaitCondition) -> Result<()> {
        // Subscribe before navigating so the event cannot be missed.
        let page = &self.page;
        let lifecycle: BoxFuture<'_, Result<()>> = match wait_until {
            WaitCondition::DomContentLoaded => {
                let mut events = page
                    .event_listener::<EventDomContentEventFired>()
                    .await
                    .map_err(|e| anyhow!("Failed to subscribe to DOMContentLoaded: {}", e))?;
                async move {
                    events
                        .next()
                        .await
                        .map(|_| ())
                        .ok_or_else(|| anyhow!("page closed before DOMContentLoaded"))
                }
                .boxed()
            }
            WaitCondition::Load | WaitCondition::NetworkIdle => {
                let mut events = page
                    .event_listener::<EventLoadEventFired>()
                    .await
                    .map_err(|e| anyhow!("Failed to subscribe to load: {}", e))?;
                async move {
                    events
                        .next()
                        .await
                        .ok_or_else(|| anyhow!("page closed before load"))?;
                    if wait_until == WaitCondition::NetworkIdle {
                        wait_for_network_idle(page, NETWORK_IDLE_QUIET).await;
                    }
                    Ok::<(), anyhow::Error>(())
                }
                .boxed()
            }
        };

        let navigate = async {
            page.execute(NavigateParams::new(url))
                .await
                .map(|resp| resp.result.error_text)
                .map_err(anyhow::Error::from)
        };

        drive_navigation(navigate, lifecycle, || is_error_page(page))
            .await
            .map_err(|e| anyhow!("{} at {}", e, url))
    }

    async fn scroll_by(&self, distance: u32) -> Result<()> {
        self.page
            .evaluate(format!("window.scrollBy(0, {})", distance))
            .await
            .map_err(|e| anyhow!("scroll failed: {}", e))?;
        Ok(())
    }

    async fn scroll_height(&self) -> Result<u64> {
        self.page
            .evaluate("(document.body || document.documentElement).scrollHeight")
            .await
            .map_err(|e| anyhow!("scrollHeight unavailable: {}", e))?
            .into_value::<u64>()
            .map_err(|e| anyhow!("scrollHeight was not a number: {}", e))
    }

    async fn content(&self) -> Result<String> {
        self.page
            .content()
            .await
            .map_err(|e| anyhow!("Failed to get page content: {}", e))
    }

    async fn save_screenshot(&self, path: &Path) -> Result<()> {
        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .full_page(true)
            .build();
        self.page
            .save_screenshot(params, path)
            .await
            .map_err(|e| anyhow!("screenshot capture failed: {}", e))?;
        Ok(())
    }

    async fn release(self: Box<Self>) -> Result<()> {
        let ChromiumSession {
            browser,
            page,
            handler_task,
            request_filter,
        } = *self;

        request_filter.abort();
        drop(page);

        let mut browser = browser.into_inner();
        let closed = browser.close().await;
        browser.wait().await.ok();
        handler_task.abort();

        closed.map(|_| ()).map_err(|e| anyhow!("Browser close error: {}", e))
    }
}

use crate::extraction::catalog::{builtin_specs, SelectorBundleSpec};
use crate::scraping::browser_manager::{BrowserSettings, DEFAULT_USER_AGENT};
use crate::scraping::dynamic::SettleSettings;
use crate::scraping::navigation::{NavigationPlan, NavigationStrategy, DEFAULT_RETRY_BACKOFF};
use std::path::{Path, PathBuf};
use std::time::Duration;

// ---------------------------------------------------------------------------
// ReviewScraperConfig: file-based config loader (review-scraper.json) with env-var fallback
// ---------------------------------------------------------------------------

pub const ENV_CONFIG_PATH: &str = "REVIEW_SCRAPER_CONFIG";
pub const ENV_PORT: &str = "PORT";
pub const ENV_CHROME_EXECUTABLE: &str = "CHROME_EXECUTABLE";
pub const ENV_USER_AGENT: &str = "REVIEW_SCRAPER_USER_AGENT";
pub const ENV_SCREENSHOT_PATH: &str = "REVIEW_SCRAPER_SCREENSHOT_PATH";
pub const ENV_MAX_CONCURRENT_SCRAPES: &str = "MAX_CONCURRENT_SCRAPES";
pub const ENV_RUNTIME_ENV: &str = "REVIEW_SCRAPER_ENV";

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_MAX_CONCURRENT_SCRAPES: usize = 8;
pub const DEFAULT_SCREENSHOT_PATH: &str = "error-screenshot.png";

fn env_nonempty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// HTTP server sub-config (`server` key).
#[derive(serde::Deserialize, Default, Clone, Debug)]
#[serde(default)]
pub struct ServerConfig {
    pub port: Option<u16>,
    /// Admission limit for simultaneous scrapes (each one is a browser process).
    pub max_concurrent_scrapes: Option<usize>,
    /// Include underlying error text in error responses.
    pub development: Option<bool>,
}

impl ServerConfig {
    /// Port: JSON field → `PORT` env var → 3000. A `--port` flag is applied by `main`.
    pub fn resolve_port(&self) -> u16 {
        self.port
            .or_else(|| env_nonempty(ENV_PORT).and_then(|v| v.parse().ok()))
            .unwrap_or(DEFAULT_PORT)
    }

    /// JSON field → `MAX_CONCURRENT_SCRAPES` → 8. Zero is treated as one.
    pub fn resolve_max_concurrent_scrapes(&self) -> usize {
        self.max_concurrent_scrapes
            .or_else(|| env_nonempty(ENV_MAX_CONCURRENT_SCRAPES).and_then(|v| v.parse().ok()))
            .unwrap_or(DEFAULT_MAX_CONCURRENT_SCRAPES)
            .max(1)
    }

    /// JSON field → `REVIEW_SCRAPER_ENV=development` → `false`.
    pub fn resolve_development(&self) -> bool {
        if let Some(b) = self.development {
            return b;
        }
        env_nonempty(ENV_RUNTIME_ENV)
            .map(|v| v.eq_ignore_ascii_case("development"))
            .unwrap_or(false)
    }
}

/// Browser sub-config (`browser` key).
#[derive(serde::Deserialize, Default, Clone, Debug)]
#[serde(default)]
pub struct BrowserFileConfig {
    pub chrome_executable: Option<String>,
    pub user_agent: Option<String>,
    pub viewport_width: Option<u32>,
    pub viewport_height: Option<u32>,
    pub launch_timeout_ms: Option<u64>,
    pub default_timeout_ms: Option<u64>,
    pub block_trackers: Option<bool>,
}

impl BrowserFileConfig {
    pub fn resolve(&self) -> BrowserSettings {
        let defaults = BrowserSettings::default();
        BrowserSettings {
            executable: self
                .chrome_executable
                .clone()
                .filter(|p| !p.trim().is_empty())
                .or_else(chrome_executable_override),
            user_agent: self
                .user_agent
                .clone()
                .or_else(|| env_nonempty(ENV_USER_AGENT))
                .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
            viewport_width: self.viewport_width.unwrap_or(defaults.viewport_width),
            viewport_height: self.viewport_height.unwrap_or(defaults.viewport_height),
            launch_timeout: self
                .launch_timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.launch_timeout),
            request_timeout: self
                .default_timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.request_timeout),
            block_trackers: self.block_trackers.unwrap_or(defaults.block_trackers),
        }
    }
}

/// Navigation sub-config (`navigation` key).
#[derive(serde::Deserialize, Default, Clone, Debug)]
#[serde(default)]
pub struct NavigationFileConfig {
    pub strategies: Option<Vec<NavigationStrategy>>,
    pub retry_backoff_ms: Option<u64>,
}

impl NavigationFileConfig {
    pub fn resolve(&self) -> NavigationPlan {
        let defaults = NavigationPlan::default();
        NavigationPlan {
            strategies: self.strategies.clone().unwrap_or(defaults.strategies),
            retry_backoff: self
                .retry_backoff_ms
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_RETRY_BACKOFF),
        }
    }
}

/// Scroll/settle sub-config (`settle` key).
#[derive(serde::Deserialize, Default, Clone, Debug)]
#[serde(default)]
pub struct SettleFileConfig {
    pub initial_delay_ms: Option<u64>,
    pub scroll_step: Option<u32>,
    pub scroll_interval_ms: Option<u64>,
    pub final_delay_ms: Option<u64>,
    pub max_scroll_steps: Option<u32>,
}

impl SettleFileConfig {
    pub fn resolve(&self) -> SettleSettings {
        let d = SettleSettings::default();
        SettleSettings {
            initial_delay: self.initial_delay_ms.map(Duration::from_millis).unwrap_or(d.initial_delay),
            scroll_step: self.scroll_step.unwrap_or(d.scroll_step),
            scroll_interval: self
                .scroll_interval_ms
                .map(Duration::from_millis)
                .unwrap_or(d.scroll_interval),
            final_delay: self.final_delay_ms.map(Duration::from_millis).unwrap_or(d.final_delay),
            max_scroll_steps: self.max_scroll_steps.unwrap_or(d.max_scroll_steps),
        }
    }
}

/// Top-level config loaded from `review-scraper.json`.
#[derive(serde::Deserialize, Default, Clone, Debug)]
#[serde(default)]
pub struct ReviewScraperConfig {
    pub server: ServerConfig,
    pub browser: BrowserFileConfig,
    pub navigation: NavigationFileConfig,
    pub settle: SettleFileConfig,
    /// Where the failure screenshot goes. An empty string disables it.
    pub screenshot_path: Option<String>,
    /// Replaces the built-in platform catalog, in priority order.
    pub platforms: Option<Vec<SelectorBundleSpec>>,
}

impl ReviewScraperConfig {
    /// JSON field → `REVIEW_SCRAPER_SCREENSHOT_PATH` → `error-screenshot.png`.
    pub fn resolve_screenshot_path(&self) -> Option<PathBuf> {
        let raw = self
            .screenshot_path
            .clone()
            .or_else(|| std::env::var(ENV_SCREENSHOT_PATH).ok())
            .unwrap_or_else(|| DEFAULT_SCREENSHOT_PATH.to_string());
        let raw = raw.trim();
        if raw.is_empty() {
            None
        } else {
            Some(PathBuf::from(raw))
        }
    }

    pub fn resolve_platforms(&self) -> Vec<SelectorBundleSpec> {
        self.platforms.clone().unwrap_or_else(builtin_specs)
    }
}

pub fn parse_config(contents: &str) -> Result<ReviewScraperConfig, serde_json::Error> {
    serde_json::from_str(contents)
}

/// Load `review-scraper.json` from standard locations.
///
/// Search order (first found wins):
/// 1. `REVIEW_SCRAPER_CONFIG` env var path
/// 2. `./review-scraper.json`
/// 3. `../review-scraper.json`
///
/// Missing file → defaults (all env-var fallbacks apply).
/// Parse error → log a warning, return defaults.
pub fn load_config() -> ReviewScraperConfig {
    let mut candidates = vec![
        PathBuf::from("review-scraper.json"),
        PathBuf::from("../review-scraper.json"),
    ];
    if let Some(env_path) = env_nonempty(ENV_CONFIG_PATH) {
        candidates.insert(0, PathBuf::from(env_path));
    }

    for path in &candidates {
        let Ok(contents) = std::fs::read_to_string(path) else {
            continue;
        };
        return match parse_config(&contents) {
            Ok(cfg) => {
                tracing::info!("review-scraper.json loaded from {}", path.display());
                cfg
            }
            Err(e) => {
                tracing::warn!(
                    "review-scraper.json parse error at {}: {} (using defaults)",
                    path.display(),
                    e
                );
                ReviewScraperConfig::default()
            }
        };
    }

    ReviewScraperConfig::default()
}

/// `CHROME_EXECUTABLE`, if set to an existing path.
pub fn chrome_executable_override() -> Option<String> {
    let p = env_nonempty(ENV_CHROME_EXECUTABLE)?;
    if Path::new(&p).exists() {
        Some(p)
    } else {
        None
    }
}

use super::navigation::WaitCondition;
use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;

/// One browser process with one open page, owned by a single request.
///
/// Implementations must tolerate `release` being the only call after a failed
/// operation. Timeouts are enforced by callers, not by `goto`.
#[async_trait]
pub trait BrowserSession: Send + Sync {
    /// Navigate and wait until `wait_until` is reached.
    async fn goto(&self, url: &str, wait_until: WaitCondition) -> Result<()>;
    /// Scroll the viewport down by `distance` CSS pixels.
    async fn scroll_by(&self, distance: u32) -> Result<()>;
    /// Current scrollable height of the document.
    async fn scroll_height(&self) -> Result<u64>;
    /// Serialized DOM of the current page.
    async fn content(&self) -> Result<String>;
    /// Full-page PNG written to `path`.
    async fn save_screenshot(&self, path: &Path) -> Result<()>;
    /// Close the page and terminate the browser process.
    async fn release(self: Box<Self>) -> Result<()>;
}

#[async_trait]
pub trait SessionLauncher: Send + Sync {
    async fn acquire(&self) -> Result<Box<dyn BrowserSession>>;
}

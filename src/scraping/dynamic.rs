//! Scroll-to-bottom pass that makes lazy review widgets render.

use super::session::BrowserSession;
use anyhow::Result;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettleSettings {
    /// Pause after navigation before scrolling starts.
    pub initial_delay: Duration,
    /// Pixels per scroll step.
    pub scroll_step: u32,
    pub scroll_interval: Duration,
    /// Pause after reaching the bottom.
    pub final_delay: Duration,
    /// Upper bound on steps, for pages that keep growing as you scroll.
    pub max_scroll_steps: u32,
}

impl Default for SettleSettings {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(3000),
            scroll_step: 100,
            scroll_interval: Duration::from_millis(100),
            final_delay: Duration::from_millis(2000),
            max_scroll_steps: 500,
        }
    }
}

impl SettleSettings {
    /// No waiting at all; used for static fixtures.
    pub fn immediate() -> Self {
        Self {
            initial_delay: Duration::ZERO,
            scroll_interval: Duration::ZERO,
            final_delay: Duration::ZERO,
            ..Self::default()
        }
    }
}

/// Wait, scroll to the bottom, wait again. Never fails: scroll errors are
/// logged and extraction continues with whatever has rendered.
pub async fn settle(session: &dyn BrowserSession, settings: &SettleSettings) {
    tokio::time::sleep(settings.initial_delay).await;

    match scroll_to_bottom(session, settings).await {
        Ok(steps) => info!("auto_scroll: reached bottom after {} steps", steps),
        Err(e) => warn!("auto_scroll: stopped early (non-fatal): {}", e),
    }

    tokio::time::sleep(settings.final_delay).await;
}

async fn scroll_to_bottom(session: &dyn BrowserSession, settings: &SettleSettings) -> Result<u32> {
    let step = settings.scroll_step.max(1);
    let mut scrolled: u64 = 0;
    let mut steps = 0u32;

    loop {
        tokio::time::sleep(settings.scroll_interval).await;
        session.scroll_by(step).await?;
        scrolled += u64::from(step);
        steps += 1;

        if scrolled >= session.scroll_height().await? {
            return Ok(steps);
        }
        if steps >= settings.max_scroll_steps {
            warn!(
                "auto_scroll: step cap {} hit at {}px",
                settings.max_scroll_steps, scrolled
            );
            return Ok(steps);
        }
    }
}

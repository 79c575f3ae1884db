//! Page loading with progressively more patient completion conditions.
//!
//! Cheap conditions go first so simple pages don't pay a network-idle wait;
//! script-heavy pages still get up to 60 s under the last strategy.

use super::session::BrowserSession;
use crate::core::error::ScrapeError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::{info, warn};

pub const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_millis(2000);

/// Quiet window used by the network-idle condition.
pub const NETWORK_IDLE_QUIET: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WaitCondition {
    /// `DOMContentLoaded`: the document is parsed.
    #[serde(rename = "domcontentloaded")]
    DomContentLoaded,
    /// `load`: every sub-resource finished.
    #[serde(rename = "load")]
    Load,
    /// No new network activity for [`NETWORK_IDLE_QUIET`].
    #[serde(rename = "networkidle", alias = "networkidle0")]
    NetworkIdle,
}

impl fmt::Display for WaitCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            WaitCondition::DomContentLoaded => "domcontentloaded",
            WaitCondition::Load => "load",
            WaitCondition::NetworkIdle => "networkidle",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationStrategy {
    pub wait_until: WaitCondition,
    pub timeout_ms: u64,
}

impl NavigationStrategy {
    pub const fn new(wait_until: WaitCondition, timeout_ms: u64) -> Self {
        Self {
            wait_until,
            timeout_ms,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

pub const DEFAULT_STRATEGIES: [NavigationStrategy; 3] = [
    NavigationStrategy::new(WaitCondition::DomContentLoaded, 30_000),
    NavigationStrategy::new(WaitCondition::Load, 45_000),
    NavigationStrategy::new(WaitCondition::NetworkIdle, 60_000),
];

/// Ordered strategies plus the pause between failed attempts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationPlan {
    pub strategies: Vec<NavigationStrategy>,
    pub retry_backoff: Duration,
}

impl Default for NavigationPlan {
    fn default() -> Self {
        Self {
            strategies: DEFAULT_STRATEGIES.to_vec(),
            retry_backoff: DEFAULT_RETRY_BACKOFF,
        }
    }
}

/// Load `url`, trying each strategy in order until one succeeds.
///
/// A failed attempt is logged and followed by `retry_backoff` before the next
/// strategy. There is no backoff after the last strategy: the failure is
/// returned at once. When every strategy fails the last error message is
/// returned in [`ScrapeError::NavigationFailed`].
pub async fn load(
    session: &dyn BrowserSession,
    url: &str,
    plan: &NavigationPlan,
) -> Result<(), ScrapeError> {
    let mut last_error = String::from("no navigation strategies configured");

    for (i, strategy) in plan.strategies.iter().enumerate() {
        info!("Trying navigation with strategy: {}", strategy.wait_until);

        let attempt =
            tokio::time::timeout(strategy.timeout(), session.goto(url, strategy.wait_until)).await;

        match attempt {
            Ok(Ok(())) => {
                info!("Page loaded ({}): {}", strategy.wait_until, url);
                return Ok(());
            }
            Ok(Err(e)) => last_error = e.to_string(),
            Err(_) => {
                last_error = format!(
                    "Navigation timeout of {} ms exceeded ({})",
                    strategy.timeout_ms, strategy.wait_until
                )
            }
        }

        warn!(
            "Navigation failed with {}: {}",
            strategy.wait_until, last_error
        );

        if i + 1 < plan.strategies.len() {
            tokio::time::sleep(plan.retry_backoff).await;
        }
    }

    Err(ScrapeError::NavigationFailed {
        message: last_error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use std::path::Path;
    use std::sync::Mutex;

    /// Fails or hangs per wait condition and records every attempt.
    struct ScriptedSession {
        succeed_on: Option<WaitCondition>,
        hang: bool,
        attempts: Mutex<Vec<WaitCondition>>,
    }

    impl ScriptedSession {
        fn new(succeed_on: Option<WaitCondition>) -> Self {
            Self {
                succeed_on,
                hang: false,
                attempts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl BrowserSession for ScriptedSession {
        async fn goto(&self, _url: &str, wait_until: WaitCondition) -> Result<()> {
            self.attempts.lock().unwrap().push(wait_until);
            if self.succeed_on == Some(wait_until) {
                return Ok(());
            }
            if self.hang {
                futures::future::pending::<()>().await;
            }
            Err(anyhow!("net::ERR_CONNECTION_REFUSED at {}", wait_until))
        }
        async fn scroll_by(&self, _distance: u32) -> Result<()> {
            Ok(())
        }
        async fn scroll_height(&self) -> Result<u64> {
            Ok(0)
        }
        async fn content(&self) -> Result<String> {
            Ok(String::new())
        }
        async fn save_screenshot(&self, _path: &Path) -> Result<()> {
            Ok(())
        }
        async fn release(self: Box<Self>) -> Result<()> {
            Ok(())
        }
    }

    fn fast_plan() -> NavigationPlan {
        NavigationPlan {
            strategies: vec![
                NavigationStrategy::new(WaitCondition::DomContentLoaded, 50),
                NavigationStrategy::new(WaitCondition::Load, 50),
                NavigationStrategy::new(WaitCondition::NetworkIdle, 50),
            ],
            retry_backoff: Duration::ZERO,
        }
    }

    #[test]
    fn default_strategies_escalate_patience() {
        let plan = NavigationPlan::default();
        let timeouts: Vec<u64> = plan.strategies.iter().map(|s| s.timeout_ms).collect();
        assert_eq!(timeouts, vec![30_000, 45_000, 60_000]);
        assert_eq!(plan.retry_backoff, Duration::from_secs(2));
    }

    #[test]
    fn wait_condition_wire_names() {
        let s: NavigationStrategy =
            serde_json::from_str(r#"{"wait_until":"networkidle0","timeout_ms":100}"#).unwrap();
        assert_eq!(s.wait_until, WaitCondition::NetworkIdle);
        assert_eq!(
            serde_json::to_string(&WaitCondition::DomContentLoaded).unwrap(),
            "\"domcontentloaded\""
        );
    }

    #[tokio::test]
    async fn stops_at_first_success() {
        let session = ScriptedSession::new(Some(WaitCondition::Load));
        tokio_test::assert_ok!(load(&session, "https://shop.test/p", &fast_plan()).await);
        assert_eq!(
            *session.attempts.lock().unwrap(),
            vec![WaitCondition::DomContentLoaded, WaitCondition::Load]
        );
    }

    #[tokio::test]
    async fn all_failures_carry_last_message() {
        let session = ScriptedSession::new(None);
        let err = load(&session, "https://shop.test/p", &fast_plan())
            .await
            .unwrap_err();
        assert_eq!(session.attempts.lock().unwrap().len(), 3);
        match err {
            ScrapeError::NavigationFailed { message } => {
                assert_eq!(message, "net::ERR_CONNECTION_REFUSED at networkidle")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn hung_navigation_times_out() {
        let mut session = ScriptedSession::new(None);
        session.hang = true;
        let err = load(&session, "https://slow.test/", &fast_plan())
            .await
            .unwrap_err();
        assert!(err.is_navigation_timeout(), "{err}");
    }

    #[tokio::test]
    async fn no_backoff_after_final_strategy() {
        let session = ScriptedSession::new(None);
        let plan = NavigationPlan {
            strategies: vec![NavigationStrategy::new(WaitCondition::Load, 50)],
            retry_backoff: Duration::from_secs(10),
        };
        let outcome =
            tokio::time::timeout(Duration::from_secs(1), load(&session, "https://shop.test/", &plan))
                .await
                .expect("failure returned without sleeping the backoff");
        tokio_test::assert_err!(outcome);
        assert_eq!(session.attempts.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn empty_plan_fails() {
        let session = ScriptedSession::new(Some(WaitCondition::Load));
        let plan = NavigationPlan {
            strategies: vec![],
            retry_backoff: Duration::ZERO,
        };
        tokio_test::assert_err!(load(&session, "https://shop.test/", &plan).await);
        assert!(session.attempts.lock().unwrap().is_empty());
    }
}

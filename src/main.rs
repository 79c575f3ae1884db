use review_scraper::core::config::{self, ReviewScraperConfig};
use review_scraper::extraction::SelectorCatalog;
use review_scraper::scraping::browser_manager::{self, ChromiumLauncher};
use review_scraper::{api, AppState, ReviewScraper};
use std::sync::Arc;
use tracing::{info, warn};

fn parse_port_from_args() -> Option<u16> {
    let mut args = std::env::args().peekable();
    while let Some(a) = args.next() {
        if a == "--port" {
            if let Some(v) = args.next() {
                if let Ok(p) = v.parse::<u16>() {
                    return Some(p);
                }
            }
        } else if let Some(rest) = a.strip_prefix("--port=") {
            if let Ok(p) = rest.parse::<u16>() {
                return Some(p);
            }
        }
    }
    None
}

fn build_scraper(cfg: &ReviewScraperConfig) -> anyhow::Result<ReviewScraper> {
    let catalog = SelectorCatalog::from_specs(&cfg.resolve_platforms())?;
    info!(
        "Selector catalog: {}",
        catalog.platforms().collect::<Vec<_>>().join(" → ")
    );

    let browser = cfg.browser.resolve();
    if browser.executable.is_none() && !browser_manager::native_browser_available() {
        warn!("No Chrome/Chromium found on this machine; /api/reviews will fail until one is installed or CHROME_EXECUTABLE is set");
    }

    Ok(
        ReviewScraper::new(Arc::new(ChromiumLauncher::new(browser)), Arc::new(catalog))
            .with_navigation(cfg.navigation.resolve())
            .with_settle(cfg.settle.resolve())
            .with_screenshot_path(cfg.resolve_screenshot_path()),
    )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=warn"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cfg = config::load_config();
    let scraper = build_scraper(&cfg)?;

    let state = Arc::new(
        AppState::new(scraper, cfg.server.resolve_max_concurrent_scrapes())
            .with_development(cfg.server.resolve_development()),
    );
    let app = api::router(state.clone());

    let port = parse_port_from_args().unwrap_or_else(|| cfg.server.resolve_port());
    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = match tokio::net::TcpListener::bind(&bind_addr).await {
        Ok(l) => l,
        Err(e) if e.kind() == std::io::ErrorKind::AddrInUse => {
            anyhow::bail!(
                "Address already in use: {}. Stop the existing process or run with --port {} (or set PORT).",
                bind_addr,
                port.saturating_add(1)
            )
        }
        Err(e) => return Err(e.into()),
    };

    info!("Server running at http://localhost:{}", port);
    info!("Health check: http://localhost:{}/health", port);
    info!("Reviews endpoint: http://localhost:{}/api/reviews?page=<url>", port);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            state.close_admission();
        })
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate()).ok();

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = async {
                if let Some(ref mut s) = sigterm {
                    s.recv().await;
                } else {
                    futures::future::pending::<()>().await;
                }
            } => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }

    info!("Shutting down; in-flight scrapes release their browsers as they finish");
}

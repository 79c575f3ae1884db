pub mod api;
pub mod core;
pub mod extraction;
pub mod scraping;
pub mod tools;

// --- Primary core exports ---
pub use core::error::{ScrapeError, SelectorError};
pub use core::types;
pub use core::types::*;
pub use core::AppState;

pub use extraction::{ReviewSource, SelectorCatalog};
pub use scraping::{BrowserSession, SessionLauncher};
pub use tools::ReviewScraper;

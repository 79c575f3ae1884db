pub mod reviews;

pub use reviews::ReviewScraper;

//! Review extraction over a DOM snapshot.
//!
//! Selector resolution runs in Rust over `scraper::Html`; the browser only
//! hands back the rendered document.

pub mod catalog;
pub mod extractor;
pub mod rating;

pub use catalog::{SelectorBundle, SelectorBundleSpec, SelectorCatalog, SelectorSpec};
pub use extractor::{extract, extract_generic, extract_reviews, Extraction, ReviewSource};

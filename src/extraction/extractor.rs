use super::catalog::{SelectorBundle, SelectorCatalog};
use super::rating::normalize_rating;
use crate::core::types::{ReviewRecord, DEFAULT_RATING, DEFAULT_REVIEWER, DEFAULT_REVIEW_TITLE};
use scraper::{ElementRef, Html};
use tracing::{debug, info};

/// Minimum trimmed length (in characters) for the generic fallback to keep an element.
pub const GENERIC_MIN_CHARS: usize = 20;

const GENERIC_KEYWORDS: [&str; 2] = ["review", "rating"];

/// Where a set of reviews came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewSource {
    /// A catalog bundle matched; holds the platform name.
    Platform(String),
    /// No bundle matched; the keyword scan ran instead.
    GenericFallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub reviews: Vec<ReviewRecord>,
    pub source: ReviewSource,
}

/// Trimmed text content of an element, `None` when blank.
fn trimmed_text(el: ElementRef<'_>) -> Option<String> {
    let text = el.text().collect::<String>();
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn rating_of(container: ElementRef<'_>, bundle: &SelectorBundle) -> u8 {
    let Some(el) = bundle.rating.select_first(container) else {
        return DEFAULT_RATING;
    };

    let attrs = ["data-rating", "data-score"];
    let raw = attrs
        .iter()
        .filter_map(|a| el.value().attr(a))
        .find(|v| !v.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| el.text().collect::<String>());

    if raw.is_empty() {
        return DEFAULT_RATING;
    }
    normalize_rating(&raw)
}

fn record_from_container(container: ElementRef<'_>, bundle: &SelectorBundle) -> Option<ReviewRecord> {
    let body = bundle
        .review_text
        .select_first(container)
        .and_then(trimmed_text)?;

    let title = bundle
        .review_title
        .select_first(container)
        .and_then(trimmed_text)
        .unwrap_or_else(|| DEFAULT_REVIEW_TITLE.to_string());

    let reviewer = bundle
        .author
        .select_first(container)
        .and_then(trimmed_text)
        .unwrap_or_else(|| DEFAULT_REVIEWER.to_string());

    Some(ReviewRecord {
        title,
        body,
        rating: rating_of(container, bundle),
        reviewer,
    })
}

/// Reviews readable with one bundle. Missing sub-elements fall back to
/// defaults; containers without body text are dropped.
pub fn extract(document: &Html, bundle: &SelectorBundle) -> Vec<ReviewRecord> {
    let containers = bundle.review_container.select_all(document);
    if containers.is_empty() {
        return Vec::new();
    }

    let found = containers.len();
    let reviews: Vec<ReviewRecord> = containers
        .into_iter()
        .filter_map(|c| record_from_container(c, bundle))
        .collect();

    debug!(
        "{}: {} containers, {} with body text",
        bundle.platform,
        found,
        reviews.len()
    );
    reviews
}

/// Last-resort scan: every element whose text mentions "review" or "rating"
/// and is longer than [`GENERIC_MIN_CHARS`] becomes a default-valued record.
///
/// Nested elements each qualify on their own, so one review typically shows up
/// several times (itself, its parents, `<body>`, `<html>`).
pub fn extract_generic(document: &Html) -> Vec<ReviewRecord> {
    document
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter_map(|el| {
            let text = el.text().collect::<String>();
            let lower = text.to_lowercase();
            if !GENERIC_KEYWORDS.iter().any(|k| lower.contains(k)) {
                return None;
            }
            let body = text.trim();
            (body.chars().count() > GENERIC_MIN_CHARS).then(|| ReviewRecord::with_body(body))
        })
        .collect()
}

/// Tries each bundle in catalog order and stops at the first that yields a
/// review; falls back to [`extract_generic`] when none does.
pub fn extract_reviews(html: &str, catalog: &SelectorCatalog) -> Extraction {
    let document = Html::parse_document(html);

    for bundle in catalog.bundles() {
        let reviews = extract(&document, bundle);
        if !reviews.is_empty() {
            info!(
                "Found {} reviews using {} selectors",
                reviews.len(),
                bundle.platform
            );
            return Extraction {
                reviews,
                source: ReviewSource::Platform(bundle.platform.clone()),
            };
        }
    }

    info!("No platform selectors matched, trying generic keyword scan");
    Extraction {
        reviews: extract_generic(&document),
        source: ReviewSource::GenericFallback,
    }
}

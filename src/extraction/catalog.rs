//! Selector catalog: the ordered list of review-widget platforms the
//! extractor knows about, plus the terminal `generic` bundle.
//!
//! Bundles are plain data (CSS selector strings). They are compiled into
//! `scraper::Selector`s once, when the catalog is built, so a bad selector in
//! `review-scraper.json` fails at startup rather than during a request.

use crate::core::error::SelectorError;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};

/// A single selector, or ordered alternatives where the first one that matches wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SelectorSpec {
    One(String),
    Any(Vec<String>),
}

impl SelectorSpec {
    fn alternatives(&self) -> Vec<&str> {
        match self {
            SelectorSpec::One(s) => vec![s.as_str()],
            SelectorSpec::Any(list) => list.iter().map(String::as_str).collect(),
        }
    }
}

impl From<&str> for SelectorSpec {
    fn from(s: &str) -> Self {
        SelectorSpec::One(s.to_string())
    }
}

impl From<&[&str]> for SelectorSpec {
    fn from(list: &[&str]) -> Self {
        SelectorSpec::Any(list.iter().map(|s| s.to_string()).collect())
    }
}

/// Uncompiled bundle, as written in the config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorBundleSpec {
    pub platform: String,
    #[serde(alias = "reviewContainer")]
    pub review_container: SelectorSpec,
    #[serde(alias = "reviewTitle")]
    pub review_title: SelectorSpec,
    #[serde(alias = "reviewText")]
    pub review_text: SelectorSpec,
    pub rating: SelectorSpec,
    pub author: SelectorSpec,
}

impl SelectorBundleSpec {
    pub fn new(
        platform: &str,
        review_container: impl Into<SelectorSpec>,
        review_title: impl Into<SelectorSpec>,
        review_text: impl Into<SelectorSpec>,
        rating: impl Into<SelectorSpec>,
        author: impl Into<SelectorSpec>,
    ) -> Self {
        Self {
            platform: platform.to_string(),
            review_container: review_container.into(),
            review_title: review_title.into(),
            review_text: review_text.into(),
            rating: rating.into(),
            author: author.into(),
        }
    }
}

/// Compiled selector alternatives for one bundle field.
#[derive(Debug, Clone)]
pub struct FieldSelector {
    alternatives: Vec<(String, Selector)>,
}

impl FieldSelector {
    fn compile(
        spec: &SelectorSpec,
        platform: &str,
        field: &'static str,
    ) -> Result<Self, SelectorError> {
        let sources = spec.alternatives();
        if sources.is_empty() {
            return Err(SelectorError::Empty {
                platform: platform.to_string(),
                field,
            });
        }

        let alternatives = sources
            .into_iter()
            .map(|source| {
                Selector::parse(source)
                    .map(|sel| (source.to_string(), sel))
                    .map_err(|_| SelectorError::Invalid {
                        platform: platform.to_string(),
                        selector: source.to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { alternatives })
    }

    /// Elements matched by the first alternative that matches anything in the document.
    pub fn select_all<'a>(&self, document: &'a Html) -> Vec<ElementRef<'a>> {
        for (_, selector) in &self.alternatives {
            let found: Vec<ElementRef<'a>> = document.select(selector).collect();
            if !found.is_empty() {
                return found;
            }
        }
        Vec::new()
    }

    /// First descendant of `scope` matched by the first alternative that matches inside it.
    pub fn select_first<'a>(&self, scope: ElementRef<'a>) -> Option<ElementRef<'a>> {
        self.alternatives
            .iter()
            .find_map(|(_, selector)| scope.select(selector).next())
    }

    pub fn sources(&self) -> impl Iterator<Item = &str> {
        self.alternatives.iter().map(|(s, _)| s.as_str())
    }
}

/// The five lookups needed to read one platform's reviews.
#[derive(Debug, Clone)]
pub struct SelectorBundle {
    pub platform: String,
    pub review_container: FieldSelector,
    pub review_title: FieldSelector,
    pub review_text: FieldSelector,
    pub rating: FieldSelector,
    pub author: FieldSelector,
}

impl SelectorBundle {
    pub fn compile(spec: &SelectorBundleSpec) -> Result<Self, SelectorError> {
        let p = spec.platform.as_str();
        Ok(Self {
            platform: spec.platform.clone(),
            review_container: FieldSelector::compile(&spec.review_container, p, "review_container")?,
            review_title: FieldSelector::compile(&spec.review_title, p, "review_title")?,
            review_text: FieldSelector::compile(&spec.review_text, p, "review_text")?,
            rating: FieldSelector::compile(&spec.rating, p, "rating")?,
            author: FieldSelector::compile(&spec.author, p, "author")?,
        })
    }
}

/// Ordered, immutable set of bundles. Injected into the orchestrator.
#[derive(Debug, Clone)]
pub struct SelectorCatalog {
    bundles: Vec<SelectorBundle>,
}

impl SelectorCatalog {
    pub fn from_specs(specs: &[SelectorBundleSpec]) -> Result<Self, SelectorError> {
        let bundles = specs
            .iter()
            .map(SelectorBundle::compile)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { bundles })
    }

    /// Yotpo, Shopify Product Reviews, Judge.me, then the generic class-name bundle.
    pub fn builtin() -> Self {
        // Built-in selectors are constant and covered by tests.
        Self::from_specs(&builtin_specs()).unwrap_or_else(|e| {
            tracing::error!("built-in selector catalog failed to compile: {}", e);
            Self { bundles: Vec::new() }
        })
    }

    pub fn bundles(&self) -> &[SelectorBundle] {
        &self.bundles
    }

    pub fn platforms(&self) -> impl Iterator<Item = &str> {
        self.bundles.iter().map(|b| b.platform.as_str())
    }

    pub fn len(&self) -> usize {
        self.bundles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bundles.is_empty()
    }
}

impl Default for SelectorCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

pub fn builtin_specs() -> Vec<SelectorBundleSpec> {
    vec![
        SelectorBundleSpec::new(
            "yotpo",
            ".yotpo-review",
            ".yotpo-review-title",
            ".content-review",
            ".yotpo-stars",
            ".yotpo-user-name",
        ),
        SelectorBundleSpec::new(
            "shopify",
            ".spr-review",
            ".spr-review-header-title",
            ".spr-review-content-body",
            ".spr-starrating",
            ".spr-review-header-byline",
        ),
        SelectorBundleSpec::new(
            "judgeme",
            ".jdgm-rev",
            ".jdgm-rev__title",
            ".jdgm-rev__body",
            ".jdgm-rev__rating",
            ".jdgm-rev__author",
        ),
        SelectorBundleSpec::new(
            "generic",
            &[
                ".review",
                "[data-review]",
                ".review-item",
                ".product-review",
                ".customer-review",
            ][..],
            &[".review-title", ".review-heading", "h3", ".title"][..],
            &[".review-content", ".review-text", ".review-body", "p"][..],
            &[".rating", ".stars", "[data-rating]", ".star-rating"][..],
            &[".reviewer", ".author", ".customer-name", ".review-author"][..],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_order() {
        let catalog = SelectorCatalog::builtin();
        let names: Vec<&str> = catalog.platforms().collect();
        assert_eq!(names, vec!["yotpo", "shopify", "judgeme", "generic"]);
    }

    #[test]
    fn builtin_specs_all_compile() {
        let catalog = SelectorCatalog::from_specs(&builtin_specs());
        assert!(catalog.is_ok());
        let catalog = catalog.unwrap();
        let generic = &catalog.bundles()[3];
        assert_eq!(generic.review_text.sources().count(), 4);
    }

    #[test]
    fn invalid_selector_is_reported() {
        let spec = SelectorBundleSpec::new("broken", "div[", ".t", ".b", ".r", ".a");
        let err = SelectorCatalog::from_specs(&[spec]).unwrap_err();
        assert_eq!(
            err,
            SelectorError::Invalid {
                platform: "broken".into(),
                selector: "div[".into()
            }
        );
    }

    #[test]
    fn empty_alternatives_are_rejected() {
        let mut spec = SelectorBundleSpec::new("empty", ".c", ".t", ".b", ".r", ".a");
        spec.author = SelectorSpec::Any(vec![]);
        let err = SelectorCatalog::from_specs(&[spec]).unwrap_err();
        assert!(matches!(err, SelectorError::Empty { field: "author", .. }));
    }

    #[test]
    fn spec_deserializes_string_or_list() {
        let json = r#"{
            "platform": "stamped",
            "reviewContainer": ".stamped-review",
            "review_title": [".stamped-review-header-title", "h3"],
            "review_text": ".stamped-review-content-body",
            "rating": ".stamped-starratings",
            "author": ".author"
        }"#;
        let spec: SelectorBundleSpec = serde_json::from_str(json).unwrap();
        assert_eq!(spec.review_container, SelectorSpec::One(".stamped-review".into()));
        assert_eq!(
            spec.review_title,
            SelectorSpec::Any(vec![".stamped-review-header-title".into(), "h3".into()])
        );
    }

    #[test]
    fn first_matching_alternative_wins_for_containers() {
        let html = Html::parse_document(
            r#"<div class="review-item">a</div><div class="customer-review">b</div>"#,
        );
        let field = FieldSelector::compile(
            &SelectorSpec::Any(vec![
                ".review".into(),
                ".customer-review".into(),
                ".review-item".into(),
            ]),
            "t",
            "review_container",
        )
        .unwrap();
        let found = field.select_all(&html);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].text().collect::<String>(), "b");
    }
}

// src/models/source.rs

//! Per-source configuration: where to search, how to parse results, and how
//! to pull content out of the markup.

use serde::{Deserialize, Serialize};

use crate::models::SourceType;

/// One origin of content with its own pagination and markup quirks.
///
/// A source is either search-driven (`search` present) or a fixed URL
/// catalog (`urls` non-empty); `Config::validate` rejects anything else.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Unique source identifier
    pub id: String,

    /// Platform display name written into records
    pub platform: String,

    /// Source category written into records
    pub source_type: SourceType,

    #[serde(default = "defaults::enabled")]
    pub enabled: bool,

    /// Search pagination settings (search-driven sources)
    #[serde(default)]
    pub search: Option<SearchSourceConfig>,

    /// Static URL catalog (fixed-list sources)
    #[serde(default)]
    pub urls: Vec<String>,

    /// Content extraction rules, consulted in listed order
    #[serde(default)]
    pub content_rules: Vec<ExtractionRule>,

    /// Elements removed before text extraction (`tag`, `.class`, or `#id`)
    #[serde(default = "defaults::strip_selectors")]
    pub strip_selectors: Vec<String>,

    /// Secondary document carrying the real content, referenced from the
    /// primary page
    #[serde(default)]
    pub frame: Option<FrameRule>,

    /// Title/author/date selectors for fixed-list detail pages
    #[serde(default)]
    pub detail: Option<DetailSelectors>,

    /// Rating extraction for review sources
    #[serde(default)]
    pub rating: Option<RatingRule>,
}

/// Pagination and result-page parsing for a search-driven source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchSourceConfig {
    /// Search URL template with `{query}` and `{start}` placeholders
    pub url_template: String,

    /// Result items per page; page *p* starts at `(p-1)*page_size + 1`
    #[serde(default = "defaults::page_size")]
    pub page_size: usize,

    /// Upper bound on result pages per keyword
    #[serde(default = "defaults::max_pages")]
    pub max_pages: usize,

    /// Keep only results whose link lands on this domain
    #[serde(default)]
    pub allowed_domain: Option<String>,

    pub selectors: ResultSelectors,
}

/// CSS selectors for one search-result page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultSelectors {
    /// Selector for one result entry
    pub item_selector: String,

    pub title_selector: String,

    #[serde(default)]
    pub snippet_selector: Option<String>,

    #[serde(default)]
    pub author_selector: Option<String>,

    #[serde(default)]
    pub date_selector: Option<String>,

    /// Link element selector (defaults to the title element)
    #[serde(default)]
    pub link_selector: Option<String>,

    /// Attribute carrying the link target
    #[serde(default = "defaults::link_attr")]
    pub link_attr: String,
}

/// One strategy for locating the main textual content within a document.
///
/// Markup for the same logical page type varies across time and authors, so
/// sources list several rules; the first one that yields enough text wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExtractionRule {
    /// Text of the first container matching a CSS selector
    Css { selector: String },

    /// `articleBody` from an embedded JSON-LD metadata block
    JsonLd,

    /// Whole document text minus boilerplate; last-resort fallback with a
    /// higher length threshold
    FullDocument,
}

/// Reference to a nested frame document holding the real content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameRule {
    /// Selector for the frame element, e.g. `iframe#mainFrame`
    pub selector: String,

    /// Attribute carrying the frame URL
    #[serde(default = "defaults::frame_attr")]
    pub attr: String,
}

/// Title/author/date selectors applied to a fixed-list detail page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetailSelectors {
    #[serde(default)]
    pub title_selector: Option<String>,

    #[serde(default)]
    pub author_selector: Option<String>,

    #[serde(default)]
    pub date_selector: Option<String>,
}

/// Rating extraction: selector plus a regex capturing the numeric value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatingRule {
    pub selector: String,

    #[serde(default = "defaults::rating_pattern")]
    pub pattern: String,
}

impl SourceConfig {
    /// Whether this source is driven by keyword search.
    pub fn is_search(&self) -> bool {
        self.search.is_some()
    }
}

mod defaults {
    pub fn enabled() -> bool {
        true
    }

    pub fn page_size() -> usize {
        30
    }

    pub fn max_pages() -> usize {
        5
    }

    pub fn link_attr() -> String {
        "href".into()
    }

    pub fn frame_attr() -> String {
        "src".into()
    }

    pub fn rating_pattern() -> String {
        r"([0-9](?:\.[0-9])?)".into()
    }

    pub fn strip_selectors() -> Vec<String> {
        vec!["script".into(), "style".into()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extraction_rule_parses_tagged_toml() {
        let toml = r#"
            [[content_rules]]
            type = "css"
            selector = ".se-main-container"

            [[content_rules]]
            type = "json_ld"

            [[content_rules]]
            type = "full_document"
        "#;

        #[derive(Deserialize)]
        struct Wrapper {
            content_rules: Vec<ExtractionRule>,
        }

        let wrapper: Wrapper = toml::from_str(toml).unwrap();
        assert_eq!(
            wrapper.content_rules,
            vec![
                ExtractionRule::Css {
                    selector: ".se-main-container".to_string()
                },
                ExtractionRule::JsonLd,
                ExtractionRule::FullDocument,
            ]
        );
    }

    #[test]
    fn source_without_search_is_fixed_list() {
        let toml = r#"
            id = "clien"
            platform = "Clien"
            source_type = "community"
            urls = ["https://www.clien.net/service/board/use/9288297"]
        "#;
        let source: SourceConfig = toml::from_str(toml).unwrap();
        assert!(!source.is_search());
        assert!(source.enabled);
        assert_eq!(source.urls.len(), 1);
    }
}

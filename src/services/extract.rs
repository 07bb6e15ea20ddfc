// src/services/extract.rs

//! Content extraction strategy chain.
//!
//! Markup for the same logical page type is inconsistent across time and
//! authors, so each source carries an ordered list of extraction rules.
//! The first rule producing text above the length threshold wins; a
//! whole-document fallback (higher threshold) always closes the chain.

use scraper::{ElementRef, Html, Selector};

use crate::error::{AppError, ExtractError, Result};
use crate::models::{ExtractionConfig, ExtractionRule};

/// Suffix appended when extracted text is cut at the length cap.
pub const TRUNCATION_MARKER: &str = "...(truncated)";

/// Tags never worth extracting text from.
const BOILERPLATE_TAGS: &[&str] = &[
    "script", "style", "noscript", "iframe", "nav", "header", "footer", "aside", "form", "button",
];

/// A strip rule in its matchable form: `tag`, `.class`, or `#id`.
#[derive(Debug, Clone)]
enum StripRule {
    Tag(String),
    Class(String),
    Id(String),
}

impl StripRule {
    fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw.is_empty() || raw.contains([' ', ',', '>', '[']) {
            return Err(AppError::selector(
                raw,
                "strip rules accept a tag, .class, or #id",
            ));
        }
        if let Some(class) = raw.strip_prefix('.') {
            Ok(StripRule::Class(class.to_string()))
        } else if let Some(id) = raw.strip_prefix('#') {
            Ok(StripRule::Id(id.to_string()))
        } else {
            Ok(StripRule::Tag(raw.to_ascii_lowercase()))
        }
    }

    fn matches(&self, element: &scraper::node::Element) -> bool {
        match self {
            StripRule::Tag(tag) => element.name().eq_ignore_ascii_case(tag),
            StripRule::Class(class) => element.classes().any(|c| c == class.as_str()),
            StripRule::Id(id) => element.attr("id") == Some(id.as_str()),
        }
    }
}

enum CompiledRule {
    Css(Selector),
    JsonLd,
    FullDocument,
}

/// Ordered extraction strategies for one source's documents.
///
/// Pure with respect to its input: the same raw document always yields the
/// same output text.
pub struct ExtractionChain {
    rules: Vec<CompiledRule>,
    strip: Vec<StripRule>,
    json_ld_selector: Selector,
    body_selector: Selector,
    min_content_len: usize,
    min_fallback_len: usize,
    max_content_len: usize,
}

impl ExtractionChain {
    /// Compile a rule list for a source.
    ///
    /// Appends the whole-document fallback when the source does not list it
    /// explicitly.
    pub fn compile(
        rules: &[ExtractionRule],
        strip_selectors: &[String],
        config: &ExtractionConfig,
    ) -> Result<Self> {
        let mut compiled = Vec::with_capacity(rules.len() + 1);
        for rule in rules {
            compiled.push(match rule {
                ExtractionRule::Css { selector } => CompiledRule::Css(parse_selector(selector)?),
                ExtractionRule::JsonLd => CompiledRule::JsonLd,
                ExtractionRule::FullDocument => CompiledRule::FullDocument,
            });
        }
        if !rules.contains(&ExtractionRule::FullDocument) {
            compiled.push(CompiledRule::FullDocument);
        }

        let strip = strip_selectors
            .iter()
            .map(|s| StripRule::parse(s))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            rules: compiled,
            strip,
            json_ld_selector: parse_selector("script[type=\"application/ld+json\"]")?,
            body_selector: parse_selector("body")?,
            min_content_len: config.min_content_len,
            min_fallback_len: config.min_fallback_len,
            max_content_len: config.max_content_len,
        })
    }

    /// Run the chain over a raw document.
    pub fn extract(&self, html: &str) -> std::result::Result<String, ExtractError> {
        let document = Html::parse_document(html);

        for rule in &self.rules {
            let candidate = match rule {
                CompiledRule::Css(selector) => document
                    .select(selector)
                    .next()
                    .map(|element| self.element_text(element)),
                CompiledRule::JsonLd => self.json_ld_article_body(&document),
                CompiledRule::FullDocument => document
                    .select(&self.body_selector)
                    .next()
                    .map(|element| self.element_text(element)),
            };

            let threshold = match rule {
                CompiledRule::FullDocument => self.min_fallback_len,
                _ => self.min_content_len,
            };

            if let Some(text) = candidate {
                if text.chars().count() >= threshold {
                    return Ok(self.truncate(text));
                }
            }
        }

        Err(ExtractError::NoContent)
    }

    /// Visible text of an element subtree, boilerplate and strip rules
    /// removed, whitespace normalized.
    fn element_text(&self, element: ElementRef) -> String {
        let mut parts: Vec<String> = Vec::new();
        self.collect_text(element, &mut parts);
        normalize_whitespace(&parts.join(" "))
    }

    fn collect_text(&self, element: ElementRef, parts: &mut Vec<String>) {
        for child in element.children() {
            if let Some(text) = child.value().as_text() {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    parts.push(trimmed.to_string());
                }
            } else if let Some(child_element) = ElementRef::wrap(child) {
                if !self.is_stripped(child_element.value()) {
                    self.collect_text(child_element, parts);
                }
            }
        }
    }

    fn is_stripped(&self, element: &scraper::node::Element) -> bool {
        let name = element.name();
        BOILERPLATE_TAGS.iter().any(|tag| name.eq_ignore_ascii_case(tag))
            || self.strip.iter().any(|rule| rule.matches(element))
    }

    /// `articleBody` from the first JSON-LD block that carries one.
    fn json_ld_article_body(&self, document: &Html) -> Option<String> {
        for script in document.select(&self.json_ld_selector) {
            let raw: String = script.text().collect();
            let Ok(value) = serde_json::from_str::<serde_json::Value>(&raw) else {
                continue;
            };
            if let Some(body) = value.get("articleBody").and_then(|v| v.as_str()) {
                let body = normalize_whitespace(body);
                if !body.is_empty() {
                    return Some(body);
                }
            }
        }
        None
    }

    fn truncate(&self, text: String) -> String {
        if text.chars().count() <= self.max_content_len {
            return text;
        }
        let mut cut: String = text.chars().take(self.max_content_len).collect();
        cut.push_str(TRUNCATION_MARKER);
        cut
    }
}

fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}

fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

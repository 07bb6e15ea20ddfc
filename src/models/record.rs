// src/models/record.rs

//! Unified output record shared with downstream analysis.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Broad category of a content origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Review,
    Blog,
    Community,
    Sns,
    News,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Review => "review",
            SourceType::Blog => "blog",
            SourceType::Community => "community",
            SourceType::Sns => "sns",
            SourceType::News => "news",
        }
    }
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One normalized unit of harvested content.
///
/// Invariants enforced by the collectors:
/// - `url` is unique within a harvest run
/// - `text` is non-empty
/// - `collected_at` is set once, at emission time
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContentRecord {
    /// Company the mention is about
    pub company: String,

    /// Source category
    pub source_type: SourceType,

    /// Platform display name (e.g. "Naver Blog", "Clien")
    pub source_platform: String,

    /// Post or review title (may be empty for untitled content)
    pub title: String,

    /// Extracted body text
    pub text: String,

    /// Star rating, 1.0-5.0; only meaningful for review sources
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f32>,

    /// Author handle as displayed by the source
    pub author: String,

    /// Publication date as the source presents it (free-form)
    pub date: String,

    /// Full URL of the post
    pub url: String,

    /// When this record was emitted
    pub collected_at: DateTime<Utc>,

    /// Keyword that surfaced this record (search-driven sources only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_keyword: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> ContentRecord {
        ContentRecord {
            company: "Ringle".to_string(),
            source_type: SourceType::Blog,
            source_platform: "Naver Blog".to_string(),
            title: "Three months in".to_string(),
            text: "Long enough body text".to_string(),
            rating: None,
            author: "someone".to_string(),
            date: "2024. 5. 2.".to_string(),
            url: "https://blog.example.com/post/1".to_string(),
            collected_at: Utc::now(),
            search_keyword: Some("후기".to_string()),
        }
    }

    #[test]
    fn source_type_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&SourceType::Community).unwrap(),
            "\"community\""
        );
        assert_eq!(SourceType::Review.as_str(), "review");
    }

    #[test]
    fn record_uses_schema_field_names() {
        let value = serde_json::to_value(sample_record()).unwrap();
        let object = value.as_object().unwrap();
        for key in [
            "company",
            "source_type",
            "source_platform",
            "title",
            "text",
            "author",
            "date",
            "url",
            "collected_at",
            "search_keyword",
        ] {
            assert!(object.contains_key(key), "missing field {key}");
        }
        // Absent rating is omitted, not serialized as null
        assert!(!object.contains_key("rating"));
    }

    #[test]
    fn record_roundtrips_through_json() {
        let record = sample_record();
        let json = serde_json::to_string(&record).unwrap();
        let back: ContentRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }
}

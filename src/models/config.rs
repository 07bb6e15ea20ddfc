// src/models/config.rs

//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::source::SourceConfig;

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Company the harvest is about; stamped into every record
    #[serde(default = "defaults::company")]
    pub company: String,

    /// HTTP and pacing behavior settings
    #[serde(default)]
    pub harvester: HarvesterConfig,

    /// Content-extraction thresholds
    #[serde(default)]
    pub extraction: ExtractionConfig,

    /// Output sink settings
    #[serde(default)]
    pub output: OutputConfig,

    /// Keyword catalog, grouped by semantic category (metadata only)
    #[serde(default = "defaults::keyword_groups")]
    pub keywords: Vec<KeywordGroup>,

    /// Source definitions
    #[serde(default = "defaults::sources")]
    pub sources: Vec<SourceConfig>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// All keywords across groups, in catalog order.
    pub fn all_keywords(&self) -> Vec<String> {
        self.keywords
            .iter()
            .flat_map(|group| group.keywords.iter().cloned())
            .collect()
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.company.trim().is_empty() {
            return Err(AppError::validation("company is empty"));
        }
        if self.harvester.user_agent.trim().is_empty() {
            return Err(AppError::validation("harvester.user_agent is empty"));
        }
        if self.harvester.timeout_secs == 0 {
            return Err(AppError::validation("harvester.timeout_secs must be > 0"));
        }
        if self.harvester.max_concurrent == 0 {
            return Err(AppError::validation("harvester.max_concurrent must be > 0"));
        }
        if self.extraction.max_content_len <= self.extraction.min_fallback_len {
            return Err(AppError::validation(
                "extraction.max_content_len must exceed min_fallback_len",
            ));
        }
        if self.output.path.trim().is_empty() {
            return Err(AppError::validation("output.path is empty"));
        }
        if !self.sources.iter().any(|s| s.enabled) {
            return Err(AppError::validation("no enabled sources"));
        }

        for source in &self.sources {
            if source.id.trim().is_empty() {
                return Err(AppError::validation("source with empty id"));
            }
            match (&source.search, source.urls.is_empty()) {
                (Some(search), true) => {
                    if !search.url_template.contains("{query}") {
                        return Err(AppError::validation(format!(
                            "source '{}': url_template missing {{query}} placeholder",
                            source.id
                        )));
                    }
                    if search.page_size == 0 || search.max_pages == 0 {
                        return Err(AppError::validation(format!(
                            "source '{}': page_size and max_pages must be > 0",
                            source.id
                        )));
                    }
                }
                (None, false) => {}
                (Some(_), false) => {
                    return Err(AppError::validation(format!(
                        "source '{}': both search and urls configured",
                        source.id
                    )));
                }
                (None, true) => {
                    return Err(AppError::validation(format!(
                        "source '{}': neither search nor urls configured",
                        source.id
                    )));
                }
            }
        }

        let search_enabled = self.sources.iter().any(|s| s.enabled && s.is_search());
        if search_enabled && self.all_keywords().is_empty() {
            return Err(AppError::validation(
                "search sources enabled but keyword catalog is empty",
            ));
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            company: defaults::company(),
            harvester: HarvesterConfig::default(),
            extraction: ExtractionConfig::default(),
            output: OutputConfig::default(),
            keywords: defaults::keyword_groups(),
            sources: defaults::sources(),
        }
    }
}

/// HTTP client and request pacing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarvesterConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Accept-Language header matching the target sources' audience
    #[serde(default = "defaults::accept_language")]
    pub accept_language: String,

    /// Referer header (some sources vary markup by referrer)
    #[serde(default)]
    pub referer: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Minimum interval between requests to one source, in milliseconds
    #[serde(default = "defaults::request_delay")]
    pub request_delay_ms: u64,

    /// Random jitter added on top of the interval, in milliseconds
    #[serde(default = "defaults::jitter")]
    pub jitter_ms: u64,

    /// Concurrent keyword tasks per source
    #[serde(default = "defaults::max_concurrent")]
    pub max_concurrent: usize,
}

impl Default for HarvesterConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            accept_language: defaults::accept_language(),
            referer: None,
            timeout_secs: defaults::timeout(),
            request_delay_ms: defaults::request_delay(),
            jitter_ms: defaults::jitter(),
            max_concurrent: defaults::max_concurrent(),
        }
    }
}

/// Content-extraction thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Minimum text length for a targeted container rule to win
    #[serde(default = "defaults::min_content_len")]
    pub min_content_len: usize,

    /// Minimum text length for the whole-document fallback
    #[serde(default = "defaults::min_fallback_len")]
    pub min_fallback_len: usize,

    /// Cap on stored text; longer content is cut and flagged
    #[serde(default = "defaults::max_content_len")]
    pub max_content_len: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            min_content_len: defaults::min_content_len(),
            min_fallback_len: defaults::min_fallback_len(),
            max_content_len: defaults::max_content_len(),
        }
    }
}

/// Output sink settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Snapshot file path
    #[serde(default = "defaults::output_path")]
    pub path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: defaults::output_path(),
        }
    }
}

/// A group of search keywords sharing a semantic category.
///
/// The category is reporting metadata; it does not affect collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordGroup {
    pub category: String,
    pub keywords: Vec<String>,
}

mod defaults {
    use crate::models::record::SourceType;
    use crate::models::source::{
        DetailSelectors, ExtractionRule, FrameRule, ResultSelectors, SearchSourceConfig,
        SourceConfig,
    };

    use super::KeywordGroup;

    pub fn company() -> String {
        "Ringle".into()
    }

    // Harvester defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
         (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
            .into()
    }
    pub fn accept_language() -> String {
        "ko-KR,ko;q=0.9,en-US;q=0.8,en;q=0.7".into()
    }
    pub fn timeout() -> u64 {
        15
    }
    pub fn request_delay() -> u64 {
        1000
    }
    pub fn jitter() -> u64 {
        250
    }
    pub fn max_concurrent() -> usize {
        4
    }

    // Extraction defaults
    pub fn min_content_len() -> usize {
        50
    }
    pub fn min_fallback_len() -> usize {
        100
    }
    pub fn max_content_len() -> usize {
        8000
    }

    pub fn output_path() -> String {
        "output/records.json".into()
    }

    // Keyword defaults
    pub fn keyword_groups() -> Vec<KeywordGroup> {
        vec![
            KeywordGroup {
                category: "brand".into(),
                keywords: vec!["링글".into(), "Ringle".into(), "링글플러스".into()],
            },
            KeywordGroup {
                category: "experience".into(),
                keywords: vec![
                    "링글 후기".into(),
                    "링글 리뷰".into(),
                    "링글 솔직후기".into(),
                    "링글 내돈내산".into(),
                    "링글 수업 후기".into(),
                    "링글 3개월".into(),
                ],
            },
            KeywordGroup {
                category: "comparison".into(),
                keywords: vec![
                    "링글 vs 캠블리".into(),
                    "링글 캠블리 비교".into(),
                    "링글 스픽 비교".into(),
                    "화상영어 추천 링글".into(),
                ],
            },
            KeywordGroup {
                category: "feature".into(),
                keywords: vec![
                    "링글 AI튜터".into(),
                    "링글 튜터".into(),
                    "링글 교재".into(),
                    "링글 피드백".into(),
                ],
            },
            KeywordGroup {
                category: "price".into(),
                keywords: vec![
                    "링글 가격".into(),
                    "링글 할인".into(),
                    "링글 무료체험".into(),
                ],
            },
            KeywordGroup {
                category: "painpoint".into(),
                keywords: vec!["링글 단점".into(), "링글 환불".into(), "링글 불만".into()],
            },
        ]
    }

    // Source defaults
    pub fn strip_selectors() -> Vec<String> {
        vec!["script".into(), "style".into()]
    }

    pub fn sources() -> Vec<SourceConfig> {
        vec![
            SourceConfig {
                id: "naver_blog".into(),
                platform: "Naver Blog".into(),
                source_type: SourceType::Blog,
                enabled: true,
                search: Some(SearchSourceConfig {
                    url_template:
                        "https://search.naver.com/search.naver?where=blog&query={query}&start={start}"
                            .into(),
                    page_size: 30,
                    max_pages: 5,
                    allowed_domain: Some("blog.naver.com".into()),
                    selectors: ResultSelectors {
                        item_selector: ".view_wrap".into(),
                        title_selector: "a.api_txt_lines.total_tit".into(),
                        snippet_selector: Some(".api_txt_lines.dsc_txt".into()),
                        author_selector: Some(".sub_txt.sub_name".into()),
                        date_selector: Some(".sub_txt.sub_time".into()),
                        link_selector: None,
                        link_attr: "href".into(),
                    },
                }),
                urls: vec![],
                content_rules: vec![
                    ExtractionRule::Css {
                        selector: ".se-main-container".into(),
                    },
                    ExtractionRule::Css {
                        selector: ".post-view".into(),
                    },
                    ExtractionRule::Css {
                        selector: "#postViewArea".into(),
                    },
                    ExtractionRule::Css {
                        selector: ".se_component_wrap".into(),
                    },
                    ExtractionRule::Css {
                        selector: "#post-area".into(),
                    },
                    ExtractionRule::Css {
                        selector: ".post_ct".into(),
                    },
                ],
                strip_selectors: vec![
                    "script".into(),
                    "style".into(),
                    ".se_oglink".into(),
                    ".og_box".into(),
                ],
                frame: Some(FrameRule {
                    selector: "iframe#mainFrame".into(),
                    attr: "src".into(),
                }),
                detail: None,
                rating: None,
            },
            SourceConfig {
                id: "clien".into(),
                platform: "Clien".into(),
                source_type: SourceType::Community,
                enabled: true,
                search: None,
                urls: vec![
                    "https://www.clien.net/service/board/use/9288297".into(),
                    "https://www.clien.net/service/board/park/17774660".into(),
                ],
                content_rules: vec![ExtractionRule::Css {
                    selector: ".post_article".into(),
                }],
                strip_selectors: vec![
                    "script".into(),
                    "style".into(),
                    ".attached_source".into(),
                    ".og_box".into(),
                ],
                frame: None,
                detail: Some(DetailSelectors {
                    title_selector: Some(".post_subject span".into()),
                    author_selector: Some(".post_info .nickname".into()),
                    date_selector: Some(".post_author span".into()),
                }),
                rating: None,
            },
            SourceConfig {
                id: "blind".into(),
                platform: "Blind".into(),
                source_type: SourceType::Community,
                enabled: true,
                search: None,
                urls: vec![
                    "https://www.teamblind.com/kr/post/링글-화상영어-CKO0jbHJ".into(),
                    "https://www.teamblind.com/kr/post/링글-돈값해-1HEYBaFF".into(),
                    "https://www.teamblind.com/kr/post/링글-써보신-분-J0pgRbCC".into(),
                ],
                content_rules: vec![
                    ExtractionRule::JsonLd,
                    ExtractionRule::Css {
                        selector: ".article-content".into(),
                    },
                    ExtractionRule::Css {
                        selector: ".post-content".into(),
                    },
                ],
                strip_selectors: strip_selectors(),
                frame: None,
                detail: Some(DetailSelectors {
                    title_selector: Some("h1.title".into()),
                    author_selector: None,
                    date_selector: None,
                }),
                rating: None,
            },
            SourceConfig {
                id: "brunch".into(),
                platform: "Brunch".into(),
                source_type: SourceType::Blog,
                enabled: true,
                search: None,
                urls: vec![
                    "https://brunch.co.kr/@0simi/162".into(),
                    "https://brunch.co.kr/@sunjae/21".into(),
                    "https://brunch.co.kr/@kongkong2222/114".into(),
                ],
                content_rules: vec![ExtractionRule::Css {
                    selector: ".wrap_body_frame".into(),
                }],
                strip_selectors: vec![
                    "script".into(),
                    "style".into(),
                    ".wrap_btn".into(),
                ],
                frame: None,
                detail: Some(DetailSelectors {
                    title_selector: Some(".cover_title".into()),
                    author_selector: Some(".txt_username".into()),
                    date_selector: Some(".date_item".into()),
                }),
                rating: None,
            },
            SourceConfig {
                id: "tistory".into(),
                platform: "Tistory".into(),
                source_type: SourceType::Blog,
                enabled: true,
                search: None,
                urls: vec![
                    "https://kindoflegacy.com/entry/내돈내산-링글-영어회화-7개월-리뷰-캠블리-스픽-비교"
                        .into(),
                ],
                content_rules: vec![
                    ExtractionRule::Css {
                        selector: ".entry-content".into(),
                    },
                    ExtractionRule::Css {
                        selector: ".post-content".into(),
                    },
                    ExtractionRule::Css {
                        selector: "article".into(),
                    },
                ],
                strip_selectors: vec![
                    "script".into(),
                    "style".into(),
                    "nav".into(),
                    ".widget".into(),
                ],
                frame: None,
                detail: Some(DetailSelectors {
                    title_selector: Some(".entry-title".into()),
                    author_selector: None,
                    date_selector: None,
                }),
                rating: None,
            },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_user_agent() {
        let mut config = Config::default();
        config.harvester.user_agent = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_source_without_search_or_urls() {
        let mut config = Config::default();
        config.sources[0].search = None;
        config.sources[0].urls.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_template_without_query_placeholder() {
        let mut config = Config::default();
        if let Some(search) = config.sources[0].search.as_mut() {
            search.url_template = "https://example.com/search?start={start}".to_string();
        }
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_all_sources_disabled() {
        let mut config = Config::default();
        for source in &mut config.sources {
            source.enabled = false;
        }
        assert!(config.validate().is_err());
    }

    #[test]
    fn all_keywords_flattens_groups_in_order() {
        let config = Config::default();
        let keywords = config.all_keywords();
        assert!(!keywords.is_empty());
        assert_eq!(keywords[0], "링글");
        let total: usize = config.keywords.iter().map(|g| g.keywords.len()).sum();
        assert_eq!(keywords.len(), total);
    }
}

// src/services/collect.rs

//! Source collectors.
//!
//! One collector per source turns that source's configuration into
//! `ContentRecord`s pushed through the orchestrator-owned channel. Per-item
//! failures (transport, extraction, too-short text) are counted and skipped;
//! nothing here is fatal to the run.

use std::sync::Arc;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use regex::Regex;
use scraper::{Html, Selector};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::{AppError, Result};
use crate::models::{Config, ContentRecord, RatingRule, SearchQuery, SourceConfig, SourceType};
use crate::services::content::{CompiledFrameRule, ContentFetcher};
use crate::services::dedup::Deduplicator;
use crate::services::extract::ExtractionChain;
use crate::services::search::SearchPaginator;
use crate::utils::RateLimiter;

/// Per-source counters for the run summary.
///
/// Every item that was attempted shows up in exactly one bucket, so the
/// operator can account for the difference between attempted and emitted.
#[derive(Debug, Default, Clone)]
pub struct CollectOutcome {
    pub source_id: String,
    pub platform: String,
    pub pages_fetched: usize,
    pub attempted: usize,
    pub emitted: usize,
    pub duplicates: usize,
    pub fetch_failures: usize,
    pub extract_failures: usize,
    pub keyword_failures: usize,
}

impl CollectOutcome {
    fn for_source(source: &SourceConfig) -> Self {
        Self {
            source_id: source.id.clone(),
            platform: source.platform.clone(),
            ..Self::default()
        }
    }

    fn absorb(&mut self, part: CollectOutcome) {
        self.pages_fetched += part.pages_fetched;
        self.attempted += part.attempted;
        self.emitted += part.emitted;
        self.duplicates += part.duplicates;
        self.fetch_failures += part.fetch_failures;
        self.extract_failures += part.extract_failures;
        self.keyword_failures += part.keyword_failures;
    }

    /// Items attempted but not emitted, across all skip causes.
    pub fn skipped(&self) -> usize {
        self.fetch_failures + self.extract_failures
    }
}

/// Search-driven collector: keywords in, records out.
pub struct SearchCollector {
    source: SourceConfig,
    company: String,
    max_concurrent: usize,
    paginator: SearchPaginator,
    fetcher: ContentFetcher,
    chain: ExtractionChain,
    frame: Option<CompiledFrameRule>,
}

impl SearchCollector {
    pub fn new(
        config: &Config,
        source: &SourceConfig,
        client: reqwest::Client,
        limiter: Arc<RateLimiter>,
    ) -> Result<Self> {
        let search = source.search.as_ref().ok_or_else(|| {
            AppError::config(format!("source '{}' is not search-driven", source.id))
        })?;

        Ok(Self {
            paginator: SearchPaginator::new(client.clone(), Arc::clone(&limiter), search)?,
            fetcher: ContentFetcher::new(client, limiter),
            chain: ExtractionChain::compile(
                &source.content_rules,
                &source.strip_selectors,
                &config.extraction,
            )?,
            frame: source.frame.as_ref().map(CompiledFrameRule::compile).transpose()?,
            company: config.company.clone(),
            max_concurrent: config.harvester.max_concurrent.max(1),
            source: source.clone(),
        })
    }

    /// Run every keyword against this source.
    ///
    /// Keywords run concurrently (bounded); pagination inside one keyword
    /// stays sequential because each page's stop decision depends on the
    /// page before it. A keyword that fails never aborts the others.
    pub async fn collect(
        &self,
        keywords: &[String],
        dedup: &Deduplicator,
        tx: &mpsc::Sender<ContentRecord>,
        cancel: &CancellationToken,
    ) -> CollectOutcome {
        let mut outcome = CollectOutcome::for_source(&self.source);
        let max_pages = self
            .source
            .search
            .as_ref()
            .map(|search| search.max_pages)
            .unwrap_or(1);

        let mut keyword_parts = stream::iter(keywords)
            .map(|keyword| {
                let query = SearchQuery {
                    keyword: keyword.clone(),
                    source: self.source.id.clone(),
                    max_pages,
                };
                async move { self.collect_keyword(query, dedup, tx, cancel).await }
            })
            .buffer_unordered(self.max_concurrent);

        while let Some(part) = keyword_parts.next().await {
            outcome.absorb(part);
        }
        outcome
    }

    async fn collect_keyword(
        &self,
        query: SearchQuery,
        dedup: &Deduplicator,
        tx: &mpsc::Sender<ContentRecord>,
        cancel: &CancellationToken,
    ) -> CollectOutcome {
        let mut part = CollectOutcome::default();

        let scan = self.paginator.collect(&query, cancel).await;
        part.pages_fetched = scan.pages_fetched;
        if scan.failure.is_some() {
            part.keyword_failures = 1;
        }
        log::info!(
            "[{}] '{}': {} results over {} pages",
            self.source.id,
            query.keyword,
            scan.items.len(),
            scan.pages_fetched
        );

        for item in scan.items {
            if cancel.is_cancelled() {
                break;
            }
            if dedup.seen_and_mark(&item.url) {
                part.duplicates += 1;
                continue;
            }
            part.attempted += 1;

            let document = match self.fetcher.fetch_document(&item.url, self.frame.as_ref()).await
            {
                Ok(document) => document,
                Err(error) => {
                    part.fetch_failures += 1;
                    log::warn!(
                        "[{}] '{}': fetch failed for {}: {error}",
                        self.source.id,
                        query.keyword,
                        item.url
                    );
                    continue;
                }
            };

            let text = match self.chain.extract(&document) {
                Ok(text) => text,
                Err(error) => {
                    part.extract_failures += 1;
                    log::debug!(
                        "[{}] '{}': {error} for {}",
                        self.source.id,
                        query.keyword,
                        item.url
                    );
                    continue;
                }
            };

            let record = ContentRecord {
                company: self.company.clone(),
                source_type: self.source.source_type,
                source_platform: self.source.platform.clone(),
                title: item.title,
                text,
                rating: None,
                author: item.author,
                date: item.published,
                url: item.url,
                collected_at: Utc::now(),
                search_keyword: Some(item.search_keyword),
            };
            if tx.send(record).await.is_err() {
                // Sink closed; nothing further can be emitted.
                break;
            }
            part.emitted += 1;
        }

        part
    }
}

/// Fixed-list collector for sources without a practical full-text search.
pub struct FixedListCollector {
    source: SourceConfig,
    company: String,
    fetcher: ContentFetcher,
    chain: ExtractionChain,
    frame: Option<CompiledFrameRule>,
    title: Option<Selector>,
    author: Option<Selector>,
    date: Option<Selector>,
    rating: Option<CompiledRatingRule>,
}

struct CompiledRatingRule {
    selector: Selector,
    pattern: Regex,
}

impl CompiledRatingRule {
    fn compile(rule: &RatingRule) -> Result<Self> {
        Ok(Self {
            selector: parse_selector(&rule.selector)?,
            pattern: Regex::new(&rule.pattern)
                .map_err(|e| AppError::config(format!("invalid rating pattern: {e}")))?,
        })
    }
}

impl FixedListCollector {
    pub fn new(
        config: &Config,
        source: &SourceConfig,
        client: reqwest::Client,
        limiter: Arc<RateLimiter>,
    ) -> Result<Self> {
        let detail = source.detail.clone().unwrap_or_default();
        Ok(Self {
            fetcher: ContentFetcher::new(client, limiter),
            chain: ExtractionChain::compile(
                &source.content_rules,
                &source.strip_selectors,
                &config.extraction,
            )?,
            frame: source.frame.as_ref().map(CompiledFrameRule::compile).transpose()?,
            title: parse_optional(detail.title_selector.as_deref())?,
            author: parse_optional(detail.author_selector.as_deref())?,
            date: parse_optional(detail.date_selector.as_deref())?,
            rating: source
                .rating
                .as_ref()
                .map(CompiledRatingRule::compile)
                .transpose()?,
            company: config.company.clone(),
            source: source.clone(),
        })
    }

    /// Walk the static URL catalog, one post at a time.
    pub async fn collect(
        &self,
        dedup: &Deduplicator,
        tx: &mpsc::Sender<ContentRecord>,
        cancel: &CancellationToken,
    ) -> CollectOutcome {
        let mut outcome = CollectOutcome::for_source(&self.source);

        for url in &self.source.urls {
            if cancel.is_cancelled() {
                break;
            }
            if dedup.seen_and_mark(url) {
                outcome.duplicates += 1;
                continue;
            }
            outcome.attempted += 1;

            let document = match self.fetcher.fetch_document(url, self.frame.as_ref()).await {
                Ok(document) => document,
                Err(error) => {
                    outcome.fetch_failures += 1;
                    log::warn!("[{}] fetch failed for {url}: {error}", self.source.id);
                    continue;
                }
            };

            let text = match self.chain.extract(&document) {
                Ok(text) => text,
                Err(error) => {
                    outcome.extract_failures += 1;
                    log::debug!("[{}] {error} for {url}", self.source.id);
                    continue;
                }
            };

            let detail = self.detail_fields(&document);
            log::info!(
                "[{}] collected {}",
                self.source.id,
                if detail.title.is_empty() { url } else { &detail.title }
            );

            let record = ContentRecord {
                company: self.company.clone(),
                source_type: self.source.source_type,
                source_platform: self.source.platform.clone(),
                title: detail.title,
                text,
                rating: detail.rating,
                author: detail.author,
                date: detail.date,
                url: url.clone(),
                collected_at: Utc::now(),
                search_keyword: None,
            };
            if tx.send(record).await.is_err() {
                break;
            }
            outcome.emitted += 1;
        }

        outcome
    }

    /// Pull title/author/date (and rating on review sources) off the page.
    fn detail_fields(&self, html: &str) -> DetailFields {
        let document = Html::parse_document(html);

        let title = select_text(&document, self.title.as_ref()).unwrap_or_default();
        let author =
            select_text(&document, self.author.as_ref()).unwrap_or_else(|| "Anonymous".into());
        let date = select_text(&document, self.date.as_ref()).unwrap_or_default();

        let rating = match (&self.rating, self.source.source_type) {
            (Some(rule), SourceType::Review) => select_text(&document, Some(&rule.selector))
                .and_then(|text| {
                    rule.pattern
                        .captures(&text)
                        .and_then(|captures| captures.get(1))
                        .and_then(|value| value.as_str().parse::<f32>().ok())
                })
                .filter(|value| (1.0..=5.0).contains(value)),
            _ => None,
        };

        DetailFields {
            title,
            author,
            date,
            rating,
        }
    }
}

struct DetailFields {
    title: String,
    author: String,
    date: String,
    rating: Option<f32>,
}

fn select_text(document: &Html, selector: Option<&Selector>) -> Option<String> {
    let element = document.select(selector?).next()?;
    let raw: String = element.text().collect();
    let text = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if text.is_empty() { None } else { Some(text) }
}

fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}

fn parse_optional(s: Option<&str>) -> Result<Option<Selector>> {
    s.map(parse_selector).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_absorb_sums_counters() {
        let mut total = CollectOutcome::for_source(&Config::default().sources[0]);
        total.absorb(CollectOutcome {
            attempted: 3,
            emitted: 2,
            fetch_failures: 1,
            ..CollectOutcome::default()
        });
        total.absorb(CollectOutcome {
            attempted: 2,
            emitted: 1,
            extract_failures: 1,
            duplicates: 4,
            ..CollectOutcome::default()
        });
        assert_eq!(total.attempted, 5);
        assert_eq!(total.emitted, 3);
        assert_eq!(total.duplicates, 4);
        assert_eq!(total.skipped(), 2);
        assert_eq!(total.source_id, "naver_blog");
    }

    #[test]
    fn rating_is_parsed_and_bounded() {
        let rule = CompiledRatingRule::compile(&RatingRule {
            selector: ".stars".to_string(),
            pattern: r"([0-9](?:\.[0-9])?)".to_string(),
        })
        .unwrap();

        let grab = |html: &str| {
            let document = Html::parse_document(html);
            select_text(&document, Some(&rule.selector))
                .and_then(|text| {
                    rule.pattern
                        .captures(&text)
                        .and_then(|captures| captures.get(1))
                        .and_then(|value| value.as_str().parse::<f32>().ok())
                })
                .filter(|value| (1.0..=5.0).contains(value))
        };

        assert_eq!(grab("<div class='stars'>4.5 / 5</div>"), Some(4.5));
        assert_eq!(grab("<div class='stars'>no number</div>"), None);
        assert_eq!(grab("<div class='stars'>0.2</div>"), None);
    }
}

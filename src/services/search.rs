// src/services/search.rs

//! Paginated keyword search against one source.

use std::collections::HashSet;
use std::sync::Arc;

use scraper::{Html, Selector};
use tokio_util::sync::CancellationToken;

use crate::error::{AppError, FetchError, Result};
use crate::models::{ResultSelectors, SearchQuery, SearchResultItem, SearchSourceConfig};
use crate::utils::RateLimiter;
use crate::utils::http::fetch_text;
use crate::utils::url::domain_matches;

/// What one keyword's pagination produced.
///
/// A transport failure ends pagination for the keyword but keeps the pages
/// already parsed; the caller counts the failure and moves on.
#[derive(Debug, Default)]
pub struct PageScan {
    pub items: Vec<SearchResultItem>,
    pub pages_fetched: usize,
    pub failure: Option<FetchError>,
}

struct CompiledResultSelectors {
    item: Selector,
    title: Selector,
    snippet: Option<Selector>,
    author: Option<Selector>,
    date: Option<Selector>,
    link: Option<Selector>,
    link_attr: String,
}

impl CompiledResultSelectors {
    fn compile(selectors: &ResultSelectors) -> Result<Self> {
        Ok(Self {
            item: parse_selector(&selectors.item_selector)?,
            title: parse_selector(&selectors.title_selector)?,
            snippet: parse_optional(selectors.snippet_selector.as_deref())?,
            author: parse_optional(selectors.author_selector.as_deref())?,
            date: parse_optional(selectors.date_selector.as_deref())?,
            link: parse_optional(selectors.link_selector.as_deref())?,
            link_attr: selectors.link_attr.clone(),
        })
    }
}

/// Issues successive search-result pages for a keyword and decides when to
/// stop.
pub struct SearchPaginator {
    client: reqwest::Client,
    limiter: Arc<RateLimiter>,
    profile: SearchSourceConfig,
    selectors: CompiledResultSelectors,
}

impl SearchPaginator {
    pub fn new(
        client: reqwest::Client,
        limiter: Arc<RateLimiter>,
        profile: &SearchSourceConfig,
    ) -> Result<Self> {
        Ok(Self {
            client,
            limiter,
            selectors: CompiledResultSelectors::compile(&profile.selectors)?,
            profile: profile.clone(),
        })
    }

    /// Walk result pages for one keyword, page 1 upward.
    ///
    /// Stops on the first empty page (end of results), when a page brings
    /// nothing new (the source has started repeating), at `max_pages`, on a
    /// transport failure, or on cancellation.
    pub async fn collect(&self, query: &SearchQuery, cancel: &CancellationToken) -> PageScan {
        let mut scan = PageScan::default();
        let mut seen_this_keyword: HashSet<String> = HashSet::new();

        for page in 1..=query.max_pages {
            if cancel.is_cancelled() {
                break;
            }

            self.limiter.acquire().await;
            let url = self.page_url(&query.keyword, page);
            let html = match fetch_text(&self.client, &url).await {
                Ok(html) => html,
                Err(error) => {
                    log::warn!(
                        "[{}] page {page}: fetch failed: {error}",
                        query.keyword
                    );
                    scan.failure = Some(error);
                    break;
                }
            };
            scan.pages_fetched += 1;

            let parsed = self.parse_result_page(&html, &query.keyword);
            if parsed.is_empty() {
                log::debug!("[{}] page {page}: no results, stopping", query.keyword);
                break;
            }

            let mut fresh = 0;
            for item in parsed {
                if seen_this_keyword.insert(item.url.clone()) {
                    scan.items.push(item);
                    fresh += 1;
                }
            }
            log::debug!(
                "[{}] page {page}: {fresh} new results ({} total)",
                query.keyword,
                scan.items.len()
            );

            if fresh == 0 {
                break;
            }
        }

        scan
    }

    /// Substitute the keyword and page offset into the URL template.
    fn page_url(&self, keyword: &str, page: usize) -> String {
        let start = (page - 1) * self.profile.page_size + 1;
        self.profile
            .url_template
            .replace("{query}", &urlencoding::encode(keyword))
            .replace("{start}", &start.to_string())
    }

    /// Parse one result page into items.
    ///
    /// A page that fails to parse simply yields zero items, which feeds the
    /// stop condition instead of aborting the keyword.
    fn parse_result_page(&self, html: &str, keyword: &str) -> Vec<SearchResultItem> {
        let document = Html::parse_document(html);
        let mut items = Vec::new();

        for entry in document.select(&self.selectors.item) {
            let Some(title_element) = entry.select(&self.selectors.title).next() else {
                continue;
            };
            let title = element_text(title_element);
            if title.is_empty() {
                continue;
            }

            let link_element = self
                .selectors
                .link
                .as_ref()
                .and_then(|selector| entry.select(selector).next())
                .unwrap_or(title_element);
            let Some(url) = link_element
                .value()
                .attr(&self.selectors.link_attr)
                .map(str::trim)
                .filter(|href| !href.is_empty())
            else {
                continue;
            };

            if let Some(domain) = &self.profile.allowed_domain {
                if !domain_matches(url, domain) {
                    continue;
                }
            }

            items.push(SearchResultItem {
                title,
                url: url.to_string(),
                snippet: optional_text(&entry, self.selectors.snippet.as_ref()),
                author: optional_text(&entry, self.selectors.author.as_ref()),
                published: optional_text(&entry, self.selectors.date.as_ref()),
                search_keyword: keyword.to_string(),
            });
        }

        items
    }
}

fn element_text(element: scraper::ElementRef) -> String {
    let raw: String = element.text().collect();
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn optional_text(entry: &scraper::ElementRef, selector: Option<&Selector>) -> String {
    selector
        .and_then(|selector| entry.select(selector).next())
        .map(element_text)
        .unwrap_or_default()
}

fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}

fn parse_optional(s: Option<&str>) -> Result<Option<Selector>> {
    s.map(parse_selector).transpose()
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn paginator(allowed_domain: Option<&str>) -> SearchPaginator {
        let profile = SearchSourceConfig {
            url_template: "https://search.example.com/s?query={query}&start={start}".to_string(),
            page_size: 30,
            max_pages: 5,
            allowed_domain: allowed_domain.map(str::to_string),
            selectors: ResultSelectors {
                item_selector: ".result".to_string(),
                title_selector: "a.title".to_string(),
                snippet_selector: Some(".snippet".to_string()),
                author_selector: Some(".author".to_string()),
                date_selector: Some(".when".to_string()),
                link_selector: None,
                link_attr: "href".to_string(),
            },
        };
        SearchPaginator::new(
            reqwest::Client::new(),
            Arc::new(RateLimiter::new(Duration::ZERO, 0)),
            &profile,
        )
        .unwrap()
    }

    const PAGE: &str = r#"
        <html><body>
          <div class="result">
            <a class="title" href="https://blog.example.com/post/1?ref=search">First post</a>
            <p class="snippet">A words-long summary</p>
            <span class="author">writer1</span>
            <span class="when">2024. 5. 2.</span>
          </div>
          <div class="result">
            <a class="title" href="https://elsewhere.net/post/9">Off-domain post</a>
          </div>
          <div class="result">
            <a class="title" href="https://blog.example.com/post/2">Second post</a>
          </div>
        </body></html>
    "#;

    #[test]
    fn parses_items_with_optional_fields() {
        let items = paginator(None).parse_result_page(PAGE, "kw");
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].title, "First post");
        assert_eq!(items[0].snippet, "A words-long summary");
        assert_eq!(items[0].author, "writer1");
        assert_eq!(items[0].published, "2024. 5. 2.");
        assert_eq!(items[0].search_keyword, "kw");
        assert_eq!(items[2].snippet, "");
    }

    #[test]
    fn filters_links_off_the_allowed_domain() {
        let items = paginator(Some("blog.example.com")).parse_result_page(PAGE, "kw");
        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|i| i.url.contains("blog.example.com")));
    }

    #[test]
    fn page_url_substitutes_offset_and_encodes_keyword() {
        let paginator = paginator(None);
        assert_eq!(
            paginator.page_url("링글 후기", 2),
            format!(
                "https://search.example.com/s?query={}&start=31",
                urlencoding::encode("링글 후기")
            )
        );
        assert!(paginator.page_url("plain", 1).ends_with("start=1"));
    }

    #[test]
    fn unparseable_page_yields_zero_items() {
        let items = paginator(None).parse_result_page("<<<garbage", "kw");
        assert!(items.is_empty());
    }
}

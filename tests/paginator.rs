//! Pagination stop conditions against a mock search endpoint.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use harvester::error::FetchError;
use harvester::models::{ResultSelectors, SearchQuery, SearchSourceConfig};
use harvester::services::SearchPaginator;
use harvester::utils::RateLimiter;

fn result_page(entries: &[(&str, &str)]) -> String {
    let mut body = String::from("<html><body>");
    for (title, url) in entries {
        body.push_str(&format!(
            "<div class=\"result\"><a class=\"title\" href=\"{url}\">{title}</a></div>"
        ));
    }
    body.push_str("</body></html>");
    body
}

fn paginator(server: &MockServer, page_size: usize, max_pages: usize) -> SearchPaginator {
    let profile = SearchSourceConfig {
        url_template: format!("{}/s?query={{query}}&start={{start}}", server.uri()),
        page_size,
        max_pages,
        allowed_domain: None,
        selectors: ResultSelectors {
            item_selector: ".result".to_string(),
            title_selector: "a.title".to_string(),
            snippet_selector: None,
            author_selector: None,
            date_selector: None,
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

fn query(keyword: &str, max_pages: usize) -> SearchQuery {
    SearchQuery {
        keyword: keyword.to_string(),
        source: "test".to_string(),
        max_pages,
    }
}

async fn mount_page(server: &MockServer, start: &str, body: String, hits: u64) {
    Mock::given(method("GET"))
        .and(path("/s"))
        .and(query_param("start", start))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/html; charset=utf-8"))
        .expect(hits)
        .mount(server)
        .await;
}

#[tokio::test]
async fn empty_page_ends_pagination_after_exactly_two_requests() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "1",
        result_page(&[
            ("First", "https://posts.example.com/1"),
            ("Second", "https://posts.example.com/2"),
        ]),
        1,
    )
    .await;
    mount_page(&server, "31", result_page(&[]), 1).await;

    let scan = paginator(&server, 30, 5)
        .collect(&query("kw", 5), &CancellationToken::new())
        .await;

    assert_eq!(scan.pages_fetched, 2);
    assert_eq!(scan.items.len(), 2);
    assert!(scan.failure.is_none());
}

#[tokio::test]
async fn max_pages_bounds_the_request_count() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "1",
        result_page(&[("A", "https://posts.example.com/a")]),
        1,
    )
    .await;
    mount_page(
        &server,
        "31",
        result_page(&[("B", "https://posts.example.com/b")]),
        1,
    )
    .await;
    // Page 3 exists but max_pages = 2 means it must never be requested.
    mount_page(
        &server,
        "61",
        result_page(&[("C", "https://posts.example.com/c")]),
        0,
    )
    .await;

    let scan = paginator(&server, 30, 2)
        .collect(&query("kw", 2), &CancellationToken::new())
        .await;

    assert_eq!(scan.pages_fetched, 2);
    assert_eq!(scan.items.len(), 2);
    assert!(scan.failure.is_none());
}

#[tokio::test]
async fn repeating_results_end_pagination() {
    let server = MockServer::start().await;
    let same_page = result_page(&[
        ("A", "https://posts.example.com/a"),
        ("B", "https://posts.example.com/b"),
    ]);
    mount_page(&server, "1", same_page.clone(), 1).await;
    // Rank-shuffled duplicates: same URLs again means the source is exhausted.
    mount_page(&server, "31", same_page, 1).await;
    mount_page(&server, "61", result_page(&[]), 0).await;

    let scan = paginator(&server, 30, 5)
        .collect(&query("kw", 5), &CancellationToken::new())
        .await;

    assert_eq!(scan.pages_fetched, 2);
    assert_eq!(scan.items.len(), 2);
}

#[tokio::test]
async fn transport_failure_keeps_earlier_pages() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "1",
        result_page(&[("A", "https://posts.example.com/a")]),
        1,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/s"))
        .and(query_param("start", "31"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let scan = paginator(&server, 30, 5)
        .collect(&query("kw", 5), &CancellationToken::new())
        .await;

    assert_eq!(scan.items.len(), 1);
    assert!(matches!(scan.failure, Some(FetchError::Status(500))));
}

#[tokio::test]
async fn cancelled_token_issues_no_requests() {
    let server = MockServer::start().await;
    mount_page(&server, "1", result_page(&[]), 0).await;

    let cancel = CancellationToken::new();
    cancel.cancel();
    let scan = paginator(&server, 30, 5).collect(&query("kw", 5), &cancel).await;

    assert_eq!(scan.pages_fetched, 0);
    assert!(scan.items.is_empty());
}

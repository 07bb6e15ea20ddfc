// src/services/content.rs

//! Remote document retrieval, including secondary-frame resolution.

use std::sync::Arc;

use scraper::{Html, Selector};

use crate::error::{AppError, FetchError, Result};
use crate::models::FrameRule;
use crate::utils::RateLimiter;
use crate::utils::http::fetch_text;
use crate::utils::url::resolve;

/// A frame rule with its selector parsed.
pub struct CompiledFrameRule {
    selector: Selector,
    attr: String,
}

impl CompiledFrameRule {
    pub fn compile(rule: &FrameRule) -> Result<Self> {
        Ok(Self {
            selector: Selector::parse(&rule.selector)
                .map_err(|e| AppError::selector(&rule.selector, format!("{e:?}")))?,
            attr: rule.attr.clone(),
        })
    }
}

/// Retrieves raw documents for extraction.
pub struct ContentFetcher {
    client: reqwest::Client,
    limiter: Arc<RateLimiter>,
}

impl ContentFetcher {
    pub fn new(client: reqwest::Client, limiter: Arc<RateLimiter>) -> Self {
        Self { client, limiter }
    }

    /// Fetch the document carrying a post's real content.
    ///
    /// Some platforms render the post inside a nested frame document
    /// referenced from the primary page. When the source declares a frame
    /// rule and the reference is present, the secondary document is fetched
    /// and returned; otherwise the primary document is. A failed secondary
    /// fetch falls back to the primary document rather than losing the item.
    pub async fn fetch_document(
        &self,
        url: &str,
        frame: Option<&CompiledFrameRule>,
    ) -> std::result::Result<String, FetchError> {
        self.limiter.acquire().await;
        let primary = fetch_text(&self.client, url).await?;

        let Some(frame) = frame else {
            return Ok(primary);
        };
        let Some(frame_url) = frame_target(&primary, url, frame) else {
            return Ok(primary);
        };

        self.limiter.acquire().await;
        match fetch_text(&self.client, &frame_url).await {
            Ok(secondary) => Ok(secondary),
            Err(error) => {
                log::warn!("frame fetch failed for {frame_url}: {error}; using primary document");
                Ok(primary)
            }
        }
    }
}

/// Resolve the absolute URL of the frame document, if the page has one.
fn frame_target(html: &str, base_url: &str, frame: &CompiledFrameRule) -> Option<String> {
    let document = Html::parse_document(html);
    let element = document.select(&frame.selector).next()?;
    let raw = element.value().attr(&frame.attr)?.trim();
    if raw.is_empty() {
        return None;
    }
    Some(resolve(base_url, raw))
}

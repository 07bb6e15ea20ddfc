// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue, REFERER};

use crate::error::{AppError, FetchError, Result};
use crate::models::HarvesterConfig;

/// Create a configured asynchronous HTTP client.
///
/// Sends a realistic client identity and locale headers; several sources
/// serve a different markup variant to unidentified clients.
pub fn build_client(config: &HarvesterConfig) -> Result<reqwest::Client> {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
        ),
    );

    let accept_language = HeaderValue::from_str(&config.accept_language)
        .map_err(|e| AppError::config(format!("invalid accept_language header: {e}")))?;
    headers.insert(ACCEPT_LANGUAGE, accept_language);

    if let Some(referer) = &config.referer {
        let referer = HeaderValue::from_str(referer)
            .map_err(|e| AppError::config(format!("invalid referer header: {e}")))?;
        headers.insert(REFERER, referer);
    }

    let client = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .default_headers(headers)
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;
    Ok(client)
}

/// Fetch a page body, mapping transport failures to the skippable error type.
pub async fn fetch_text(
    client: &reqwest::Client,
    url: &str,
) -> std::result::Result<String, FetchError> {
    let response = client.get(url).send().await?.error_for_status()?;
    Ok(response.text().await?)
}

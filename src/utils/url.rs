// src/utils/url.rs

//! URL manipulation utilities.

/// Query parameters that carry tracking state rather than identity.
/// Stripped during canonicalization so overlapping keyword searches
/// surfacing the same post through different referral paths dedup cleanly.
const VOLATILE_PARAMS: &[&str] = &[
    "ref",
    "referrer",
    "referrercode",
    "trackingcode",
    "fbclid",
    "gclid",
    "igshid",
];

fn is_volatile(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    key.starts_with("utm_") || VOLATILE_PARAMS.contains(&key.as_str())
}

/// Normalize a URL into its deduplication key.
///
/// Drops the fragment, lowercases the host, and strips known volatile
/// tracking parameters while keeping identity-bearing ones.
///
/// # Examples
/// ```
/// use harvester::utils::url::canonicalize;
///
/// assert_eq!(
///     canonicalize("https://example.com/post/123?ref=search"),
///     "https://example.com/post/123"
/// );
/// ```
pub fn canonicalize(raw: &str) -> String {
    let Ok(mut parsed) = url::Url::parse(raw.trim()) else {
        return raw.trim().to_string();
    };

    parsed.set_fragment(None);

    if let Some(host) = parsed.host_str().map(str::to_ascii_lowercase) {
        let _ = parsed.set_host(Some(&host));
    }

    let kept: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(key, _)| !is_volatile(key))
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    if kept.is_empty() {
        parsed.set_query(None);
    } else {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (key, value) in &kept {
            serializer.append_pair(key, value);
        }
        let query = serializer.finish();
        parsed.set_query(Some(&query));
    }

    parsed.to_string()
}

/// Resolve a potentially relative URL against a base URL.
///
/// # Examples
/// ```
/// use harvester::utils::url::resolve;
///
/// assert_eq!(
///     resolve("https://example.com/path/", "page.html"),
///     "https://example.com/path/page.html"
/// );
/// ```
pub fn resolve(base: &str, href: &str) -> String {
    // Already absolute
    if href.starts_with("http://") || href.starts_with("https://") {
        return href.to_string();
    }

    // Absolute path - combine with base domain
    if href.starts_with('/') {
        return resolve_absolute_path(base, href);
    }

    // Relative path - combine with base directory
    resolve_relative_path(base, href)
}

fn resolve_absolute_path(base: &str, href: &str) -> String {
    if let Some(scheme_end) = base.find("://") {
        let after_scheme = &base[scheme_end + 3..];
        if let Some(slash_idx) = after_scheme.find('/') {
            let domain = &base[..scheme_end + 3 + slash_idx];
            return format!("{domain}{href}");
        }
    }
    format!("{}{}", base.trim_end_matches('/'), href)
}

fn resolve_relative_path(base: &str, href: &str) -> String {
    let base_dir = if base.ends_with('/') {
        base.to_string()
    } else {
        match base.rfind('/') {
            Some(idx) => base[..=idx].to_string(),
            None => format!("{base}/"),
        }
    };

    format!("{base_dir}{href}")
}

/// Extract domain from a URL.
///
/// # Examples
/// ```
/// use harvester::utils::url::get_domain;
///
/// assert_eq!(
///     get_domain("https://example.com/path"),
///     Some("example.com".to_string())
/// );
/// ```
pub fn get_domain(url: &str) -> Option<String> {
    let scheme_end = url.find("://")?;
    let after_scheme = &url[scheme_end + 3..];
    let domain = after_scheme.split('/').next()?;
    Some(domain.to_lowercase())
}

/// Whether a URL's host is the given domain or one of its subdomains.
pub fn domain_matches(url: &str, domain: &str) -> bool {
    match get_domain(url) {
        Some(host) => {
            let domain = domain.to_lowercase();
            host == domain || host.ends_with(&format!(".{domain}"))
        }
        None => false,
    }
}

// src/models/search.rs

//! Search-side data structures.

/// One keyword search against one source.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    /// Keyword to search for
    pub keyword: String,

    /// Source id this query is assigned to
    pub source: String,

    /// Upper bound on result pages to request
    pub max_pages: usize,
}

/// One entry parsed from a search-result page.
///
/// Transient: converted to a `ContentRecord` or discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResultItem {
    pub title: String,

    /// Link to the post; dedup key after canonicalization
    pub url: String,

    pub snippet: String,

    pub author: String,

    /// Date text as shown on the result page (may be empty)
    pub published: String,

    /// Keyword that produced this item
    pub search_keyword: String,
}

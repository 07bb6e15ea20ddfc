// src/services/dedup.rs

//! Run-scoped URL deduplication.

use std::collections::HashSet;
use std::sync::Mutex;

use crate::utils::url::canonicalize;

/// Canonical-URL set shared by every collector in a harvest run.
///
/// Owned by the orchestrator and passed by reference; lives exactly as long
/// as one run. Check-and-insert is atomic, so concurrent keyword tasks
/// never emit the same URL twice.
#[derive(Debug, Default)]
pub struct Deduplicator {
    seen: Mutex<HashSet<String>>,
}

impl Deduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the canonical URL was already marked (caller skips);
    /// false if it was newly inserted (caller proceeds).
    pub fn seen_and_mark(&self, url: &str) -> bool {
        let key = canonicalize(url);
        !self
            .seen
            .lock()
            .expect("dedup set lock poisoned")
            .insert(key)
    }

    /// Number of distinct URLs marked so far.
    pub fn len(&self) -> usize {
        self.seen.lock().expect("dedup set lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_sighting_is_new_second_is_not() {
        let dedup = Deduplicator::new();
        assert!(!dedup.seen_and_mark("https://example.com/post/1"));
        assert!(dedup.seen_and_mark("https://example.com/post/1"));
        assert_eq!(dedup.len(), 1);
    }

    #[test]
    fn tracking_variants_collapse_to_one_key() {
        let dedup = Deduplicator::new();
        assert!(!dedup.seen_and_mark("https://example.com/post/123?ref=search"));
        assert!(dedup.seen_and_mark("https://example.com/post/123?ref=feed"));
        assert!(dedup.seen_and_mark("https://example.com/post/123"));
        assert_eq!(dedup.len(), 1);
    }

    #[test]
    fn distinct_posts_stay_distinct() {
        let dedup = Deduplicator::new();
        assert!(!dedup.seen_and_mark("https://example.com/post/1"));
        assert!(!dedup.seen_and_mark("https://example.com/post/2"));
        assert_eq!(dedup.len(), 2);
    }

    #[test]
    fn concurrent_marking_admits_each_url_once() {
        use std::sync::Arc;

        let dedup = Arc::new(Deduplicator::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let dedup = Arc::clone(&dedup);
            handles.push(std::thread::spawn(move || {
                let mut fresh = 0;
                for i in 0..100 {
                    if !dedup.seen_and_mark(&format!("https://example.com/post/{i}")) {
                        fresh += 1;
                    }
                }
                fresh
            }));
        }
        let total_fresh: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(total_fresh, 100);
        assert_eq!(dedup.len(), 100);
    }
}

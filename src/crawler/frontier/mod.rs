
use std::collections::{HashSet, VecDeque};
use url::Url;

/// Dedup key of a URL: fragment and query removed
#[inline]
pub fn normalize_url(url: &Url) -> Url {
    let mut normalized = url.clone();
    normalized.set_fragment(None);
    normalized.set_query(None);
    normalized
}

/// Pending and visited URLs of one crawl.
///
/// A URL enters `pending` only when it is neither visited nor already
/// pending, and `visited` never shrinks.
#[derive(Debug, Default)]
pub struct CrawlFrontier {
    visited: HashSet<String>,
    pending: VecDeque<Url>,
    queued: HashSet<String>,
}

impl CrawlFrontier {
    #[inline]
    pub fn new(seed: &Url) -> Self {
        let mut frontier = Self::default();
        frontier.push(seed);
        frontier
    }

    /// Queue a URL; returns false when it was already seen
    #[inline]
    pub fn push(&mut self, url: &Url) -> bool {
        let normalized = normalize_url(url);
        let key = normalized.as_str();

        if self.visited.contains(key) || self.queued.contains(key) {
            return false;
        }

        self.queued.insert(key.to_string());
        self.pending.push_back(normalized);
        true
    }

    /// Next URL that has not been visited yet, marked visited on return
    #[inline]
    pub fn next_unvisited(&mut self) -> Option<Url> {
        while let Some(url) = self.pending.pop_front() {
            self.queued.remove(url.as_str());
            if self.visited.insert(url.as_str().to_string()) {
                return Some(url);
            }
        }
        None
    }

    /// Record a URL reached without being popped, e.g. a redirect target.
    /// Returns false when it was already visited.
    #[inline]
    pub fn mark_visited(&mut self, url: &Url) -> bool {
        self.visited.insert(normalize_url(url).as_str().to_string())
    }

    #[inline]
    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    #[inline]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

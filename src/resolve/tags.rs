//! In-process cache of a repository's tag listing.
//!
//! Tag listings arrive most-recent-first, so the cache is an append-only
//! prefix of the full listing plus the page index where crawling should
//! resume. Once a tag older than a requested minor has been observed, no tag
//! for that minor remains undiscovered and lookups are answered locally.

use regex::Regex;

use crate::resolve::semver::SimpleSemver;

/// Fallback when the cache is empty: assume an arbitrarily high minor so the
/// first lookup always crawls.
const UNBOUNDED_MINOR: u64 = 9999;

#[derive(Debug, Default)]
pub struct TagCache {
    /// Tag names in listing order (most recent first).
    known: Vec<String>,
    /// Pages fully consumed so far; the next crawl resumes after them.
    full_pages: usize,
}

impl TagCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// 1-based page index the next crawl should start from.
    pub fn next_page(&self) -> usize {
        self.full_pages + 1
    }

    /// Whether a lookup for `minor` may need tags beyond the cached prefix.
    ///
    /// The oldest cached tag bounds what the cache can answer: anything at or
    /// above its minor is already covered.
    pub fn needs_update(&self, minor: u64) -> bool {
        let oldest_minor = self
            .known
            .last()
            .and_then(|tag| tag.parse::<SimpleSemver>().ok())
            .map_or(UNBOUNDED_MINOR, |version| version.minor);
        minor < oldest_minor
    }

    /// Append a tag name seen during a crawl.
    pub fn record(&mut self, name: impl Into<String>) {
        self.known.push(name.into());
    }

    /// Account for pages the crawler consumed in full.
    pub fn advance(&mut self, pages: usize) {
        self.full_pages += pages;
    }

    /// First cached tag matching `pattern`, in listing order.
    pub fn find(&self, pattern: &Regex) -> Option<&str> {
        self.known
            .iter()
            .map(String::as_str)
            .find(|name| pattern.is_match(name))
    }
}

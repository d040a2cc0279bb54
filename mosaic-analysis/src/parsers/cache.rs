//! Parse cache: Moka LRU keyed by (content_hash, language).
//! The same text parsed as different languages caches separately.

use moka::sync::Cache;

use mosaic_core::model::task::Language;

use super::types::AtomAst;

type CacheKey = (u64, Language);

/// In-memory parse cache (TinyLFU admission).
pub struct ParseCache {
    inner: Cache<CacheKey, AtomAst>,
}

impl ParseCache {
    /// Create a new parse cache with the given capacity.
    pub fn new(capacity: u64) -> Self {
        Self {
            inner: Cache::new(capacity),
        }
    }

    pub fn get(&self, content_hash: u64, lang: Language) -> Option<AtomAst> {
        self.inner.get(&(content_hash, lang))
    }

    pub fn insert(&self, content_hash: u64, lang: Language, ast: AtomAst) {
        self.inner.insert((content_hash, lang), ast);
    }

    pub fn entry_count(&self) -> u64 {
        self.inner.entry_count()
    }
}

impl Default for ParseCache {
    fn default() -> Self {
        // Default: cache up to 10,000 parse results
        Self::new(10_000)
    }
}

//! Bounded recognition cache keyed by font identity, then glyph name
//!
//! The store is an `LruCache` used in unbounded mode: capacity is enforced
//! here, not by `lru`, because eviction drops the least recently touched
//! three quarters of the fonts in one batch instead of one entry per insert.

use lru::LruCache;
use serde::Serialize;
use std::num::NonZeroUsize;
use tracing::{debug, info};

use crate::config::defaults::DEFAULT_CACHE_CAPACITY;
use crate::models::{FontIdentity, GlyphKey, GlyphResultMap, RecognizedWord};

/// Counters describing cache behaviour since construction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
    /// Fonts dropped by eviction
    pub evictions: u64,
    /// Number of times an eviction batch ran
    pub eviction_batches: u64,
}

/// Font identity -> per-font glyph results, ordered by recency of touch
pub struct RecognitionCache {
    capacity: NonZeroUsize,
    store: LruCache<FontIdentity, GlyphResultMap>,
    stats: CacheStats,
}

impl RecognitionCache {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            capacity,
            store: LruCache::unbounded(),
            stats: CacheStats {
                capacity: capacity.get(),
                ..CacheStats::default()
            },
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Whether the font is tracked, without touching its recency
    pub fn contains(&self, id: &FontIdentity) -> bool {
        self.store.contains(id)
    }

    /// Number of fonts removed by one eviction batch
    pub fn eviction_batch_size(&self) -> usize {
        (self.capacity.get() * 3 / 4).max(1)
    }

    /// Look up a recognized character for one glyph.
    ///
    /// A tracked font is promoted to most recently used even when the glyph
    /// is missing. Unknown results are not hits.
    pub fn lookup_glyph(&mut self, id: &FontIdentity, key: &GlyphKey) -> Option<char> {
        let found = self
            .store
            .get(id)
            .and_then(|words| words.get_known(key));
        match found {
            Some(_) => {
                self.stats.hits += 1;
                debug!("Cache hit for {} in {:?}", key, id);
            }
            None => {
                self.stats.misses += 1;
            }
        }
        found
    }

    /// Return a copy of everything known for a font, promoting it
    pub fn lookup_font(&mut self, id: &FontIdentity) -> Option<GlyphResultMap> {
        match self.store.get(id) {
            Some(words) => {
                self.stats.hits += 1;
                Some(words.clone())
            }
            None => {
                self.stats.misses += 1;
                None
            }
        }
    }

    /// Record the result for one glyph, creating the font entry if needed.
    ///
    /// An unknown result never replaces a word already recognized for the
    /// same glyph.
    pub fn insert_glyph(&mut self, id: FontIdentity, key: GlyphKey, word: RecognizedWord) {
        if let Some(words) = self.store.get_mut(&id) {
            let known = words.get(&key).is_some_and(|existing| existing.is_known());
            if word.is_known() || !known {
                words.insert(key, word);
            }
            return;
        }

        self.make_room();
        let mut words = GlyphResultMap::new();
        words.insert(key, word);
        self.store.push(id, words);
        self.stats.entries = self.store.len();
    }

    /// Store the results of a full-font pass and return what is now cached.
    ///
    /// If another caller stored the same font in the meantime the two maps
    /// are merged rather than one replacing the other.
    pub fn insert_font(&mut self, id: FontIdentity, words: GlyphResultMap) -> GlyphResultMap {
        if let Some(existing) = self.store.get_mut(&id) {
            existing.merge(words);
            return existing.clone();
        }

        self.make_room();
        self.store.push(id, words.clone());
        self.stats.entries = self.store.len();
        words
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.store.len(),
            ..self.stats
        }
    }

    /// Evict the oldest batch when one more font would exceed capacity
    fn make_room(&mut self) {
        if self.store.len() < self.capacity.get() {
            return;
        }

        let batch = self.eviction_batch_size();
        let mut evicted = 0;
        while evicted < batch {
            match self.store.pop_lru() {
                Some((id, words)) => {
                    debug!("Evicting {:?} ({} glyphs)", id, words.len());
                    evicted += 1;
                }
                None => break,
            }
        }

        self.stats.evictions += evicted as u64;
        self.stats.eviction_batches += 1;
        info!(
            "Recognition cache evicted {} of {} fonts (capacity {})",
            evicted,
            evicted + self.store.len(),
            self.capacity
        );
    }
}

impl Default for RecognitionCache {
    fn default() -> Self {
        let capacity = NonZeroUsize::new(DEFAULT_CACHE_CAPACITY).unwrap_or(NonZeroUsize::MIN);
        Self::new(capacity)
    }
}

impl std::fmt::Debug for RecognitionCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecognitionCache")
            .field("capacity", &self.capacity)
            .field("entries", &self.store.len())
            .finish()
    }
}

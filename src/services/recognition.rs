//! Font recognition service: the cache-fronted entry points
//!
//! Both entry points hash the font, consult the cache, and only on a miss
//! render and recognize. The cache lock is released while the renderer and
//! recognizer run; results are re-inserted under the lock afterwards, so two
//! racing callers may both do the work but never corrupt the cache.

use serde::Serialize;
use std::collections::BTreeMap;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

use super::traits::{GlyphRenderer, OpticalRecognizer};
use crate::cache::{CacheStats, RecognitionCache};
use crate::config::Config;
use crate::errors::{AppResult, FailureKind, RenderError};
use crate::models::{FontIdentity, GlyphKey, GlyphResultMap, RecognizedWord};
use crate::ocr::BaiduOcrClient;
use crate::render::{GlyphImage, OutlineGlyphRenderer};

/// Outcome counters, by failure kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ServiceStats {
    pub recognized: u64,
    pub glyph_not_found: u64,
    /// Subset of `glyph_not_found` where the font itself could not be read
    pub unreadable_fonts: u64,
    pub ambiguous: u64,
    pub provider_unavailable: u64,
    pub cache: CacheStats,
}

#[derive(Debug, Default)]
struct OutcomeCounters {
    recognized: AtomicU64,
    glyph_not_found: AtomicU64,
    unreadable_fonts: AtomicU64,
    ambiguous: AtomicU64,
    provider_unavailable: AtomicU64,
}

impl OutcomeCounters {
    fn record(&self, kind: FailureKind) {
        let counter = match kind {
            FailureKind::GlyphNotFound => &self.glyph_not_found,
            FailureKind::Ambiguous => &self.ambiguous,
            FailureKind::ProviderUnavailable => &self.provider_unavailable,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Recognizes obfuscated glyphs, remembering results per font
pub struct FontRecognitionService {
    cache: Mutex<RecognitionCache>,
    renderer: Arc<dyn GlyphRenderer>,
    recognizer: Arc<dyn OpticalRecognizer>,
    counters: OutcomeCounters,
}

impl FontRecognitionService {
    pub fn new(
        capacity: NonZeroUsize,
        renderer: Arc<dyn GlyphRenderer>,
        recognizer: Arc<dyn OpticalRecognizer>,
    ) -> Self {
        info!(
            "Font recognition service ready: capacity={} recognizer={}",
            capacity,
            recognizer.provider_name()
        );
        Self {
            cache: Mutex::new(RecognitionCache::new(capacity)),
            renderer,
            recognizer,
            counters: OutcomeCounters::default(),
        }
    }

    /// Wire the outline renderer and the Baidu client from configuration
    pub fn from_config(config: &Config) -> AppResult<Self> {
        let renderer = Arc::new(OutlineGlyphRenderer::new(&config.render));
        let recognizer = Arc::new(BaiduOcrClient::new(&config.ocr, &config.circuit_breaker)?);
        Ok(Self::new(config.cache.capacity()?, renderer, recognizer))
    }

    /// Recognize one glyph of a font.
    ///
    /// Never fails: render and recognition failures come back as
    /// [`RecognizedWord::Unknown`]. A glyph the renderer cannot produce leaves
    /// the cache untouched; an unrecognized glyph is stored as unknown and
    /// retried on the next call.
    pub async fn recognize_glyph(&self, font: &[u8], key: &GlyphKey) -> RecognizedWord {
        let id = FontIdentity::of(font);
        let cached = self.cache().lookup_glyph(&id, key);
        if let Some(c) = cached {
            return RecognizedWord::Char(c);
        }

        let image = match self.renderer.render_glyph(font, key) {
            Ok(image) => image,
            Err(e) => {
                self.render_failed(&id, Some(key), &e);
                return RecognizedWord::Unknown;
            }
        };

        let word = self.recognize_image(key, &image).await;
        self.cache().insert_glyph(id, key.clone(), word);
        word
    }

    /// Recognize every glyph the renderer can name.
    ///
    /// A font already in the cache is returned as stored, even when only a
    /// few of its glyphs were looked up individually; check
    /// [`GlyphResultMap::is_complete`] to tell the two apart. Individual
    /// glyph failures become unknown entries and never abort the batch.
    pub async fn recognize_all(&self, font: &[u8]) -> GlyphResultMap {
        let id = FontIdentity::of(font);
        let cached = self.cache().lookup_font(&id);
        if let Some(words) = cached {
            debug!("Returning cached results for {:?} ({} glyphs)", id, words.len());
            return words;
        }

        let images = match self.renderer.render_all(font) {
            Ok(images) => images,
            Err(e) => {
                self.render_failed(&id, None, &e);
                return GlyphResultMap::new();
            }
        };

        let mut words = BTreeMap::new();
        for (key, image) in images {
            let word = self.recognize_image(&key, &image).await;
            words.insert(key, word);
        }
        let words = GlyphResultMap::complete(words);
        info!(
            "Recognized {}/{} glyphs of {:?}",
            words.known_count(),
            words.len(),
            id
        );

        self.cache().insert_font(id, words)
    }

    pub fn stats(&self) -> ServiceStats {
        ServiceStats {
            recognized: self.counters.recognized.load(Ordering::Relaxed),
            glyph_not_found: self.counters.glyph_not_found.load(Ordering::Relaxed),
            unreadable_fonts: self.counters.unreadable_fonts.load(Ordering::Relaxed),
            ambiguous: self.counters.ambiguous.load(Ordering::Relaxed),
            provider_unavailable: self.counters.provider_unavailable.load(Ordering::Relaxed),
            cache: self.cache().stats(),
        }
    }

    // A panic elsewhere cannot leave the cache half-updated, so poison is ignored
    fn cache(&self) -> MutexGuard<'_, RecognitionCache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn recognize_image(&self, key: &GlyphKey, image: &GlyphImage) -> RecognizedWord {
        match self.recognizer.recognize(image).await {
            Ok(c) => {
                self.counters.recognized.fetch_add(1, Ordering::Relaxed);
                debug!("{} recognized as {:?}", key, c);
                RecognizedWord::Char(c)
            }
            Err(e) => {
                let kind = e.kind();
                self.counters.record(kind);
                match kind {
                    FailureKind::ProviderUnavailable => warn!(
                        "{} failed for {}: {}",
                        self.recognizer.provider_name(),
                        key,
                        e
                    ),
                    _ => debug!("{} unrecognized ({:?}): {}", key, kind, e),
                }
                RecognizedWord::Unknown
            }
        }
    }

    fn render_failed(&self, id: &FontIdentity, key: Option<&GlyphKey>, error: &RenderError) {
        self.counters.record(error.kind());
        if error.is_unreadable_font() {
            self.counters.unreadable_fonts.fetch_add(1, Ordering::Relaxed);
        }
        match error {
            RenderError::GlyphNotFound { .. } | RenderError::EmptyOutline { .. } => {
                debug!("Cannot render {:?} in {:?}: {}", key, id, error)
            }
            _ => warn!("Cannot render {:?} in {:?}: {}", key, id, error),
        }
    }
}

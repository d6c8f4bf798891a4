//! Recognition cache for glyph-obfuscated web fonts
//!
//! Some pages remap the code points of a downloaded font so that the text in
//! the markup differs from what is drawn. This crate renders the glyphs,
//! reads them back with an OCR provider, and caches the results per font.

pub mod cache;
pub mod config;
pub mod errors;
pub mod models;
pub mod ocr;
pub mod render;
pub mod services;
pub mod utils;

pub use cache::{CacheStats, RecognitionCache};
pub use config::Config;
pub use errors::{AppError, AppResult};
pub use models::{FontIdentity, GlyphKey, GlyphResultMap, RecognizedWord};
pub use services::{FontRecognitionService, GlyphRenderer, OpticalRecognizer};

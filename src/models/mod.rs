//! Domain types shared by the cache, the renderer and the recognizer

pub mod font_identity;
pub mod glyph;

pub use font_identity::FontIdentity;
pub use glyph::{GlyphKey, GlyphResultMap, RecognizedWord};

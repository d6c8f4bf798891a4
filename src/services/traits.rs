//! Collaborator contracts for the recognition service
//!
//! The service only knows these two seams: something that turns font bytes
//! into glyph images, and something that turns an image into a character.

use async_trait::async_trait;
use std::collections::BTreeMap;

use crate::errors::{RecognitionResult, RenderResult};
use crate::models::GlyphKey;
use crate::render::GlyphImage;

/// Rasterizes glyphs out of a font binary.
///
/// Implementations are pure: the same font bytes always produce the same
/// images.
pub trait GlyphRenderer: Send + Sync {
    /// Render one glyph by name
    ///
    /// # Returns
    ///
    /// * `Ok(GlyphImage)` - The glyph drawn black on white
    /// * `Err(RenderError::GlyphNotFound)` - No glyph with that name
    /// * `Err(RenderError)` - The font could not be read or drawn
    fn render_glyph(&self, font: &[u8], key: &GlyphKey) -> RenderResult<GlyphImage>;

    /// Render every glyph that passes the renderer's naming filter
    fn render_all(&self, font: &[u8]) -> RenderResult<BTreeMap<GlyphKey, GlyphImage>>;
}

/// Recognizes a single character in a glyph image.
///
/// Anything other than exactly one single-character candidate is an error;
/// see [`RecognitionError`](crate::errors::RecognitionError).
#[async_trait]
pub trait OpticalRecognizer: Send + Sync {
    async fn recognize(&self, image: &GlyphImage) -> RecognitionResult<char>;

    /// Provider name used in logs
    fn provider_name(&self) -> &'static str;
}

//! Glyph rasterization
//!
//! Fonts are unwrapped to sfnt (see [`woff`]), glyphs are looked up by their
//! `post`/`CFF` name with skrifa, and outlines are filled with tiny-skia into a
//! grayscale image with a white margin.

pub mod image;
mod pen;
pub mod woff;

pub use self::image::GlyphImage;
pub use woff::FontFormat;

use ::image::GrayImage;
use skrifa::instance::{LocationRef, Size};
use skrifa::outline::DrawSettings;
use skrifa::raw::FontRef;
use skrifa::{GlyphId, GlyphNames, MetadataProvider};
use std::collections::BTreeMap;
use tiny_skia::{Color, FillRule, Paint, Pixmap, Transform};
use tracing::{debug, warn};

use crate::config::RenderConfig;
use crate::errors::{RenderError, RenderResult};
use crate::models::GlyphKey;
use crate::services::GlyphRenderer;
use pen::PathPen;

/// Largest canvas edge we are willing to allocate
const MAX_CANVAS_EDGE: u32 = 4096;

/// Renders glyph outlines from TrueType, OpenType and WOFF fonts
#[derive(Debug, Clone)]
pub struct OutlineGlyphRenderer {
    pixel_size: f32,
    padding: u32,
    glyph_prefix: String,
}

impl OutlineGlyphRenderer {
    pub fn new(config: &RenderConfig) -> Self {
        Self {
            pixel_size: config.pixel_size,
            padding: config.padding,
            glyph_prefix: config.glyph_prefix.clone(),
        }
    }

    /// Names of all glyphs `render_all` would draw, in glyph order
    pub fn glyph_names(&self, font: &[u8]) -> RenderResult<Vec<GlyphKey>> {
        let sfnt = woff::to_sfnt(font)?;
        let font = parse(&sfnt)?;
        Ok(GlyphNames::new(&font)
            .iter()
            .filter(|(_, name)| name.as_str().starts_with(&self.glyph_prefix))
            .map(|(_, name)| GlyphKey::new(name.as_str()))
            .collect())
    }

    fn rasterize(&self, font: &FontRef<'_>, glyph_id: GlyphId, key: &GlyphKey) -> RenderResult<GlyphImage> {
        let outlines = font.outline_glyphs();
        let glyph = outlines.get(glyph_id).ok_or_else(|| RenderError::EmptyOutline {
            key: key.to_string(),
        })?;

        let mut pen = PathPen::new();
        let settings = DrawSettings::unhinted(Size::new(self.pixel_size), LocationRef::default());
        glyph.draw(settings, &mut pen).map_err(|e| RenderError::Rasterize {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        let path = pen.finish().ok_or_else(|| RenderError::EmptyOutline {
            key: key.to_string(),
        })?;

        let bounds = path.bounds();
        let width = (bounds.width().ceil() as u32).max(1) + 2 * self.padding;
        let height = (bounds.height().ceil() as u32).max(1) + 2 * self.padding;
        if width > MAX_CANVAS_EDGE || height > MAX_CANVAS_EDGE {
            return Err(RenderError::Rasterize {
                key: key.to_string(),
                message: format!("{width}x{height} canvas exceeds {MAX_CANVAS_EDGE}px"),
            });
        }
        let mut pixmap = Pixmap::new(width, height).ok_or_else(|| RenderError::Rasterize {
            key: key.to_string(),
            message: format!("cannot allocate {width}x{height} pixmap"),
        })?;
        pixmap.fill(Color::WHITE);

        let mut paint = Paint::default();
        paint.set_color(Color::BLACK);
        paint.anti_alias = true;
        let padding = self.padding as f32;
        let transform = Transform::from_translate(padding - bounds.left(), padding - bounds.top());
        pixmap.fill_path(&path, &paint, FillRule::Winding, transform, None);

        // Opaque grey on white: every channel carries the same value
        let gray = pixmap.data().chunks_exact(4).map(|px| px[0]).collect();
        let pixels = GrayImage::from_raw(width, height, gray).ok_or_else(|| RenderError::Rasterize {
            key: key.to_string(),
            message: "pixel buffer size mismatch".to_string(),
        })?;
        Ok(GlyphImage::new(pixels))
    }
}

impl Default for OutlineGlyphRenderer {
    fn default() -> Self {
        Self::new(&RenderConfig::default())
    }
}

impl GlyphRenderer for OutlineGlyphRenderer {
    fn render_glyph(&self, font: &[u8], key: &GlyphKey) -> RenderResult<GlyphImage> {
        let sfnt = woff::to_sfnt(font)?;
        let font = parse(&sfnt)?;
        let glyph_id = find_glyph(&font, key).ok_or_else(|| RenderError::GlyphNotFound {
            key: key.to_string(),
        })?;
        debug!("Rendering {} (glyph id {})", key, glyph_id.to_u32());
        self.rasterize(&font, glyph_id, key)
    }

    fn render_all(&self, font: &[u8]) -> RenderResult<BTreeMap<GlyphKey, GlyphImage>> {
        let sfnt = woff::to_sfnt(font)?;
        let font = parse(&sfnt)?;

        let mut images = BTreeMap::new();
        for (glyph_id, name) in GlyphNames::new(&font).iter() {
            if !name.as_str().starts_with(&self.glyph_prefix) {
                continue;
            }
            let key = GlyphKey::new(name.as_str());
            match self.rasterize(&font, glyph_id, &key) {
                Ok(image) => {
                    images.insert(key, image);
                }
                Err(RenderError::EmptyOutline { .. }) => {
                    debug!("Skipping {}: empty outline", key);
                }
                Err(e) => {
                    warn!("Skipping {}: {}", key, e);
                }
            }
        }
        debug!("Rendered {} glyphs", images.len());
        Ok(images)
    }
}

fn parse(sfnt: &[u8]) -> RenderResult<FontRef<'_>> {
    FontRef::new(sfnt).map_err(|e| RenderError::malformed(e.to_string()))
}

/// Exact name match first; page markup often lower-cases `uniXXXX` names
fn find_glyph(font: &FontRef<'_>, key: &GlyphKey) -> Option<GlyphId> {
    let mut folded = None;
    for (glyph_id, name) in GlyphNames::new(font).iter() {
        if name.as_str() == key.as_str() {
            return Some(glyph_id);
        }
        if folded.is_none() && name.as_str().eq_ignore_ascii_case(key.as_str()) {
            folded = Some(glyph_id);
        }
    }
    folded
}

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, GrayImage, ImageEncoder, ImageError};

const JPEG_QUALITY: u8 = 90;

/// A rasterized glyph: black ink on a white background
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlyphImage {
    pixels: GrayImage,
}

impl GlyphImage {
    pub fn new(pixels: GrayImage) -> Self {
        Self { pixels }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn pixels(&self) -> &GrayImage {
        &self.pixels
    }

    /// Number of pixels darker than mid grey
    pub fn ink_pixels(&self) -> usize {
        self.pixels.pixels().filter(|p| p.0[0] < 128).count()
    }

    /// Encode as baseline JPEG, the format sent to the OCR provider
    pub fn to_jpeg(&self) -> Result<Vec<u8>, ImageError> {
        let mut buffer = Vec::new();
        JpegEncoder::new_with_quality(&mut buffer, JPEG_QUALITY).write_image(
            self.pixels.as_raw(),
            self.width(),
            self.height(),
            ExtendedColorType::L8,
        )?;
        Ok(buffer)
    }

    pub fn to_png(&self) -> Result<Vec<u8>, ImageError> {
        let mut buffer = Vec::new();
        PngEncoder::new(&mut buffer).write_image(
            self.pixels.as_raw(),
            self.width(),
            self.height(),
            ExtendedColorType::L8,
        )?;
        Ok(buffer)
    }
}

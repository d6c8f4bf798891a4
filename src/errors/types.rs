//! Error type definitions for glyph recognition
//!
//! Rendering and recognition failures are kept as distinct enums so callers
//! that care (logging, statistics) can tell them apart, while the recognition
//! service collapses all of them to [`RecognizedWord::Unknown`].
//!
//! [`RecognizedWord::Unknown`]: crate::models::RecognizedWord::Unknown

use thiserror::Error;

/// Top-level application error type
///
/// Only configuration and startup paths return this; per-glyph failures never
/// escape the recognition service.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file parse errors
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Configuration file serialization errors
    #[error("Config serialization error: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    /// Glyph rendering errors
    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    /// Optical recognition errors
    #[error("Recognition error: {0}")]
    Recognition(#[from] RecognitionError),

    /// HTTP client construction errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Errors raised while turning a font binary into glyph images
#[derive(Error, Debug)]
pub enum RenderError {
    /// Container format we cannot read (e.g. WOFF2)
    #[error("Unsupported font format: {format}")]
    UnsupportedFormat { format: String },

    /// Font data could not be parsed
    #[error("Malformed font: {message}")]
    MalformedFont { message: String },

    /// WOFF table inflation failed
    #[error("WOFF decode error: {message}")]
    Woff { message: String },

    /// Requested glyph name is absent from the glyph table
    #[error("Glyph not found: {key}")]
    GlyphNotFound { key: String },

    /// Glyph exists but has no contours to draw
    #[error("Glyph has an empty outline: {key}")]
    EmptyOutline { key: String },

    /// Outline drawing or pixmap allocation failed
    #[error("Rasterization failed for {key}: {message}")]
    Rasterize { key: String, message: String },
}

/// Errors raised by an optical recognition provider
#[derive(Error, Debug)]
pub enum RecognitionError {
    /// Zero results, several results, or a multi-character result
    #[error("Ambiguous recognition: {candidates} candidate(s), text {text:?}")]
    Ambiguous {
        candidates: usize,
        text: Option<String>,
    },

    /// The provider answered with an error code
    #[error("Provider error {code}: {message}")]
    Provider { code: i64, message: String },

    /// The provider could not be reached or returned garbage
    #[error("Provider unavailable: {message}")]
    Unavailable { message: String },

    /// Outbound calls are blocked by the circuit breaker
    #[error("Provider circuit open")]
    CircuitOpen,

    /// Provider call exceeded the operation timeout
    #[error("Provider call timed out")]
    Timeout,

    /// The glyph image could not be encoded for upload
    #[error("Image encoding failed: {0}")]
    ImageEncoding(#[from] image::ImageError),
}

/// Failure taxonomy exposed to observability
///
/// Every rendering or recognition error maps onto exactly one of these.
/// A font that cannot be read at all is counted as
/// [`FailureKind::GlyphNotFound`], since no glyph can be produced from it.
/// [`RenderError::is_unreadable_font`] tells those cases apart for callers
/// that want a finer count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The glyph could not be produced from the font
    GlyphNotFound,
    /// The provider answered, but not with exactly one single character
    Ambiguous,
    /// The provider could not be reached or failed
    ProviderUnavailable,
}

impl RenderError {
    /// Create a malformed font error
    pub fn malformed<S: Into<String>>(message: S) -> Self {
        Self::MalformedFont {
            message: message.into(),
        }
    }

    /// Create a WOFF decoding error
    pub fn woff<S: Into<String>>(message: S) -> Self {
        Self::Woff {
            message: message.into(),
        }
    }

    /// Every render failure means the glyph could not be produced
    pub fn kind(&self) -> FailureKind {
        FailureKind::GlyphNotFound
    }

    /// The font itself could not be opened, as opposed to one glyph in it
    pub fn is_unreadable_font(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedFormat { .. } | Self::MalformedFont { .. } | Self::Woff { .. }
        )
    }
}

impl RecognitionError {
    /// Create an ambiguous-result error
    pub fn ambiguous(candidates: usize, text: Option<String>) -> Self {
        Self::Ambiguous { candidates, text }
    }

    /// Create a provider-unavailable error
    pub fn unavailable<S: Into<String>>(message: S) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Ambiguous { .. } => FailureKind::Ambiguous,
            Self::Provider { .. }
            | Self::Unavailable { .. }
            | Self::CircuitOpen
            | Self::Timeout
            | Self::ImageEncoding(_) => FailureKind::ProviderUnavailable,
        }
    }
}

impl AppError {
    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}

//! Recognition services
//!
//! [`FontRecognitionService`] fronts the cache; the renderer and recognizer
//! it depends on are injected through the traits in [`traits`].

pub mod recognition;
pub mod traits;

pub use recognition::{FontRecognitionService, ServiceStats};
pub use traits::{GlyphRenderer, OpticalRecognizer};

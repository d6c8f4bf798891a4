//! Centralized error handling for glyph recognition
//!
//! # Error Categories
//!
//! - **Render Errors**: unreadable font data, missing glyphs, empty outlines
//! - **Recognition Errors**: ambiguous provider answers, provider outages
//! - **Application Errors**: configuration and startup failures
//!
//! Render and recognition errors never reach callers of the recognition
//! service; they are logged, counted, and degraded to an unknown result.
//!
//! # Usage
//!
//! ```rust
//! use glyph_ocr::errors::{AppError, AppResult};
//!
//! fn example_function() -> AppResult<u32> {
//!     Err(AppError::configuration("cache capacity must be positive"))
//! }
//! ```

pub mod types;

pub use types::*;

/// Convenience type alias for Results using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Convenience type alias for renderer Results
pub type RenderResult<T> = Result<T, RenderError>;

/// Convenience type alias for recognizer Results
pub type RecognitionResult<T> = Result<T, RecognitionError>;

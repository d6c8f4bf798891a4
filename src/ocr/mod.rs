//! Optical recognition provider
//!
//! The only shipped provider is Baidu AIP OCR. A fast `general_basic` pass is
//! tried first; when it does not come back with exactly one single-character
//! result the image is sent to `accurate_basic`.

pub mod baidu;
pub mod response;

pub use baidu::{BaiduOcrClient, OcrEndpoint};
pub use response::{OcrResponse, TokenResponse, WordsResult};

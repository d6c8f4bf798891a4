/// Configuration default values
///
/// This module contains all the default values for configuration options,
/// making them easily changeable in one central location.
// Cache defaults
pub const DEFAULT_CACHE_CAPACITY: usize = 100;

// Render defaults
pub const DEFAULT_PIXEL_SIZE: f32 = 48.0;
pub const DEFAULT_PADDING: u32 = 24;
pub const DEFAULT_GLYPH_PREFIX: &str = "uni";

// OCR provider defaults
pub const DEFAULT_OCR_BASE_URL: &str = "https://aip.baidubce.com";
pub const DEFAULT_LANGUAGE_TYPE: &str = "CHN_ENG";
pub const DEFAULT_DETECT_LANGUAGE: bool = false;
pub const DEFAULT_ACCURATE_FALLBACK: bool = true;
pub const DEFAULT_REQUEST_TIMEOUT: &str = "10s";

// Circuit breaker defaults
pub const DEFAULT_FAILURE_THRESHOLD: u32 = 5;
pub const DEFAULT_OPERATION_TIMEOUT: &str = "10s";
pub const DEFAULT_RESET_TIMEOUT: &str = "60s";
pub const DEFAULT_SUCCESS_THRESHOLD: u32 = 2;

// Environment overrides for provider credentials
pub const ENV_API_KEY: &str = "BAIDU_OCR_API_KEY";
pub const ENV_SECRET_KEY: &str = "BAIDU_OCR_SECRET_KEY";

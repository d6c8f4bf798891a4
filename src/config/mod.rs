use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::errors::{AppError, AppResult};

pub mod defaults;

use defaults::*;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub ocr: OcrConfig,
    #[serde(default)]
    pub circuit_breaker: CircuitBreakerConfig,
}

/// Recognition cache sizing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum number of distinct fonts tracked
    #[serde(default = "default_cache_capacity")]
    pub capacity: usize,
}

/// Glyph rasterization settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Pixels per em used when drawing outlines
    #[serde(default = "default_pixel_size")]
    pub pixel_size: f32,
    /// White border around the glyph, in pixels
    #[serde(default = "default_padding")]
    pub padding: u32,
    /// Only glyphs whose name starts with this prefix are rendered in bulk
    #[serde(default = "default_glyph_prefix")]
    pub glyph_prefix: String,
}

/// Baidu AIP OCR provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub secret_key: String,
    #[serde(default = "default_ocr_base_url")]
    pub base_url: String,
    /// Recognition language, e.g. `CHN_ENG` or `ENG`
    #[serde(default = "default_language_type")]
    pub language_type: String,
    #[serde(default = "default_detect_language")]
    pub detect_language: bool,
    /// Retry with the high accuracy endpoint when the fast pass is ambiguous
    #[serde(default = "default_accurate_fallback")]
    pub accurate_fallback: bool,
    #[serde(default = "default_request_timeout")]
    pub request_timeout: String,
}

/// Circuit breaker guarding outbound provider calls
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircuitBreakerConfig {
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,
    #[serde(default = "default_operation_timeout")]
    pub operation_timeout: String,
    #[serde(default = "default_reset_timeout")]
    pub reset_timeout: String,
    #[serde(default = "default_success_threshold")]
    pub success_threshold: u32,
}

fn default_cache_capacity() -> usize {
    DEFAULT_CACHE_CAPACITY
}

fn default_pixel_size() -> f32 {
    DEFAULT_PIXEL_SIZE
}

fn default_padding() -> u32 {
    DEFAULT_PADDING
}

fn default_glyph_prefix() -> String {
    DEFAULT_GLYPH_PREFIX.to_string()
}

fn default_ocr_base_url() -> String {
    DEFAULT_OCR_BASE_URL.to_string()
}

fn default_language_type() -> String {
    DEFAULT_LANGUAGE_TYPE.to_string()
}

fn default_detect_language() -> bool {
    DEFAULT_DETECT_LANGUAGE
}

fn default_accurate_fallback() -> bool {
    DEFAULT_ACCURATE_FALLBACK
}

fn default_request_timeout() -> String {
    DEFAULT_REQUEST_TIMEOUT.to_string()
}

fn default_failure_threshold() -> u32 {
    DEFAULT_FAILURE_THRESHOLD
}

fn default_operation_timeout() -> String {
    DEFAULT_OPERATION_TIMEOUT.to_string()
}

fn default_reset_timeout() -> String {
    DEFAULT_RESET_TIMEOUT.to_string()
}

fn default_success_threshold() -> u32 {
    DEFAULT_SUCCESS_THRESHOLD
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: default_cache_capacity(),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            pixel_size: default_pixel_size(),
            padding: default_padding(),
            glyph_prefix: default_glyph_prefix(),
        }
    }
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            secret_key: String::new(),
            base_url: default_ocr_base_url(),
            language_type: default_language_type(),
            detect_language: default_detect_language(),
            accurate_fallback: default_accurate_fallback(),
            request_timeout: default_request_timeout(),
        }
    }
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: default_failure_threshold(),
            operation_timeout: default_operation_timeout(),
            reset_timeout: default_reset_timeout(),
            success_threshold: default_success_threshold(),
        }
    }
}

impl CacheConfig {
    pub fn capacity(&self) -> AppResult<NonZeroUsize> {
        NonZeroUsize::new(self.capacity)
            .ok_or_else(|| AppError::configuration("cache.capacity must be at least 1"))
    }
}

impl OcrConfig {
    pub fn request_timeout(&self) -> AppResult<Duration> {
        parse_duration("ocr.request_timeout", &self.request_timeout)
    }

    /// Whether both halves of the client credentials are present
    pub fn has_credentials(&self) -> bool {
        !self.api_key.trim().is_empty() && !self.secret_key.trim().is_empty()
    }
}

impl CircuitBreakerConfig {
    pub fn operation_timeout(&self) -> AppResult<Duration> {
        parse_duration("circuit_breaker.operation_timeout", &self.operation_timeout)
    }

    pub fn reset_timeout(&self) -> AppResult<Duration> {
        parse_duration("circuit_breaker.reset_timeout", &self.reset_timeout)
    }
}

fn parse_duration(field: &str, value: &str) -> AppResult<Duration> {
    humantime::parse_duration(value)
        .map_err(|e| AppError::configuration(format!("{field}: invalid duration '{value}': {e}")))
}

impl Config {
    pub fn load() -> AppResult<Self> {
        let config_file =
            std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".to_string());
        Self::load_from_file(&config_file)
    }

    pub fn load_from_file(config_file: &str) -> AppResult<Self> {
        let mut config = if Path::new(&config_file).exists() {
            let contents = std::fs::read_to_string(config_file)?;
            toml::from_str(&contents)?
        } else {
            let default_config = Self::default();
            let contents = toml::to_string_pretty(&default_config)?;
            std::fs::write(config_file, contents)?;
            info!("Created default config file: {}", config_file);
            default_config
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Credentials from the environment win over the config file
    pub fn apply_env_overrides(&mut self) {
        if let Ok(api_key) = std::env::var(ENV_API_KEY) {
            self.ocr.api_key = api_key;
        }
        if let Ok(secret_key) = std::env::var(ENV_SECRET_KEY) {
            self.ocr.secret_key = secret_key;
        }
    }

    /// Reject values that would make the service unusable.
    ///
    /// Missing provider credentials are checked when the client is built,
    /// so renderer-only use stays possible.
    pub fn validate(&self) -> AppResult<()> {
        self.cache.capacity()?;
        if !(self.render.pixel_size.is_finite() && self.render.pixel_size > 0.0) {
            return Err(AppError::configuration(format!(
                "render.pixel_size must be positive, got {}",
                self.render.pixel_size
            )));
        }
        self.ocr.request_timeout()?;
        self.circuit_breaker.operation_timeout()?;
        self.circuit_breaker.reset_timeout()?;
        if self.circuit_breaker.failure_threshold == 0 {
            return Err(AppError::configuration(
                "circuit_breaker.failure_threshold must be at least 1",
            ));
        }
        Ok(())
    }
}

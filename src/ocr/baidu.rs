use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use reqwest::Client;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::response::{OcrResponse, TokenResponse};
use crate::config::{CircuitBreakerConfig, OcrConfig};
use crate::errors::{AppError, AppResult, RecognitionError, RecognitionResult};
use crate::render::GlyphImage;
use crate::services::OpticalRecognizer;
use crate::utils::{CircuitBreaker, CircuitBreakerError, CircuitBreakerSettings};

/// Tokens are refreshed this long before the provider says they expire
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(300);

/// Recognition endpoint to call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OcrEndpoint {
    /// `general_basic`: fast, lower accuracy
    General,
    /// `accurate_basic`: slower, used as a second opinion
    Accurate,
}

impl OcrEndpoint {
    pub fn path(self) -> &'static str {
        match self {
            Self::General => "/rest/2.0/ocr/v1/general_basic",
            Self::Accurate => "/rest/2.0/ocr/v1/accurate_basic",
        }
    }
}

#[derive(Debug, Clone)]
struct AccessToken {
    value: String,
    refresh_at: Instant,
}

impl AccessToken {
    fn new(value: String, expires_in: u64) -> Self {
        let lifetime = Duration::from_secs(expires_in).saturating_sub(TOKEN_EXPIRY_MARGIN);
        Self {
            value,
            refresh_at: Instant::now() + lifetime,
        }
    }

    fn is_fresh(&self) -> bool {
        Instant::now() < self.refresh_at
    }
}

/// Baidu AIP OCR client
///
/// Holds an OAuth access token shared by all callers and routes every HTTP
/// call through a circuit breaker.
pub struct BaiduOcrClient {
    client: Client,
    base_url: String,
    api_key: String,
    secret_key: String,
    language_type: String,
    detect_language: bool,
    accurate_fallback: bool,
    token: RwLock<Option<AccessToken>>,
    breaker: CircuitBreaker,
}

impl BaiduOcrClient {
    /// Build a client from configuration
    ///
    /// # Errors
    ///
    /// * `AppError::Configuration` - API key or secret key missing, or a bad
    ///   duration string
    /// * `AppError::Http` - The HTTP client could not be built
    pub fn new(config: &OcrConfig, breaker: &CircuitBreakerConfig) -> AppResult<Self> {
        if !config.has_credentials() {
            return Err(AppError::configuration(
                "OCR api_key and secret_key are required",
            ));
        }

        let client = Client::builder()
            .timeout(config.request_timeout()?)
            .build()?;

        info!(
            "Baidu OCR client ready: base_url={} language_type={} accurate_fallback={}",
            config.base_url, config.language_type, config.accurate_fallback
        );

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            secret_key: config.secret_key.clone(),
            language_type: config.language_type.clone(),
            detect_language: config.detect_language,
            accurate_fallback: config.accurate_fallback,
            token: RwLock::new(None),
            breaker: CircuitBreaker::new("baidu_ocr", CircuitBreakerSettings::from_config(breaker)?),
        })
    }

    pub fn circuit_breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    async fn access_token(&self) -> RecognitionResult<String> {
        if let Some(token) = self.token.read().await.as_ref().filter(|t| t.is_fresh()) {
            return Ok(token.value.clone());
        }

        let mut guard = self.token.write().await;
        // Another caller may have refreshed while we waited for the lock
        if let Some(token) = guard.as_ref().filter(|t| t.is_fresh()) {
            return Ok(token.value.clone());
        }

        let token = self.fetch_token().await?;
        let value = token.value.clone();
        *guard = Some(token);
        Ok(value)
    }

    async fn invalidate_token(&self) {
        *self.token.write().await = None;
    }

    async fn fetch_token(&self) -> RecognitionResult<AccessToken> {
        debug!("Requesting Baidu OCR access token");
        let url = format!("{}/oauth/2.0/token", self.base_url);
        let params = [
            ("grant_type", "client_credentials"),
            ("client_id", self.api_key.as_str()),
            ("client_secret", self.secret_key.as_str()),
        ];

        let outcome = self
            .breaker
            .execute(|| async {
                let response = self.client.post(&url).query(&params).send().await?;
                response.json::<TokenResponse>().await
            })
            .await;

        let (value, expires_in) = guarded(outcome.result)?.into_token()?;
        debug!("Access token valid for {}s", expires_in);
        Ok(AccessToken::new(value, expires_in))
    }

    /// One recognition request; a rejected token is refreshed and retried once
    async fn call(&self, endpoint: OcrEndpoint, image: &str) -> RecognitionResult<OcrResponse> {
        let url = format!("{}{}", self.base_url, endpoint.path());
        let detect_language = if self.detect_language { "true" } else { "false" };
        let form = [
            ("image", image),
            ("language_type", self.language_type.as_str()),
            ("detect_language", detect_language),
        ];

        let mut retried = false;
        loop {
            let token = self.access_token().await?;
            let outcome = self
                .breaker
                .execute(|| async {
                    let response = self
                        .client
                        .post(&url)
                        .query(&[("access_token", token.as_str())])
                        .form(&form)
                        .send()
                        .await?;
                    response.json::<OcrResponse>().await
                })
                .await;

            let response = guarded(outcome.result)?;
            debug!(
                "{:?} answered in {:?}: log_id={:?} results={:?}",
                endpoint, outcome.execution_time, response.log_id, response.words_result_num
            );

            if response.is_token_error() {
                self.invalidate_token().await;
                if !retried {
                    warn!("Access token rejected ({:?}), refreshing", response.error_msg);
                    retried = true;
                    continue;
                }
            }
            return Ok(response);
        }
    }
}

#[async_trait]
impl OpticalRecognizer for BaiduOcrClient {
    async fn recognize(&self, image: &GlyphImage) -> RecognitionResult<char> {
        let encoded = STANDARD.encode(image.to_jpeg()?);

        match self.call(OcrEndpoint::General, &encoded).await?.single_character() {
            Err(RecognitionError::Ambiguous { candidates, text }) if self.accurate_fallback => {
                debug!(
                    "Fast pass ambiguous ({} candidates, {:?}), trying accurate pass",
                    candidates, text
                );
                self.call(OcrEndpoint::Accurate, &encoded)
                    .await?
                    .single_character()
            }
            result => result,
        }
    }

    fn provider_name(&self) -> &'static str {
        "baidu_ocr"
    }
}

fn guarded<T>(result: Result<T, CircuitBreakerError<reqwest::Error>>) -> RecognitionResult<T> {
    result.map_err(|e| match e {
        CircuitBreakerError::CircuitOpen => RecognitionError::CircuitOpen,
        CircuitBreakerError::Timeout => RecognitionError::Timeout,
        CircuitBreakerError::ServiceError(e) => RecognitionError::unavailable(e.to_string()),
    })
}

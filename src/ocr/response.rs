//! Wire types for the Baidu AIP OCR endpoints

use serde::Deserialize;

use crate::errors::{RecognitionError, RecognitionResult};

/// `/oauth/2.0/token` response body
///
/// Successful responses carry `access_token`; rejected credentials come back
/// as `error`/`error_description` with a 401.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: Option<String>,
    /// Lifetime in seconds
    pub expires_in: Option<u64>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

impl TokenResponse {
    pub fn into_token(self) -> RecognitionResult<(String, u64)> {
        match (self.access_token, self.error) {
            (Some(token), None) => Ok((token, self.expires_in.unwrap_or(0))),
            (_, error) => Err(RecognitionError::unavailable(format!(
                "token request rejected: {} ({})",
                error.unwrap_or_else(|| "no access token".to_string()),
                self.error_description.unwrap_or_default()
            ))),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WordsResult {
    pub words: String,
}

/// Body returned by `general_basic` and `accurate_basic`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OcrResponse {
    pub log_id: Option<u64>,
    pub words_result_num: Option<usize>,
    #[serde(default)]
    pub words_result: Vec<WordsResult>,
    pub error_code: Option<i64>,
    pub error_msg: Option<String>,
}

impl OcrResponse {
    /// Token expired or invalid; the caller should fetch a new one
    pub fn is_token_error(&self) -> bool {
        matches!(self.error_code, Some(110) | Some(111))
    }

    /// Accept only a single result containing a single character
    pub fn single_character(&self) -> RecognitionResult<char> {
        if let Some(code) = self.error_code {
            return Err(RecognitionError::Provider {
                code,
                message: self.error_msg.clone().unwrap_or_default(),
            });
        }

        let text = match self.words_result.as_slice() {
            [] => return Err(RecognitionError::ambiguous(0, None)),
            [only] => only.words.trim(),
            many => {
                let joined = many.iter().map(|w| w.words.as_str()).collect::<Vec<_>>().join(" ");
                return Err(RecognitionError::ambiguous(many.len(), Some(joined)));
            }
        };

        let mut chars = text.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => Err(RecognitionError::ambiguous(1, Some(text.to_string()))),
        }
    }
}

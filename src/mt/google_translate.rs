//! Google Translate API provider for machine translation
//!
//! This module integrates with Google Translate API v2 to provide real
//! machine translation capabilities.
//!
//! # Authentication
//!
//! The provider takes an explicit API key (normally read from the
//! credentials file) or loads it from the `GOOGLE_TRANSLATE_API_KEY`
//! environment variable. Obtain a key from:
//! https://console.cloud.google.com/
//!
//! # Error policy
//!
//! A body that is not JSON is always a [`MtError::ParseError`]. A non-success
//! status is logged and the translation is still extracted if the body carries
//! one; only when it does not is the call failed with [`MtError::ApiError`].

use crate::mt::error::{MtError, MtResult};
use crate::mt::translator::{TextTranslator, validate_locale};
use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::{debug, warn};

/// Google Translate API v2 provider
#[derive(Clone)]
pub struct GoogleTranslateProvider {
    /// API key for authentication
    api_key: String,
    /// HTTP client for async requests
    client: reqwest::Client,
    /// Base URL for Google Translate API
    base_url: String,
}

impl GoogleTranslateProvider {
    /// Maximum characters per string (30KB per Google Translate API limits)
    const MAX_CHARS_PER_STRING: usize = 30_000;

    /// Create a new GoogleTranslateProvider with an explicit API key
    ///
    /// # Returns
    ///
    /// * `Ok(Self)` - New provider instance
    /// * `Err(MtError)` - If API key is empty or HTTP client creation fails
    pub fn new(api_key: String) -> MtResult<Self> {
        if api_key.trim().is_empty() {
            return Err(MtError::ConfigError("API key cannot be empty".to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| MtError::NetworkError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            api_key: api_key.trim().to_string(),
            client,
            base_url: "https://translation.googleapis.com/language/translate/v2".to_string(),
        })
    }

    /// Create a GoogleTranslateProvider from the `GOOGLE_TRANSLATE_API_KEY` environment variable
    pub fn from_env() -> MtResult<Self> {
        let api_key = std::env::var("GOOGLE_TRANSLATE_API_KEY").map_err(|_| {
            MtError::ConfigError(
                "GOOGLE_TRANSLATE_API_KEY environment variable not set".to_string(),
            )
        })?;

        Self::new(api_key)
    }

    /// Point the provider at a different endpoint (proxies, test servers)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Language codes are sent as given, only trimmed and lowercased, so
    /// regional variants such as `zh-tw` or `pt-pt` reach the API intact.
    fn request_body(text: &str, source_lang: Option<&str>, target_lang: Option<&str>) -> Value {
        let code = |lang: &str| lang.trim().to_lowercase();
        json!({
            "q": [text],
            "source": source_lang.map(code),
            "target": target_lang.map(code),
            "format": "text",
            "model": "base"
        })
    }
}

/// Pull `data.translations[0].translatedText` out of a v2 response body
pub(crate) fn extract_translation(body: &Value) -> Option<String> {
    body["data"]["translations"]
        .as_array()?
        .first()?
        .get("translatedText")?
        .as_str()
        .map(str::to_string)
}

/// Best description of a v2 error body: `error.message`, then `error.details`
pub(crate) fn api_error_message(body: &Value) -> String {
    let error = &body["error"];
    if let Some(message) = error["message"].as_str() {
        return message.to_string();
    }
    if !error["details"].is_null() {
        return error["details"].to_string();
    }
    "Unknown error".to_string()
}

impl std::fmt::Debug for GoogleTranslateProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleTranslateProvider")
            .field("api_key", &"***")
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[async_trait]
impl TextTranslator for GoogleTranslateProvider {
    async fn translate(
        &self,
        text: &str,
        source_lang: Option<&str>,
        target_lang: Option<&str>,
    ) -> MtResult<String> {
        if let Some(source) = source_lang {
            validate_locale(source)?;
        }
        if let Some(target) = target_lang {
            validate_locale(target)?;
        }

        if text.is_empty() {
            return Ok(String::new());
        }

        if text.chars().count() > Self::MAX_CHARS_PER_STRING {
            return Err(MtError::TranslationError(format!(
                "Text exceeds maximum length of {} characters",
                Self::MAX_CHARS_PER_STRING
            )));
        }

        let url = format!("{}?key={}", self.base_url, self.api_key);
        let body = Self::request_body(text, source_lang, target_lang);

        let response = self.client.post(&url).json(&body).send().await?;
        let status = response.status();
        let raw = response.text().await?;

        let json: Value = serde_json::from_str(&raw).map_err(|e| {
            MtError::ParseError(format!("HTTP {} with non-JSON body ({}): {}", status, e, raw))
        })?;

        if !status.is_success() {
            warn!(
                status = status.as_u16(),
                message = %api_error_message(&json),
                "translation request rejected"
            );
        }

        match extract_translation(&json) {
            Some(translation) => {
                debug!(source = text, translation = %translation, "translated");
                Ok(translation)
            }
            None if !status.is_success() => Err(MtError::ApiError {
                status: status.as_u16(),
                message: api_error_message(&json),
            }),
            None => Err(MtError::ParseError(
                "Invalid API response: missing 'data.translations[0].translatedText'".to_string(),
            )),
        }
    }

    fn provider_name(&self) -> &str {
        "Google Translate"
    }
}

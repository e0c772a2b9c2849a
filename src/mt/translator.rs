//! Machine Translation trait and utilities
//!
//! This module defines the `TextTranslator` trait for provider abstraction,
//! so the sync engine can run against Google Translate in production and a
//! deterministic mock in tests.
//!
//! # Example
//!
//! ```ignore
//! use notion_translate::mt::{TextTranslator, GoogleTranslateProvider};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = GoogleTranslateProvider::from_env()?;
//!
//!     // Source may be omitted to let the provider detect it
//!     let result = provider.translate("Hello, world!", None, Some("fr")).await?;
//!     println!("{}", result); // "Bonjour, le monde!"
//!
//!     Ok(())
//! }
//! ```

use crate::mt::error::{MtError, MtResult};
use async_trait::async_trait;

/// Generic trait for machine translation providers
///
/// Implementations of this trait handle the actual translation work,
/// whether through an API (Google Translate) or deterministic logic (Mock).
#[async_trait]
pub trait TextTranslator: Send + Sync {
    /// Translate a single text string from source to target language
    ///
    /// # Arguments
    ///
    /// * `text` - The text to translate
    /// * `source_lang` - Source language code, `None` to auto-detect
    /// * `target_lang` - Target language code
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - The translated text
    /// * `Err(MtError)` - If translation fails. `MtError::ParseError` means the
    ///   provider answered with something that is not a translation.
    async fn translate(
        &self,
        text: &str,
        source_lang: Option<&str>,
        target_lang: Option<&str>,
    ) -> MtResult<String>;

    /// Get the name of this translation provider
    ///
    /// Used for logging to identify which provider handled a translation.
    fn provider_name(&self) -> &str;
}

/// Validate that a language code is in acceptable format
///
/// Checks that the code contains only alphanumeric characters,
/// hyphens, and underscores (following ISO 639 conventions).
pub fn validate_locale(locale: &str) -> MtResult<()> {
    if locale.trim().is_empty() {
        return Err(MtError::InvalidLocale("Locale code is empty".to_string()));
    }

    if !locale
        .trim()
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(MtError::InvalidLocale(format!(
            "Invalid characters in locale code: {}",
            locale
        )));
    }

    Ok(())
}

//! Mock Machine Translator for testing
//!
//! This module provides a deterministic, API-free translator for exercising
//! the sync engine without API keys or network access. It also counts calls,
//! which is how tests observe that an up-to-date node was left alone.
//!
//! # Example
//!
//! ```ignore
//! use notion_translate::mt::{TextTranslator, MockTranslator, MockMode};
//!
//! #[tokio::test]
//! async fn test_translation() {
//!     let mock = MockTranslator::new(MockMode::Suffix);
//!     let result = mock.translate("hello", Some("en"), Some("fr")).await.unwrap();
//!     assert_eq!(result, "hello_fr");
//! }
//! ```

use crate::mt::error::{MtError, MtResult};
use crate::mt::translator::TextTranslator;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Mock translation modes for testing different scenarios
#[derive(Debug, Clone)]
pub enum MockMode {
    /// Append target suffix: "hello" → "hello_fr"
    Suffix,

    /// Use predefined mappings: text → translation, falling back to `Suffix`
    Mappings(HashMap<String, String>),

    /// Every input translates to the same string
    Fixed(String),

    /// Simulate provider errors
    Error(MtError),

    /// No-op: return input unchanged
    NoOp,
}

/// Mock translator that simulates various translation scenarios
#[derive(Debug)]
pub struct MockTranslator {
    mode: MockMode,
    calls: AtomicUsize,
}

impl MockTranslator {
    pub fn new(mode: MockMode) -> Self {
        Self {
            mode,
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of `translate` calls made so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn apply_translation(&self, text: &str, target: Option<&str>) -> MtResult<String> {
        let target = target.unwrap_or("xx");
        match &self.mode {
            MockMode::Suffix => Ok(format!("{}_{}", text, target)),
            MockMode::Mappings(map) => Ok(map
                .get(text)
                .cloned()
                .unwrap_or_else(|| format!("{}_{}", text, target))),
            MockMode::Fixed(output) => Ok(output.clone()),
            MockMode::Error(err) => Err(err.clone()),
            MockMode::NoOp => Ok(text.to_string()),
        }
    }
}

#[async_trait]
impl TextTranslator for MockTranslator {
    async fn translate(
        &self,
        text: &str,
        _source_lang: Option<&str>,
        target_lang: Option<&str>,
    ) -> MtResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.apply_translation(text, target_lang)
    }

    fn provider_name(&self) -> &str {
        "Mock Translator"
    }
}

/*!
 * Translation dispatcher.
 *
 * For every extracted text run: detect the source language, pick the target
 * language, and translate. Calls run concurrently but each run holds a
 * permit from a job-wide semaphore for the duration of its API calls.
 * Failures never abort the job: the run keeps its original text and is
 * tagged `Fallback`.
 */

use futures::future::join_all;
use log::{debug, warn};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Semaphore;

use crate::language_utils::TargetLanguage;
use crate::providers::TranslationProvider;

use super::cache::TranslationCache;
use super::extractor::TextElement;

/// Outcome of translating one text run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementStatus {
    /// Translated text was produced
    Translated,
    /// Translation failed; the original text is kept
    Fallback,
    /// The translated text could not be written back
    Failed,
}

/// A text run together with its translation
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslatedElement {
    #[serde(flatten)]
    pub element: TextElement,

    pub original_text: String,

    pub translated_text: String,

    /// Detected (or fallback) source language
    pub source_language: String,

    /// Language the run was translated into
    pub target_language: String,

    pub status: ElementStatus,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TranslatedElement {
    /// Whether writing this element back would change the slide
    pub fn changes_text(&self) -> bool {
        self.status == ElementStatus::Translated && self.translated_text != self.original_text
    }
}

/// Runs detection and translation for text runs against one provider
#[derive(Clone)]
pub struct TranslationDispatcher {
    provider: Arc<dyn TranslationProvider>,
    semaphore: Arc<Semaphore>,
    cache: TranslationCache,
    fallback_language: String,
}

impl TranslationDispatcher {
    /// Create a dispatcher allowing `max_concurrent_requests` runs in flight
    pub fn new(
        provider: Arc<dyn TranslationProvider>,
        max_concurrent_requests: usize,
        cache: TranslationCache,
        fallback_language: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            semaphore: Arc::new(Semaphore::new(max_concurrent_requests.max(1))),
            cache,
            fallback_language: fallback_language.into(),
        }
    }

    pub fn cache(&self) -> &TranslationCache {
        &self.cache
    }

    /// Detect the language of `text`, using the fallback language on failure
    pub async fn detect_language(&self, text: &str) -> String {
        match self.provider.detect_language(text).await {
            Ok(detection) if !detection.language.is_empty() => detection.language,
            Ok(_) => self.fallback_language.clone(),
            Err(e) => {
                warn!("Language detection failed, assuming '{}': {}", self.fallback_language, e);
                self.fallback_language.clone()
            }
        }
    }

    /// Detect and translate a single run
    pub async fn translate_element(&self, element: TextElement, target: &TargetLanguage) -> TranslatedElement {
        let _permit = self.semaphore.acquire().await;

        let original_text = element.text.clone();
        let source_language = self.detect_language(&original_text).await;
        let target_language = target.resolve(&source_language);

        if let Some(cached) = self.cache.get(&original_text, &source_language, &target_language) {
            return TranslatedElement {
                element,
                original_text,
                translated_text: cached,
                source_language,
                target_language,
                status: ElementStatus::Translated,
                error: None,
            };
        }

        let result = self
            .provider
            .translate(&original_text, Some(&source_language), &target_language)
            .await;

        match result {
            Ok(translated_text) => {
                debug!("Translated {} -> {}: '{}'", source_language, target_language, original_text);
                self.cache.store(&original_text, &source_language, &target_language, &translated_text);
                TranslatedElement {
                    element,
                    original_text,
                    translated_text,
                    source_language,
                    target_language,
                    status: ElementStatus::Translated,
                    error: None,
                }
            }
            Err(e) => {
                warn!("Translation failed for '{}', keeping original text: {}", original_text, e);
                TranslatedElement {
                    element,
                    translated_text: original_text.clone(),
                    original_text,
                    source_language,
                    target_language,
                    status: ElementStatus::Fallback,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    /// Translate all runs concurrently, preserving input order
    pub async fn translate_elements(
        &self,
        elements: Vec<TextElement>,
        target: &TargetLanguage,
    ) -> Vec<TranslatedElement> {
        join_all(
            elements
                .into_iter()
                .map(|element| self.translate_element(element, target)),
        )
        .await
    }
}

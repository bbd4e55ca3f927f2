/*!
 * Mock provider implementations for testing.
 *
 * This module provides mock providers that simulate different behaviors:
 * - `MockTranslator::working()` - Always succeeds with translated text
 * - `MockTranslator::failing()` - Translation always fails
 * - `MockTranslator::detect_failing()` - Detection fails, translation works
 * - `MockSlides` - Serves a fixed presentation and records batch updates
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::errors::ProviderError;
use crate::presentation::{BatchUpdateResponse, Presentation, UpdateRequest};
use crate::providers::{Detection, PresentationProvider, TranslationProvider};

/// Behavior mode for the mock translator
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds with a proper translation
    Working,
    /// Translation always fails with an error
    Failing,
    /// Detection fails, translation succeeds
    DetectFailing,
    /// Translation fails on every Nth request
    Intermittent { fail_every: usize },
    /// Simulates slow responses
    Slow { delay_ms: u64 },
}

/// Mock translation provider
#[derive(Debug)]
pub struct MockTranslator {
    behavior: MockBehavior,
    detect_calls: AtomicUsize,
    translate_calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    custom_detection: Option<fn(&str) -> String>,
    custom_translation: Option<fn(&str, &str) -> String>,
}

impl MockTranslator {
    /// Create a new mock translator with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            detect_calls: AtomicUsize::new(0),
            translate_calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            custom_detection: None,
            custom_translation: None,
        }
    }

    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    pub fn detect_failing() -> Self {
        Self::new(MockBehavior::DetectFailing)
    }

    pub fn intermittent(fail_every: usize) -> Self {
        Self::new(MockBehavior::Intermittent { fail_every })
    }

    pub fn slow(delay_ms: u64) -> Self {
        Self::new(MockBehavior::Slow { delay_ms })
    }

    /// Override language detection
    pub fn with_detection(mut self, detect: fn(&str) -> String) -> Self {
        self.custom_detection = Some(detect);
        self
    }

    /// Override translation output; receives `(text, target_language)`
    pub fn with_translation(mut self, translate: fn(&str, &str) -> String) -> Self {
        self.custom_translation = Some(translate);
        self
    }

    pub fn detect_calls(&self) -> usize {
        self.detect_calls.load(Ordering::SeqCst)
    }

    pub fn translate_calls(&self) -> usize {
        self.translate_calls.load(Ordering::SeqCst)
    }

    /// Highest number of simultaneous translate calls observed
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Default detection: any CJK character means Chinese
    pub fn guess_language(text: &str) -> String {
        let has_cjk = text
            .chars()
            .any(|c| ('\u{4e00}'..='\u{9fff}').contains(&c));
        let language = if has_cjk { "zh-CN" } else { "en" };
        language.to_string()
    }
}

#[async_trait]
impl TranslationProvider for MockTranslator {
    async fn detect_language(&self, text: &str) -> Result<Detection, ProviderError> {
        self.detect_calls.fetch_add(1, Ordering::SeqCst);

        if self.behavior == MockBehavior::DetectFailing {
            return Err(ProviderError::ConnectionError("Simulated detection failure".into()));
        }

        let language = match self.custom_detection {
            Some(detect) => detect(text),
            None => Self::guess_language(text),
        };
        Ok(Detection::new(language))
    }

    async fn translate(
        &self,
        text: &str,
        _source_language: Option<&str>,
        target_language: &str,
    ) -> Result<String, ProviderError> {
        let count = self.translate_calls.fetch_add(1, Ordering::SeqCst) + 1;
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        let delay = match self.behavior {
            MockBehavior::Slow { delay_ms } => delay_ms,
            _ => 5,
        };
        tokio::time::sleep(Duration::from_millis(delay)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match self.behavior {
            MockBehavior::Failing => {
                Err(ProviderError::ApiError { status_code: 500, message: "Simulated failure".into() })
            }
            MockBehavior::Intermittent { fail_every } if fail_every > 0 && count % fail_every == 0 => {
                Err(ProviderError::ConnectionError(format!("Simulated failure on request {}", count)))
            }
            _ => Ok(match self.custom_translation {
                Some(translate) => translate(text, target_language),
                None => format!("[{}] {}", target_language, text),
            }),
        }
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        match self.behavior {
            MockBehavior::Failing => Err(ProviderError::ConnectionError("Simulated failure".into())),
            _ => Ok(()),
        }
    }
}

/// Mock presentation store
#[derive(Debug)]
pub struct MockSlides {
    presentation: Presentation,
    fetch_error: Option<ProviderError>,
    failing_slides: HashSet<String>,
    batch_calls: Mutex<Vec<(String, Vec<UpdateRequest>)>>,
    fetch_calls: AtomicUsize,
}

impl MockSlides {
    /// Serve the given presentation
    pub fn new(presentation: Presentation) -> Self {
        Self {
            presentation,
            fetch_error: None,
            failing_slides: HashSet::new(),
            batch_calls: Mutex::new(Vec::new()),
            fetch_calls: AtomicUsize::new(0),
        }
    }

    /// Fail every fetch with the given error
    pub fn failing_fetch(error: ProviderError) -> Self {
        let mut mock = Self::new(Presentation::default());
        mock.fetch_error = Some(error);
        mock
    }

    /// Fail batch updates that target the given slide
    pub fn fail_updates_for(mut self, slide_object_id: &str) -> Self {
        self.failing_slides.insert(slide_object_id.to_string());
        self
    }

    /// Recorded `(presentation_id, requests)` per batch update call
    pub fn batch_calls(&self) -> Vec<(String, Vec<UpdateRequest>)> {
        self.batch_calls.lock().clone()
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    fn targets_failing_slide(&self, requests: &[UpdateRequest]) -> bool {
        requests.iter().any(|request| match request {
            UpdateRequest::ReplaceAllText(replace) => replace
                .page_object_ids
                .iter()
                .any(|id| self.failing_slides.contains(id)),
            UpdateRequest::DeleteText(delete) => self.owning_slide_fails(&delete.object_id),
            UpdateRequest::InsertText(insert) => self.owning_slide_fails(&insert.object_id),
        })
    }

    fn owning_slide_fails(&self, object_id: &str) -> bool {
        self.presentation.slides.iter().any(|slide| {
            self.failing_slides.contains(&slide.object_id)
                && slide.page_elements.iter().any(|e| e.object_id == object_id)
        })
    }
}

#[async_trait]
impl PresentationProvider for MockSlides {
    async fn get_presentation(&self, presentation_id: &str) -> Result<Presentation, ProviderError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = &self.fetch_error {
            return Err(error.clone());
        }

        let mut presentation = self.presentation.clone();
        presentation.presentation_id = presentation_id.to_string();
        Ok(presentation)
    }

    async fn batch_update(
        &self,
        presentation_id: &str,
        requests: &[UpdateRequest],
    ) -> Result<BatchUpdateResponse, ProviderError> {
        self.batch_calls
            .lock()
            .push((presentation_id.to_string(), requests.to_vec()));

        if self.targets_failing_slide(requests) {
            return Err(ProviderError::ApiError {
                status_code: 400,
                message: "Simulated batch update failure".into(),
            });
        }

        Ok(BatchUpdateResponse {
            presentation_id: presentation_id.to_string(),
            replies: Vec::new(),
        })
    }
}

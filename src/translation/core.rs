/*!
 * Presentation translation orchestration.
 *
 * `PresentationTranslator` drives one job end to end: resolve the
 * presentation id, fetch the deck once, translate slides through a bounded
 * stream, write each slide back in a single batch, and report progress
 * transitions to the injected tracker.
 */

use futures::stream::{self, StreamExt};
use log::{error, info, warn};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

use crate::app_config::{Config, TranslationConfig};
use crate::errors::AppError;
use crate::language_utils::TargetLanguage;
use crate::presentation::Page;
use crate::presentation_url::extract_presentation_id;
use crate::progress::{JobState, ProgressTracker, ProgressUpdate};
use crate::providers::{self, PresentationProvider, TranslationProvider};

use super::batch::UpdateSubmitter;
use super::cache::TranslationCache;
use super::concurrency::ConcurrencyLimits;
use super::dispatcher::{ElementStatus, TranslatedElement, TranslationDispatcher};
use super::extractor::extract_text_elements;

/// Progress reported once the presentation has been fetched
const FETCHED_PROGRESS: u32 = 10;

/// Share of the progress bar spent on slides
const SLIDES_PROGRESS_SPAN: u32 = 85;

/// Outcome for one slide
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlideResult {
    pub slide_index: usize,

    pub slide_object_id: String,

    /// Runs processed and written back, including fallbacks
    pub translated_elements: usize,

    /// Runs that kept their original text because translation failed
    pub fallback_elements: usize,

    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    pub elements: Vec<TranslatedElement>,
}

impl SlideResult {
    fn empty(slide_index: usize, slide_object_id: String) -> Self {
        Self {
            slide_index,
            slide_object_id,
            translated_elements: 0,
            fallback_elements: 0,
            success: true,
            error: None,
            elements: Vec::new(),
        }
    }
}

/// Result of a whole translation job
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationReport {
    pub presentation_id: String,
    pub job_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub results: Vec<SlideResult>,
}

impl TranslationReport {
    /// Number of slides processed
    pub fn translated_slides(&self) -> usize {
        self.results.len()
    }

    pub fn failed_slides(&self) -> usize {
        self.results.iter().filter(|result| !result.success).count()
    }

    pub fn fallback_elements(&self) -> usize {
        self.results.iter().map(|result| result.fallback_elements).sum()
    }

    /// Summary shown to the user
    pub fn message(&self) -> String {
        match self.failed_slides() {
            0 => "Translation completed successfully".to_string(),
            failed => format!("Translation completed with {} failed slide(s)", failed),
        }
    }
}

/// Translates Google Slides presentations in place
pub struct PresentationTranslator {
    slides: Arc<dyn PresentationProvider>,
    dispatcher: TranslationDispatcher,
    submitter: UpdateSubmitter,
    limits: ConcurrencyLimits,
    progress: Arc<dyn ProgressTracker>,
}

impl PresentationTranslator {
    /// Create a translator over the given providers
    pub fn new(
        slides: Arc<dyn PresentationProvider>,
        translator: Arc<dyn TranslationProvider>,
        config: &TranslationConfig,
        progress: Arc<dyn ProgressTracker>,
    ) -> Self {
        let limits = ConcurrencyLimits::from_config(config);
        let dispatcher = TranslationDispatcher::new(
            translator,
            limits.max_concurrent_requests,
            TranslationCache::with_max_entries(config.cache_enabled, config.cache_max_entries),
            config.fallback_source_language.clone(),
        );
        let submitter = UpdateSubmitter::new(slides.clone(), config.update_strategy);

        Self {
            slides,
            dispatcher,
            submitter,
            limits,
            progress,
        }
    }

    /// Create a translator backed by the Google APIs
    pub fn from_config(config: &Config, progress: Arc<dyn ProgressTracker>) -> Result<Self, AppError> {
        let (slides, translator) = providers::build_google_providers(&config.google)?;
        Ok(Self::new(slides, translator, &config.translation, progress))
    }

    pub fn limits(&self) -> ConcurrencyLimits {
        self.limits
    }

    pub fn progress(&self) -> &Arc<dyn ProgressTracker> {
        &self.progress
    }

    pub fn cache(&self) -> &TranslationCache {
        self.dispatcher.cache()
    }

    /// Translate the presentation a Google Slides URL points to
    pub async fn translate_url(
        &self,
        slide_url: &str,
        target: &TargetLanguage,
        job_id: &str,
    ) -> Result<TranslationReport, AppError> {
        let presentation_id = extract_presentation_id(slide_url)
            .ok_or_else(|| AppError::InvalidUrl(slide_url.to_string()))?;

        self.translate_presentation(&presentation_id, target, job_id).await
    }

    /// Translate every slide of a presentation and write the results back
    pub async fn translate_presentation(
        &self,
        presentation_id: &str,
        target: &TargetLanguage,
        job_id: &str,
    ) -> Result<TranslationReport, AppError> {
        let start_time = Instant::now();
        self.report(job_id, JobState::Starting, 0, "Starting translation...");

        let presentation = match self.slides.get_presentation(presentation_id).await {
            Ok(presentation) => presentation,
            Err(e) => {
                let error = AppError::from(e);
                error!("Failed to fetch presentation {}: {}", presentation_id, error);
                self.report(job_id, JobState::Error, 0, &error.user_message());
                return Err(error);
            }
        };

        let total = presentation.slides.len();
        info!(
            "Translating '{}' ({}): {} slides, target {}",
            presentation.title.as_deref().unwrap_or("untitled"),
            presentation_id,
            total,
            target
        );
        self.report(
            job_id,
            JobState::InProgress,
            FETCHED_PROGRESS,
            &format!("Translating {} slides...", total),
        );

        let mut pending = stream::iter(presentation.slides.into_iter().enumerate())
            .map(|(slide_index, slide)| self.process_slide(presentation_id, slide_index, slide, target))
            .buffer_unordered(self.limits.max_concurrent_slides);

        let mut results = Vec::with_capacity(total);
        while let Some(result) = pending.next().await {
            results.push(result);
            let done = results.len();
            let progress = FETCHED_PROGRESS + (SLIDES_PROGRESS_SPAN * done as u32) / total as u32;
            self.report(
                job_id,
                JobState::InProgress,
                progress,
                &format!("Translated {} of {} slides", done, total),
            );
        }
        results.sort_by_key(|result| result.slide_index);

        let report = TranslationReport {
            presentation_id: presentation_id.to_string(),
            job_id: job_id.to_string(),
            title: presentation.title,
            results,
        };

        let message = report.message();
        info!(
            "{} ({} slides, {} failed, {} fallback elements) in {:.1}s",
            message,
            report.translated_slides(),
            report.failed_slides(),
            report.fallback_elements(),
            start_time.elapsed().as_secs_f64()
        );
        self.report(job_id, JobState::Completed, 100, &message);

        Ok(report)
    }

    /// Extract, translate and write back one slide
    pub async fn process_slide(
        &self,
        presentation_id: &str,
        slide_index: usize,
        slide: Page,
        target: &TargetLanguage,
    ) -> SlideResult {
        let elements = extract_text_elements(&slide);
        if elements.is_empty() {
            return SlideResult::empty(slide_index, slide.object_id);
        }

        let mut translated = self.dispatcher.translate_elements(elements, target).await;
        let fallback_elements = translated
            .iter()
            .filter(|element| element.status == ElementStatus::Fallback)
            .count();

        match self.submitter.submit(presentation_id, &slide.object_id, &translated).await {
            Ok(_) => SlideResult {
                slide_index,
                slide_object_id: slide.object_id,
                translated_elements: translated.len(),
                fallback_elements,
                success: true,
                error: None,
                elements: translated,
            },
            Err(e) => {
                error!("Slide {} ({}) update failed: {}", slide_index, slide.object_id, e);
                let message = e.to_string();
                for element in translated.iter_mut().filter(|element| element.changes_text()) {
                    element.status = ElementStatus::Failed;
                    element.error = Some(message.clone());
                }
                SlideResult {
                    slide_index,
                    slide_object_id: slide.object_id,
                    translated_elements: 0,
                    fallback_elements,
                    success: false,
                    error: Some(message),
                    elements: translated,
                }
            }
        }
    }

    fn report(&self, job_id: &str, status: JobState, progress: u32, message: &str) {
        if let Err(e) = self.progress.update(job_id, ProgressUpdate::new(status, progress, message)) {
            warn!("Progress update for job {} rejected: {}", job_id, e);
        }
    }
}

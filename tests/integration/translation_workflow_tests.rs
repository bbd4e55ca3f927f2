/*!
 * End-to-end translation runs against mock providers
 */

use anyhow::Result;
use parking_lot::Mutex;
use std::sync::Arc;

use slidelingo::app_config::{TranslationConfig, UpdateStrategy};
use slidelingo::errors::{AppError, ProgressError};
use slidelingo::language_utils::TargetLanguage;
use slidelingo::presentation::UpdateRequest;
use slidelingo::progress::{
    InMemoryProgressStore, JobState, ProgressRecord, ProgressTracker, ProgressUpdate,
};
use slidelingo::providers::mock::{MockSlides, MockTranslator};
use slidelingo::translation::{ElementStatus, PresentationTranslator};

use crate::common::{
    english_deck, init_logging, mock_translator, presentation, progress_store, slide, text_box, to_nihao,
};

const DECK_URL: &str = "https://docs.google.com/presentation/d/ABC123/edit";

/// Tracker that records every accepted update
struct RecordingTracker {
    inner: InMemoryProgressStore,
    updates: Mutex<Vec<ProgressUpdate>>,
}

impl RecordingTracker {
    fn new() -> Self {
        Self {
            inner: InMemoryProgressStore::new(std::time::Duration::from_secs(60)),
            updates: Mutex::new(Vec::new()),
        }
    }
}

impl ProgressTracker for RecordingTracker {
    fn get(&self, job_id: &str) -> ProgressRecord {
        self.inner.get(job_id)
    }

    fn update(&self, job_id: &str, update: ProgressUpdate) -> Result<ProgressRecord, ProgressError> {
        let record = self.inner.update(job_id, update.clone())?;
        self.updates.lock().push(update);
        Ok(record)
    }
}

#[tokio::test]
async fn test_translate_url_withSingleEnglishShape_shouldReplaceWithChinese() -> Result<()> {
    init_logging();
    let deck = presentation(vec![slide("p1", vec![text_box("title", "Hello\n")])]);
    let slides = MockSlides::new(deck).shared();
    let provider = Arc::new(MockTranslator::working().with_translation(to_nihao));
    let translator = mock_translator(slides.clone(), provider.clone(), progress_store());

    let report = translator.translate_url(DECK_URL, &TargetLanguage::Auto, "job").await?;

    assert_eq!(report.presentation_id, "ABC123");
    assert_eq!(report.translated_slides(), 1);
    let result = &report.results[0];
    assert_eq!(result.slide_index, 0);
    assert_eq!(result.translated_elements, 1);
    assert!(result.success);
    assert_eq!(result.elements[0].source_language, "en");
    assert_eq!(result.elements[0].target_language, "zh-CN");

    let calls = slides.batch_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "ABC123");
    assert_eq!(calls[0].1, vec![UpdateRequest::replace_all_text("Hello", "你好", "p1")]);
    assert_eq!(slides.fetch_calls(), 1);
    Ok(())
}

#[tokio::test]
async fn test_translate_withEmptySlide_shouldNotCallTranslate() -> Result<()> {
    let deck = presentation(vec![serde_json::json!({"objectId": "blank"})]);
    let slides = MockSlides::new(deck).shared();
    let provider = Arc::new(MockTranslator::working());
    let translator = mock_translator(slides.clone(), provider.clone(), progress_store());

    let report = translator.translate_url(DECK_URL, &TargetLanguage::Auto, "job").await?;

    let result = &report.results[0];
    assert_eq!(result.translated_elements, 0);
    assert!(result.success);
    assert_eq!(provider.detect_calls(), 0);
    assert_eq!(provider.translate_calls(), 0);
    assert!(slides.batch_calls().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_translate_withFailingTranslator_shouldFallBackToOriginal() -> Result<()> {
    let slides = MockSlides::new(english_deck(2)).shared();
    let translator = mock_translator(slides.clone(), Arc::new(MockTranslator::failing()), progress_store());

    let report = translator.translate_url(DECK_URL, &TargetLanguage::Auto, "job").await?;

    for result in &report.results {
        assert!(result.success);
        assert_eq!(result.translated_elements, 1);
        assert_eq!(result.fallback_elements, 1);
        let element = &result.elements[0];
        assert_eq!(element.translated_text, element.original_text);
        assert_eq!(element.status, ElementStatus::Fallback);
    }
    assert!(slides.batch_calls().is_empty());
    assert_eq!(report.message(), "Translation completed successfully");
    Ok(())
}

#[tokio::test]
async fn test_translate_withIntermittentFailures_shouldCountFallbacks() -> Result<()> {
    let slides = MockSlides::new(english_deck(4)).shared();
    let translator = mock_translator(slides, Arc::new(MockTranslator::intermittent(2)), progress_store());

    let report = translator.translate_url(DECK_URL, &TargetLanguage::Auto, "job").await?;

    assert_eq!(report.fallback_elements(), 2);
    assert_eq!(report.failed_slides(), 0);
    Ok(())
}

#[tokio::test]
async fn test_translate_withManySlides_shouldRespectRequestBound() -> Result<()> {
    let deck = presentation(
        (0..6)
            .map(|i| {
                slide(
                    &format!("s{}", i),
                    vec![
                        text_box(&format!("a{}", i), "Alpha\n"),
                        text_box(&format!("b{}", i), "Beta\n"),
                    ],
                )
            })
            .collect(),
    );
    let slides = MockSlides::new(deck).shared();
    let provider = Arc::new(MockTranslator::slow(15));
    let config = TranslationConfig {
        max_concurrent_slides: 4,
        max_concurrent_requests: 3,
        cache_enabled: false,
        ..TranslationConfig::default()
    };
    let translator = PresentationTranslator::new(slides, provider.clone(), &config, progress_store());

    let report = translator.translate_url(DECK_URL, &TargetLanguage::Auto, "job").await?;

    assert_eq!(report.translated_slides(), 6);
    assert_eq!(provider.translate_calls(), 12);
    assert!(provider.max_in_flight() <= 3, "saw {} in flight", provider.max_in_flight());
    assert!(provider.max_in_flight() >= 2);
    Ok(())
}

#[tokio::test]
async fn test_translate_withCacheEnabled_shouldTranslateRepeatedTextOnce() -> Result<()> {
    let deck = presentation(vec![
        slide("s0", vec![text_box("a", "Agenda\n")]),
        slide("s1", vec![text_box("b", "Agenda\n")]),
    ]);
    let slides = MockSlides::new(deck).shared();
    let provider = Arc::new(MockTranslator::working());
    let config = TranslationConfig {
        max_concurrent_slides: 1,
        ..TranslationConfig::default()
    };
    let translator = PresentationTranslator::new(slides, provider.clone(), &config, progress_store());

    translator.translate_url(DECK_URL, &TargetLanguage::Auto, "job").await?;

    assert_eq!(provider.translate_calls(), 1);
    assert_eq!(translator.cache().stats().0, 1);
    Ok(())
}

#[tokio::test]
async fn test_translate_withCacheCap_shouldBoundEntries() -> Result<()> {
    let slides = MockSlides::new(english_deck(6)).shared();
    let config = TranslationConfig {
        cache_max_entries: 2,
        ..TranslationConfig::default()
    };
    let translator =
        PresentationTranslator::new(slides, Arc::new(MockTranslator::working()), &config, progress_store());

    translator.translate_url(DECK_URL, &TargetLanguage::Auto, "job").await?;

    assert_eq!(translator.cache().max_entries(), 2);
    assert_eq!(translator.cache().len(), 2);
    Ok(())
}

#[tokio::test]
async fn test_translate_withTextRangeStrategy_shouldSendDeleteInsertPairs() -> Result<()> {
    let deck = presentation(vec![slide("s0", vec![text_box("a", "Hello\n")])]);
    let slides = MockSlides::new(deck).shared();
    let config = TranslationConfig {
        update_strategy: UpdateStrategy::TextRange,
        ..TranslationConfig::default()
    };
    let translator = PresentationTranslator::new(
        slides.clone(),
        Arc::new(MockTranslator::working().with_translation(to_nihao)),
        &config,
        progress_store(),
    );

    translator.translate_url(DECK_URL, &TargetLanguage::Auto, "job").await?;

    let requests = &slides.batch_calls()[0].1;
    assert!(matches!(requests[0], UpdateRequest::DeleteText(_)));
    assert!(matches!(&requests[1], UpdateRequest::InsertText(insert) if insert.text == "你好"));
    Ok(())
}

#[tokio::test]
async fn test_translate_withExplicitTarget_shouldOverrideAutoPolicy() -> Result<()> {
    let deck = presentation(vec![slide("s0", vec![text_box("a", "你好\n")])]);
    let slides = MockSlides::new(deck).shared();
    let translator = mock_translator(slides, Arc::new(MockTranslator::working()), progress_store());

    let target = TargetLanguage::Explicit("ja".to_string());
    let report = translator.translate_url(DECK_URL, &target, "job").await?;

    let element = &report.results[0].elements[0];
    assert_eq!(element.source_language, "zh-CN");
    assert_eq!(element.translated_text, "[ja] 你好");
    Ok(())
}

#[tokio::test]
async fn test_translate_withThreeSlides_shouldEmitProgressMilestones() -> Result<()> {
    let slides = MockSlides::new(english_deck(3)).shared();
    let tracker = Arc::new(RecordingTracker::new());
    let translator = mock_translator(slides, Arc::new(MockTranslator::working()), tracker.clone());

    translator.translate_url(DECK_URL, &TargetLanguage::Auto, "job").await?;

    let updates = tracker.updates.lock().clone();
    let milestones: Vec<(JobState, u32)> = updates.iter().map(|u| (u.status, u.progress)).collect();
    assert_eq!(
        milestones,
        vec![
            (JobState::Starting, 0),
            (JobState::InProgress, 10),
            (JobState::InProgress, 38),
            (JobState::InProgress, 66),
            (JobState::InProgress, 95),
            (JobState::Completed, 100),
        ]
    );
    Ok(())
}

#[tokio::test]
async fn test_translate_withForbiddenPresentation_shouldMapToPermissionDenied() {
    let slides = MockSlides::failing_fetch(slidelingo::ProviderError::from_status(
        403,
        Some("PERMISSION_DENIED"),
        "The caller does not have permission".to_string(),
    ))
    .shared();
    let tracker = Arc::new(RecordingTracker::new());
    let translator = mock_translator(slides, Arc::new(MockTranslator::working()), tracker.clone());

    let error = translator
        .translate_url(DECK_URL, &TargetLanguage::Auto, "job")
        .await
        .unwrap_err();

    assert!(matches!(error, AppError::PermissionDenied(_)));
    assert_eq!(tracker.get("job").status, JobState::Error);
}

/*!
 * # Slidelingo - Google Slides translation between English and Chinese
 *
 * Translates a Google Slides presentation in place: every text run is sent
 * through the Google Cloud Translation API and written back with a batch
 * update per slide.
 *
 * ## Features
 *
 * - Presentation id extraction from Slides URLs
 * - Text extraction from shapes, tables and groups
 * - Automatic English/Chinese direction, or an explicit target language
 * - Bounded concurrency across slides and translation requests
 * - `replaceAllText` or range-targeted write back
 * - Job progress tracking with an explicit state machine
 * - HTTP API and CLI front ends
 *
 * ## Architecture
 *
 * - `app_config`: Configuration management
 * - `presentation_url`: Presentation id extraction
 * - `presentation`: Slides REST wire model
 * - `translation`: Extraction, dispatch, write back and orchestration:
 *   - `translation::extractor`: Text runs of a slide
 *   - `translation::dispatcher`: Language detection and translation
 *   - `translation::batch`: Batch update construction and submission
 *   - `translation::core`: The job orchestrator
 * - `providers`: Google Slides, Translation and OAuth clients, plus mocks
 * - `progress`: Job state machine and progress stores
 * - `diagnostics`: Credential checks
 * - `server`: axum HTTP API
 * - `language_utils`: Language code utilities
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod diagnostics;
pub mod errors;
pub mod language_utils;
pub mod presentation;
pub mod presentation_url;
pub mod progress;
pub mod providers;
pub mod server;
pub mod translation;

// Re-export main types for easier usage
pub use app_config::Config;
pub use errors::{AppError, CredentialsError, ProgressError, ProviderError};
pub use language_utils::TargetLanguage;
pub use presentation_url::extract_presentation_id;
pub use progress::{InMemoryProgressStore, JobState, ProgressTracker};
pub use translation::{PresentationTranslator, SlideResult, TranslationReport};

/*!
 * Presentation translation.
 *
 * - `extractor`: text runs of a slide, with position metadata
 * - `dispatcher`: language detection and translation per run
 * - `batch`: batch update construction and submission per slide
 * - `cache`: shared cache of translated runs
 * - `concurrency`: slide and request bounds for a job
 * - `core`: the orchestrator tying it all together
 */

pub use self::batch::{UpdateSubmitter, build_update_requests};
pub use self::core::{PresentationTranslator, SlideResult, TranslationReport};
pub use self::dispatcher::{ElementStatus, TranslatedElement, TranslationDispatcher};
pub use self::extractor::{TextElement, extract_text_elements};

pub mod batch;
pub mod cache;
pub mod concurrency;
pub mod core;
pub mod dispatcher;
pub mod extractor;

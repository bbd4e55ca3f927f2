/*!
 * Concurrency limits for a translation job.
 *
 * Slides are processed through a buffered stream and every Translation API
 * call across the job shares one semaphore, so a large presentation never
 * fans out more requests than the provider tolerates.
 */

use crate::app_config::TranslationConfig;

/// Bounds applied to one presentation job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConcurrencyLimits {
    /// Slides processed at the same time
    pub max_concurrent_slides: usize,
    /// Translation requests in flight across all slides
    pub max_concurrent_requests: usize,
}

impl Default for ConcurrencyLimits {
    fn default() -> Self {
        Self::from_config(&TranslationConfig::default())
    }
}

impl ConcurrencyLimits {
    /// Limits configured for the service, never below one
    pub fn from_config(config: &TranslationConfig) -> Self {
        Self {
            max_concurrent_slides: config.max_concurrent_slides.max(1),
            max_concurrent_requests: config.max_concurrent_requests.max(1),
        }
    }

    /// Get effective concurrent requests, respecting any user override
    pub fn effective_concurrent_requests(&self, user_override: Option<usize>) -> usize {
        user_override
            .filter(|limit| *limit > 0)
            .unwrap_or(self.max_concurrent_requests)
    }

    /// Copy of these limits with the request bound overridden
    pub fn with_request_override(self, user_override: Option<usize>) -> Self {
        Self {
            max_concurrent_requests: self.effective_concurrent_requests(user_override),
            ..self
        }
    }
}

/*!
 * Provider implementations for the external Google services.
 *
 * This module contains client implementations for:
 * - `google_auth`: service account credentials and OAuth2 access tokens
 * - `slides`: Google Slides API (fetch presentation, batch update)
 * - `google_translate`: Cloud Translation v2 (detect, translate)
 * - `mock`: in-memory providers for tests
 */

use async_trait::async_trait;
use log::warn;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

use crate::app_config::GoogleConfig;
use crate::errors::{AppError, ProviderError};
use crate::presentation::{BatchUpdateResponse, Presentation, UpdateRequest};

use self::google_auth::{ServiceAccountKey, ServiceAccountTokenSource, TokenSource, scopes};
use self::google_translate::GoogleTranslate;
use self::slides::GoogleSlides;

/// Access to a presentation document store
///
/// Implemented by the Slides REST client and by the test mocks.
#[async_trait]
pub trait PresentationProvider: Send + Sync + Debug {
    /// Fetch the full presentation resource
    async fn get_presentation(&self, presentation_id: &str) -> Result<Presentation, ProviderError>;

    /// Apply a list of edit operations atomically
    async fn batch_update(
        &self,
        presentation_id: &str,
        requests: &[UpdateRequest],
    ) -> Result<BatchUpdateResponse, ProviderError>;
}

/// Result of a language detection call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Detection {
    /// Detected BCP-47 language code
    pub language: String,

    #[serde(default)]
    pub confidence: Option<f32>,

    #[serde(default)]
    pub is_reliable: Option<bool>,
}

impl Detection {
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            confidence: None,
            is_reliable: None,
        }
    }
}

/// Common trait for machine translation services
#[async_trait]
pub trait TranslationProvider: Send + Sync + Debug {
    /// Detect the language of a piece of text
    async fn detect_language(&self, text: &str) -> Result<Detection, ProviderError>;

    /// Translate text into the target language
    ///
    /// # Arguments
    /// * `text` - The text to translate
    /// * `source_language` - Source language, or `None` to let the service detect it
    /// * `target_language` - Target language code
    async fn translate(
        &self,
        text: &str,
        source_language: Option<&str>,
        target_language: &str,
    ) -> Result<String, ProviderError>;

    /// Test the connection to the provider
    async fn test_connection(&self) -> Result<(), ProviderError>;
}

/// Shape of the `error` object Google APIs return on failure
#[derive(Debug, Deserialize)]
struct GoogleErrorEnvelope {
    error: GoogleErrorBody,
}

#[derive(Debug, Deserialize)]
struct GoogleErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

/// Turn a non-success response into a classified `ProviderError`
pub(crate) async fn error_from_response(response: reqwest::Response) -> ProviderError {
    let status_code = response.status().as_u16();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Failed to get error response text".to_string());

    match serde_json::from_str::<GoogleErrorEnvelope>(&body) {
        Ok(envelope) => ProviderError::from_status(
            status_code,
            envelope.error.status.as_deref(),
            envelope.error.message,
        ),
        Err(_) => ProviderError::from_status(status_code, None, body),
    }
}

/// Build an HTTP client with the configured timeout
pub(crate) fn http_client(timeout_secs: u64) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .unwrap_or_else(|e| {
            warn!(
                "Failed to build HTTP client with a {}s timeout, using defaults without a timeout: {}",
                timeout_secs, e
            );
            reqwest::Client::default()
        })
}

/// Build the Slides and Translation clients from configuration and credentials
pub fn build_google_providers(
    config: &GoogleConfig,
) -> Result<(Arc<dyn PresentationProvider>, Arc<dyn TranslationProvider>), AppError> {
    let key = ServiceAccountKey::from_env(&config.credentials_env)?;
    let token_source: Arc<dyn TokenSource> =
        Arc::new(ServiceAccountTokenSource::new(key, scopes::ALL, config.timeout_secs)?);

    let slides = GoogleSlides::new(&config.slides_endpoint, token_source.clone(), config.timeout_secs);

    let translate = match &config.translate_api_key {
        Some(api_key) if !api_key.is_empty() => {
            GoogleTranslate::with_api_key(&config.translate_endpoint, api_key, config.timeout_secs)
        }
        _ => GoogleTranslate::with_token_source(
            &config.translate_endpoint,
            token_source,
            config.timeout_secs,
        ),
    };

    Ok((Arc::new(slides), Arc::new(translate)))
}

pub mod google_auth;
pub mod google_translate;
pub mod mock;
pub mod slides;

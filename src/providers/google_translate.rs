use async_trait::async_trait;
use log::error;
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::google_auth::TokenSource;
use super::{Detection, TranslationProvider, error_from_response, http_client};
use crate::errors::ProviderError;

/// How requests to the Translation API are authorised
#[derive(Debug, Clone)]
enum TranslateAuth {
    ApiKey(String),
    Bearer(Arc<dyn TokenSource>),
}

/// Google Cloud Translation (v2) client
#[derive(Debug)]
pub struct GoogleTranslate {
    client: Client,
    endpoint: String,
    auth: TranslateAuth,
}

/// Translate request body
#[derive(Debug, Serialize)]
struct TranslateRequest<'a> {
    q: [&'a str; 1],
    target: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<&'a str>,
    format: &'static str,
}

/// Detect request body
#[derive(Debug, Serialize)]
struct DetectRequest<'a> {
    q: [&'a str; 1],
}

#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct TranslationsData {
    #[serde(default)]
    translations: Vec<Translation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Translation {
    translated_text: String,
}

#[derive(Debug, Deserialize)]
struct DetectionsData {
    #[serde(default)]
    detections: Vec<Vec<Detection>>,
}

impl GoogleTranslate {
    /// Client authorised with an API key
    pub fn with_api_key(endpoint: impl Into<String>, api_key: impl Into<String>, timeout_secs: u64) -> Self {
        Self::build(endpoint.into(), TranslateAuth::ApiKey(api_key.into()), timeout_secs)
    }

    /// Client authorised with OAuth2 bearer tokens
    pub fn with_token_source(
        endpoint: impl Into<String>,
        auth: Arc<dyn TokenSource>,
        timeout_secs: u64,
    ) -> Self {
        Self::build(endpoint.into(), TranslateAuth::Bearer(auth), timeout_secs)
    }

    fn build(endpoint: String, auth: TranslateAuth, timeout_secs: u64) -> Self {
        Self {
            client: http_client(timeout_secs),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            auth,
        }
    }

    async fn authorize(&self, request: RequestBuilder) -> Result<RequestBuilder, ProviderError> {
        match &self.auth {
            TranslateAuth::ApiKey(key) => Ok(request.query(&[("key", key.as_str())])),
            TranslateAuth::Bearer(source) => Ok(request.bearer_auth(source.access_token().await?)),
        }
    }

    async fn post<B: Serialize + Sync, T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ProviderError> {
        let url = format!("{}/language/translate/v2{}", self.endpoint, path);
        let request = self.authorize(self.client.post(url).json(body)).await?;
        let response = request.send().await?;

        if !response.status().is_success() {
            let err = error_from_response(response).await;
            error!("Translation API error: {}", err);
            return Err(err);
        }

        let envelope: ApiEnvelope<T> = response
            .json()
            .await
            .map_err(|e| ProviderError::ParseError(format!("Failed to parse Translation API response: {}", e)))?;
        Ok(envelope.data)
    }
}

#[async_trait]
impl TranslationProvider for GoogleTranslate {
    async fn detect_language(&self, text: &str) -> Result<Detection, ProviderError> {
        let data: DetectionsData = self.post("/detect", &DetectRequest { q: [text] }).await?;

        data.detections
            .into_iter()
            .next()
            .and_then(|candidates| candidates.into_iter().next())
            .ok_or_else(|| ProviderError::ParseError("Detection response was empty".to_string()))
    }

    async fn translate(
        &self,
        text: &str,
        source_language: Option<&str>,
        target_language: &str,
    ) -> Result<String, ProviderError> {
        // "und" means the detector gave up; let the service detect again
        let source = source_language.filter(|code| !code.is_empty() && *code != "und");
        let body = TranslateRequest {
            q: [text],
            target: target_language,
            source,
            format: "text",
        };

        let data: TranslationsData = self.post("", &body).await?;

        data.translations
            .into_iter()
            .next()
            .map(|t| t.translated_text)
            .ok_or_else(|| ProviderError::ParseError("Translation response was empty".to_string()))
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        self.detect_language("Hello").await.map(|_| ())
    }
}

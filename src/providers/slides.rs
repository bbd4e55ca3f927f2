use async_trait::async_trait;
use log::{debug, error};
use reqwest::Client;
use std::sync::Arc;

use super::google_auth::TokenSource;
use super::{PresentationProvider, error_from_response, http_client};
use crate::errors::ProviderError;
use crate::presentation::{BatchUpdateBody, BatchUpdateResponse, Presentation, UpdateRequest};

/// Google Slides API client
#[derive(Debug)]
pub struct GoogleSlides {
    /// HTTP client for API requests
    client: Client,
    /// API base URL, e.g. `https://slides.googleapis.com`
    endpoint: String,
    /// Bearer token source
    auth: Arc<dyn TokenSource>,
}

impl GoogleSlides {
    /// Create a new Slides client
    pub fn new(endpoint: impl Into<String>, auth: Arc<dyn TokenSource>, timeout_secs: u64) -> Self {
        Self {
            client: http_client(timeout_secs),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            auth,
        }
    }

    fn presentation_url(&self, presentation_id: &str) -> String {
        format!("{}/v1/presentations/{}", self.endpoint, presentation_id)
    }
}

#[async_trait]
impl PresentationProvider for GoogleSlides {
    async fn get_presentation(&self, presentation_id: &str) -> Result<Presentation, ProviderError> {
        let token = self.auth.access_token().await?;

        let response = self
            .client
            .get(self.presentation_url(presentation_id))
            .bearer_auth(token)
            .send()
            .await?;

        if !response.status().is_success() {
            let err = error_from_response(response).await;
            error!("Slides API error fetching {}: {}", presentation_id, err);
            return Err(err);
        }

        let presentation: Presentation = response
            .json()
            .await
            .map_err(|e| ProviderError::ParseError(format!("Failed to parse presentation: {}", e)))?;

        debug!(
            "Fetched presentation {} with {} slides",
            presentation_id,
            presentation.slides.len()
        );
        Ok(presentation)
    }

    async fn batch_update(
        &self,
        presentation_id: &str,
        requests: &[UpdateRequest],
    ) -> Result<BatchUpdateResponse, ProviderError> {
        let token = self.auth.access_token().await?;
        let url = format!("{}:batchUpdate", self.presentation_url(presentation_id));

        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .json(&BatchUpdateBody { requests })
            .send()
            .await?;

        if !response.status().is_success() {
            let err = error_from_response(response).await;
            error!("Slides API error updating {}: {}", presentation_id, err);
            return Err(err);
        }

        response
            .json::<BatchUpdateResponse>()
            .await
            .map_err(|e| ProviderError::ParseError(format!("Failed to parse batch update reply: {}", e)))
    }
}

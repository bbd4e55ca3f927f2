use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::diagnostics::{self, DiagnosticsReport};
use crate::errors::AppError;
use crate::language_utils::TargetLanguage;
use crate::progress::{ProgressRecord, ProgressUpdate};
use crate::translation::{SlideResult, TranslationReport};

use super::AppState;
use super::error::ApiError;

/// Body of `POST /api/translate`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslateRequest {
    #[serde(default)]
    pub slide_url: Option<String>,

    /// `auto`, or an explicit language code
    #[serde(default)]
    pub target_language: Option<String>,

    /// Id the client polls progress with; generated when absent
    #[serde(default)]
    pub job_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslateResponse {
    pub success: bool,
    pub presentation_id: String,
    pub job_id: String,
    pub translated_slides: usize,
    pub failed_slides: usize,
    pub results: Vec<SlideResult>,
    pub message: String,
}

impl From<TranslationReport> for TranslateResponse {
    fn from(report: TranslationReport) -> Self {
        Self {
            success: true,
            translated_slides: report.translated_slides(),
            failed_slides: report.failed_slides(),
            message: report.message(),
            presentation_id: report.presentation_id,
            job_id: report.job_id,
            results: report.results,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CredentialsQuery {
    #[serde(default)]
    pub live: bool,
}

pub async fn translate(
    State(state): State<AppState>,
    payload: Result<Json<TranslateRequest>, JsonRejection>,
) -> Result<Json<TranslateResponse>, ApiError> {
    let expose_details = state.config.server.expose_error_details();
    let fail = |error: AppError| ApiError::new(error, expose_details);

    let Json(request) = payload.map_err(|rejection| fail(AppError::InvalidInput(rejection.body_text())))?;

    let slide_url = request
        .slide_url
        .filter(|url| !url.trim().is_empty())
        .ok_or_else(|| fail(AppError::InvalidUrl(String::new())))?;

    let target = match request.target_language.as_deref() {
        Some(code) => code
            .parse::<TargetLanguage>()
            .map_err(|e| fail(AppError::InvalidInput(e.to_string())))?,
        None => state.config.translation.default_target_language.clone(),
    };

    let job_id = request
        .job_id
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let translator = state.translator.as_ref().ok_or_else(|| {
        fail(AppError::Unknown(
            "Translation service is not configured; see /api/test-credentials".to_string(),
        ))
    })?;

    info!("Job {}: translating {} (target {})", job_id, slide_url, target);
    let report = translator
        .translate_url(&slide_url, &target, &job_id)
        .await
        .map_err(fail)?;

    Ok(Json(report.into()))
}

pub async fn get_progress(State(state): State<AppState>, Path(job_id): Path<String>) -> Json<ProgressRecord> {
    Json(state.progress.get(&job_id))
}

pub async fn post_progress(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
    payload: Result<Json<ProgressUpdate>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let expose_details = state.config.server.expose_error_details();

    let Json(update) = payload
        .map_err(|rejection| ApiError::new(AppError::InvalidInput(rejection.body_text()), expose_details))?;

    state.progress.update(&job_id, update).map_err(|e| {
        warn!("Rejected progress update for {}: {}", job_id, e);
        ApiError::new(e.into(), expose_details)
    })?;

    Ok(Json(json!({ "success": true })))
}

pub async fn test_credentials(
    State(state): State<AppState>,
    Query(query): Query<CredentialsQuery>,
) -> Json<DiagnosticsReport> {
    Json(diagnostics::run(&state.config.google, query.live).await)
}

pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

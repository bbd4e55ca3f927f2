/*!
 * Google REST clients exercised against a local mock of the Google endpoints
 */

use anyhow::Result;
use axum::extract::{Form, Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use slidelingo::app_config::TranslationConfig;
use slidelingo::errors::ProviderError;
use slidelingo::language_utils::TargetLanguage;
use slidelingo::presentation::UpdateRequest;
use slidelingo::providers::google_auth::{
    ServiceAccountKey, ServiceAccountTokenSource, StaticToken, TokenSource, scopes,
};
use slidelingo::providers::google_translate::GoogleTranslate;
use slidelingo::providers::slides::GoogleSlides;
use slidelingo::providers::{PresentationProvider, TranslationProvider};
use slidelingo::translation::PresentationTranslator;

use crate::common::{init_logging, progress_store, spawn_server};

const TOKEN: &str = "test-token";
const TEST_KEY_PEM: &str = include_str!("../fixtures/test_rsa_key.pem");

#[derive(Clone, Default)]
struct Recorder {
    /// `(path, body)` of every POST the mock received
    posts: Arc<Mutex<Vec<(String, Value)>>>,
    /// Query strings of Translation API calls
    queries: Arc<Mutex<Vec<HashMap<String, String>>>>,
    token_exchanges: Arc<AtomicUsize>,
}

impl Recorder {
    fn posts_to(&self, suffix: &str) -> Vec<Value> {
        self.posts
            .lock()
            .iter()
            .filter(|(path, _)| path.ends_with(suffix))
            .map(|(_, body)| body.clone())
            .collect()
    }
}

fn google_error(code: u16, status: &str, message: &str) -> Response {
    let status_code = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status_code,
        Json(json!({"error": {"code": code, "message": message, "status": status}})),
    )
        .into_response()
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value == format!("Bearer {}", TOKEN))
}

async fn slides_get(headers: HeaderMap, Path(id): Path<String>) -> Response {
    if !authorized(&headers) {
        return google_error(401, "UNAUTHENTICATED", "Request had invalid authentication credentials.");
    }
    if id == "slow" {
        tokio::time::sleep(std::time::Duration::from_secs(3)).await;
    }
    match id.as_str() {
        "missing" => google_error(404, "NOT_FOUND", "Requested entity was not found."),
        "locked" => google_error(403, "PERMISSION_DENIED", "The caller does not have permission"),
        "busy" => google_error(429, "RESOURCE_EXHAUSTED", "Quota exceeded for quota metric 'Read requests'"),
        _ => Json(json!({
            "presentationId": id,
            "title": "Remote deck",
            "pageSize": {"width": {"magnitude": 9144000, "unit": "EMU"}},
            "slides": [{
                "objectId": "p1",
                "pageElements": [{
                    "objectId": "title",
                    "size": {"width": {"magnitude": 3000000, "unit": "EMU"}},
                    "shape": {"shapeType": "TEXT_BOX", "text": {"textElements": [
                        {"endIndex": 6, "paragraphMarker": {"style": {}}},
                        {"startIndex": 0, "endIndex": 6, "textRun": {"content": "Hello\n", "style": {"bold": true}}}
                    ]}}
                }]
            }]
        }))
        .into_response(),
    }
}

async fn slides_post(
    State(recorder): State<Recorder>,
    headers: HeaderMap,
    Path(target): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&headers) {
        return google_error(401, "UNAUTHENTICATED", "Request had invalid authentication credentials.");
    }
    let Some(id) = target.strip_suffix(":batchUpdate") else {
        return google_error(404, "NOT_FOUND", "Unknown method");
    };

    let replies: Vec<Value> = body["requests"]
        .as_array()
        .map(|requests| {
            requests
                .iter()
                .map(|_| json!({"replaceAllText": {"occurrencesChanged": 1}}))
                .collect()
        })
        .unwrap_or_default();
    recorder.posts.lock().push((format!("/v1/presentations/{}", target), body));

    Json(json!({"presentationId": id, "replies": replies})).into_response()
}

async fn translate_detect(
    State(recorder): State<Recorder>,
    Query(query): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> Response {
    if query.get("key").map(String::as_str) == Some("revoked") {
        return google_error(400, "INVALID_ARGUMENT", "API key not valid. Please pass a valid API key.");
    }
    recorder.queries.lock().push(query);
    let text = body["q"][0].as_str().unwrap_or_default().to_string();
    recorder.posts.lock().push(("/language/translate/v2/detect".to_string(), body));

    let language = if text.chars().any(|c| ('\u{4e00}'..='\u{9fff}').contains(&c)) {
        "zh-CN"
    } else {
        "en"
    };
    Json(json!({"data": {"detections": [[{"language": language, "confidence": 0.98, "isReliable": false}]]}}))
        .into_response()
}

async fn translate_text(
    State(recorder): State<Recorder>,
    Query(query): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> Response {
    recorder.queries.lock().push(query);
    let translated = match body["target"].as_str() {
        Some("zh-CN") => "你好",
        _ => "Hello",
    };
    recorder.posts.lock().push(("/language/translate/v2".to_string(), body));
    Json(json!({"data": {"translations": [{"translatedText": translated}]}})).into_response()
}

async fn token_exchange(
    State(recorder): State<Recorder>,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    recorder.token_exchanges.fetch_add(1, Ordering::SeqCst);
    let assertion = form.get("assertion").cloned().unwrap_or_default();
    recorder
        .posts
        .lock()
        .push(("/token".to_string(), json!({"grant_type": form.get("grant_type"), "assertion": assertion})));

    if form.get("grant_type").map(String::as_str) != Some("urn:ietf:params:oauth:grant-type:jwt-bearer") {
        return (StatusCode::BAD_REQUEST, Json(json!({"error": "unsupported_grant_type"}))).into_response();
    }
    Json(json!({"access_token": TOKEN, "expires_in": 3600, "token_type": "Bearer"})).into_response()
}

async fn spawn_google_mock() -> (String, Recorder) {
    init_logging();
    let recorder = Recorder::default();
    let app = Router::new()
        .route("/v1/presentations/{target}", get(slides_get).post(slides_post))
        .route("/language/translate/v2", post(translate_text))
        .route("/language/translate/v2/detect", post(translate_detect))
        .route("/token", post(token_exchange))
        .with_state(recorder.clone());
    (spawn_server(app).await, recorder)
}

fn static_token() -> Arc<dyn TokenSource> {
    Arc::new(StaticToken(TOKEN.to_string()))
}

#[tokio::test]
async fn test_slides_get_withValidToken_shouldParsePresentation() -> Result<()> {
    let (base, _) = spawn_google_mock().await;
    let slides = GoogleSlides::new(&base, static_token(), 5);

    let presentation = slides.get_presentation("ABC123").await?;

    assert_eq!(presentation.presentation_id, "ABC123");
    assert_eq!(presentation.title.as_deref(), Some("Remote deck"));
    assert_eq!(presentation.slides.len(), 1);
    assert_eq!(presentation.slides[0].page_elements[0].object_id, "title");
    Ok(())
}

#[tokio::test]
async fn test_slides_get_withApiErrors_shouldClassifyThem() {
    let (base, _) = spawn_google_mock().await;
    let slides = GoogleSlides::new(format!("{}/", base), static_token(), 5);

    assert!(matches!(slides.get_presentation("missing").await, Err(ProviderError::NotFound(_))));
    assert!(matches!(slides.get_presentation("locked").await, Err(ProviderError::PermissionDenied(_))));
    assert!(matches!(slides.get_presentation("busy").await, Err(ProviderError::QuotaExceeded(_))));

    let unauthorized = GoogleSlides::new(&base, Arc::new(StaticToken("stale".into())), 5);
    assert!(matches!(
        unauthorized.get_presentation("ABC123").await,
        Err(ProviderError::AuthenticationError(_))
    ));
}

#[tokio::test]
async fn test_slides_get_withSlowServer_shouldHonourTimeout() {
    let (base, _) = spawn_google_mock().await;
    let slides = GoogleSlides::new(&base, static_token(), 1);

    let result = slides.get_presentation("slow").await;

    assert!(matches!(result, Err(ProviderError::ConnectionError(_))), "got {:?}", result);
}

#[tokio::test]
async fn test_slides_batch_update_shouldPostRequestsEnvelope() -> Result<()> {
    let (base, recorder) = spawn_google_mock().await;
    let slides = GoogleSlides::new(&base, static_token(), 5);

    let requests = vec![UpdateRequest::replace_all_text("Hello", "你好", "p1")];
    let response = slides.batch_update("ABC123", &requests).await?;

    assert_eq!(response.presentation_id, "ABC123");
    assert_eq!(response.occurrences_changed(), 1);
    assert_eq!(
        recorder.posts_to(":batchUpdate"),
        vec![json!({"requests": [{"replaceAllText": {
            "containsText": {"text": "Hello", "matchCase": true},
            "replaceText": "你好",
            "pageObjectIds": ["p1"]
        }}]})]
    );
    Ok(())
}

#[tokio::test]
async fn test_translate_withApiKey_shouldSendKeyAndTextFormat() -> Result<()> {
    let (base, recorder) = spawn_google_mock().await;
    let translate = GoogleTranslate::with_api_key(&base, "demo-key", 5);

    let detection = translate.detect_language("Hello").await?;
    assert_eq!(detection.language, "en");
    assert_eq!(detection.is_reliable, Some(false));

    let translated = translate.translate("Hello", Some("en"), "zh-CN").await?;
    assert_eq!(translated, "你好");

    let bodies = recorder.posts_to("/language/translate/v2");
    assert_eq!(
        bodies,
        vec![json!({"q": ["Hello"], "target": "zh-CN", "source": "en", "format": "text"})]
    );
    assert!(
        recorder
            .queries
            .lock()
            .iter()
            .all(|query| query.get("key").map(String::as_str) == Some("demo-key"))
    );
    Ok(())
}

#[tokio::test]
async fn test_translate_withUndeterminedSource_shouldOmitSource() -> Result<()> {
    let (base, recorder) = spawn_google_mock().await;
    let translate = GoogleTranslate::with_token_source(&base, static_token(), 5);

    translate.translate("你好", Some("und"), "en").await?;

    let body = &recorder.posts_to("/language/translate/v2")[0];
    assert!(body.get("source").is_none());
    assert!(recorder.queries.lock()[0].get("key").is_none());
    Ok(())
}

#[tokio::test]
async fn test_translate_connection_withRevokedKey_shouldFail() {
    let (base, _) = spawn_google_mock().await;
    let translate = GoogleTranslate::with_api_key(&base, "revoked", 5);

    let result = translate.test_connection().await;
    assert!(matches!(result, Err(ProviderError::ApiError { status_code: 400, .. })));
}

#[tokio::test]
async fn test_service_account_token_shouldExchangeOnceAndCache() -> Result<()> {
    let (base, recorder) = spawn_google_mock().await;
    let key = ServiceAccountKey::from_json(
        &json!({
            "type": "service_account",
            "project_id": "demo",
            "private_key_id": "key-1",
            "private_key": TEST_KEY_PEM,
            "client_email": "svc@demo.iam.gserviceaccount.com",
            "token_uri": format!("{}/token", base)
        })
        .to_string(),
    )?;
    let source = ServiceAccountTokenSource::new(key, scopes::ALL, 5)?;

    assert_eq!(source.access_token().await?, TOKEN);
    assert_eq!(source.access_token().await?, TOKEN);
    assert_eq!(recorder.token_exchanges.load(Ordering::SeqCst), 1);

    let assertion = recorder.posts_to("/token")[0]["assertion"]
        .as_str()
        .unwrap_or_default()
        .to_string();
    let header = jsonwebtoken::decode_header(&assertion)?;
    assert_eq!(header.alg, jsonwebtoken::Algorithm::RS256);
    assert_eq!(header.kid.as_deref(), Some("key-1"));
    Ok(())
}

#[tokio::test]
async fn test_presentation_translator_withGoogleClients_shouldRoundTripOverHttp() -> Result<()> {
    let (base, recorder) = spawn_google_mock().await;
    let slides = Arc::new(GoogleSlides::new(&base, static_token(), 5));
    let translate = Arc::new(GoogleTranslate::with_token_source(&base, static_token(), 5));
    let translator = PresentationTranslator::new(slides, translate, &TranslationConfig::default(), progress_store());

    let report = translator
        .translate_url(
            &format!("https://docs.google.com/presentation/d/{}/edit", "ABC123"),
            &TargetLanguage::Auto,
            "job",
        )
        .await?;

    assert_eq!(report.title.as_deref(), Some("Remote deck"));
    assert_eq!(report.results[0].translated_elements, 1);
    let batch = &recorder.posts_to(":batchUpdate")[0];
    assert_eq!(batch["requests"][0]["replaceAllText"]["replaceText"], "你好");
    Ok(())
}

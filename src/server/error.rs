use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use log::error;
use serde::Serialize;

use crate::errors::AppError;

/// An `AppError` rendered as a JSON error response
///
/// Client errors carry a short headline in `error`; server errors carry the
/// user guidance there, matching what the front end displays. The raw error
/// text is attached as `details` only in development.
#[derive(Debug)]
pub struct ApiError {
    pub error: AppError,
    pub expose_details: bool,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl ApiError {
    pub fn new(error: AppError, expose_details: bool) -> Self {
        Self { error, expose_details }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.error.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let message = self.error.user_message();

        let headline = if status.is_server_error() {
            error!("Request failed: {}", self.error);
            message.clone()
        } else {
            self.error.title().to_string()
        };

        let body = ErrorBody {
            success: false,
            error: headline,
            message,
            details: self.expose_details.then(|| self.error.to_string()),
        };

        (status, Json(body)).into_response()
    }
}

/// Handler for routes hit with an unsupported method
pub async fn method_not_allowed() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(serde_json::json!({ "error": "Method not allowed" })),
    )
        .into_response()
}

/*!
 * Error types for the slidelingo application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use thiserror::Error;

/// Errors that can occur when working with the Google APIs
#[derive(Error, Debug, Clone)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// The requested resource does not exist
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// The caller is not allowed to access the resource
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// The project ran out of quota for the API
    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),
}

impl ProviderError {
    /// Classify a non-success HTTP response from a Google API.
    ///
    /// `status` is the canonical RPC status string from the error body
    /// (for example `PERMISSION_DENIED`), when one was present.
    pub fn from_status(status_code: u16, status: Option<&str>, message: String) -> Self {
        let lowered = message.to_lowercase();
        if status_code == 429 || status == Some("RESOURCE_EXHAUSTED") || lowered.contains("quota") {
            return Self::QuotaExceeded(message);
        }

        match (status_code, status) {
            (404, _) | (_, Some("NOT_FOUND")) => Self::NotFound(message),
            (403, _) | (_, Some("PERMISSION_DENIED")) => Self::PermissionDenied(message),
            (401, _) | (_, Some("UNAUTHENTICATED")) => Self::AuthenticationError(message),
            _ => Self::ApiError { status_code, message },
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() || error.is_connect() {
            Self::ConnectionError(error.to_string())
        } else if error.is_decode() {
            Self::ParseError(error.to_string())
        } else {
            Self::RequestFailed(error.to_string())
        }
    }
}

/// Errors raised while loading service account credentials
#[derive(Error, Debug)]
pub enum CredentialsError {
    /// The environment variable holding the credentials is not set
    #[error("Environment variable {0} is not set")]
    MissingEnv(String),

    /// The credentials file could not be read
    #[error("Failed to read credentials file {path}: {message}")]
    Unreadable {
        /// Path that was read
        path: String,
        /// Underlying IO error
        message: String,
    },

    /// The credentials are not valid service account JSON
    #[error("Invalid service account JSON: {0}")]
    InvalidJson(String),

    /// A required field is missing from the credentials
    #[error("Service account credentials are missing field: {0}")]
    MissingField(&'static str),

    /// The private key could not be used for signing
    #[error("Invalid private key: {0}")]
    InvalidKey(String),
}

/// Errors that can occur when recording job progress
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProgressError {
    /// The requested state change is not in the transition table
    #[error("Invalid job transition for {job_id}: {from} -> {to}")]
    InvalidTransition {
        /// Job identifier
        job_id: String,
        /// Current state
        from: String,
        /// Requested state
        to: String,
    },

    /// Progress outside 0-100
    #[error("Progress must be between 0 and 100, got {0}")]
    OutOfRange(u32),
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// The submitted URL is missing or does not point to a presentation
    #[error("Invalid Google Slides URL: {0}")]
    InvalidUrl(String),

    /// Some other part of the request is invalid
    #[error("Invalid request: {0}")]
    InvalidInput(String),

    /// The presentation does not exist
    #[error("Presentation not found: {0}")]
    PresentationNotFound(String),

    /// The service account cannot open or edit the presentation
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// A provider quota was exhausted
    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(ProviderError),

    /// Error loading credentials
    #[error("Credentials error: {0}")]
    Credentials(#[from] CredentialsError),

    /// Error recording progress
    #[error("Progress error: {0}")]
    Progress(#[from] ProgressError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl AppError {
    /// HTTP status code the error maps to
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidUrl(_) | Self::InvalidInput(_) => 400,
            Self::Progress(ProgressError::InvalidTransition { .. }) => 409,
            Self::Progress(ProgressError::OutOfRange(_)) => 400,
            _ => 500,
        }
    }

    /// Short headline shown to the user
    pub fn title(&self) -> &'static str {
        match self {
            Self::InvalidUrl(_) => "Invalid Google Slides URL",
            Self::InvalidInput(_) => "Invalid request",
            Self::PresentationNotFound(_) => "Presentation not found",
            Self::PermissionDenied(_) => "Cannot access presentation",
            Self::QuotaExceeded(_) => "Service temporarily unavailable",
            Self::Progress(_) => "Invalid progress update",
            _ => "Translation failed",
        }
    }

    /// User-facing guidance for the error
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidUrl(_) => {
                "Please provide a valid Google Slides presentation URL".to_string()
            }
            Self::InvalidInput(message) => message.clone(),
            Self::PresentationNotFound(_) => {
                "Presentation not found. Please check the URL and try again.".to_string()
            }
            Self::PermissionDenied(_) => {
                "Cannot access presentation. Please ensure it's set to \"Anyone with the link can edit\"."
                    .to_string()
            }
            Self::QuotaExceeded(_) => {
                "Service temporarily unavailable due to high demand. Please try again in a few minutes."
                    .to_string()
            }
            Self::Progress(error) => error.to_string(),
            _ => "Translation failed. Please try again.".to_string(),
        }
    }
}

impl From<ProviderError> for AppError {
    fn from(error: ProviderError) -> Self {
        match error {
            ProviderError::NotFound(message) => Self::PresentationNotFound(message),
            ProviderError::PermissionDenied(message) => Self::PermissionDenied(message),
            ProviderError::QuotaExceeded(message) | ProviderError::RateLimitExceeded(message) => {
                Self::QuotaExceeded(message)
            }
            other => Self::Provider(other),
        }
    }
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

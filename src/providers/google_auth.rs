use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use log::{debug, error};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use crate::errors::{CredentialsError, ProviderError};

/// OAuth2 scopes requested by the service
pub mod scopes {
    pub const PRESENTATIONS: &str = "https://www.googleapis.com/auth/presentations";
    pub const DRIVE: &str = "https://www.googleapis.com/auth/drive";
    pub const CLOUD_TRANSLATION: &str = "https://www.googleapis.com/auth/cloud-translation";

    pub const ALL: &[&str] = &[PRESENTATIONS, DRIVE, CLOUD_TRANSLATION];
}

/// Refresh tokens this long before they expire
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Lifetime requested for the signed assertion
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// Source of OAuth2 bearer tokens
#[async_trait]
pub trait TokenSource: Send + Sync + fmt::Debug {
    /// A currently valid access token
    async fn access_token(&self) -> Result<String, ProviderError>;
}

/// A fixed token, for tests and for tokens minted outside the process
#[derive(Debug, Clone)]
pub struct StaticToken(pub String);

#[async_trait]
impl TokenSource for StaticToken {
    async fn access_token(&self) -> Result<String, ProviderError> {
        Ok(self.0.clone())
    }
}

/// Google service account key file contents
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    #[serde(rename = "type", default)]
    pub key_type: String,

    #[serde(default)]
    pub project_id: Option<String>,

    #[serde(default)]
    pub private_key_id: Option<String>,

    #[serde(default)]
    pub private_key: String,

    #[serde(default)]
    pub client_email: String,

    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

// Keep the private key out of logs
impl fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("key_type", &self.key_type)
            .field("project_id", &self.project_id)
            .field("client_email", &self.client_email)
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

impl ServiceAccountKey {
    /// Parse a service account key from JSON text
    pub fn from_json(json: &str) -> Result<Self, CredentialsError> {
        let key: ServiceAccountKey =
            serde_json::from_str(json).map_err(|e| CredentialsError::InvalidJson(e.to_string()))?;
        key.check_fields()?;
        Ok(key)
    }

    /// Load a key from an environment variable holding inline JSON or a file path
    pub fn from_env(var_name: &str) -> Result<Self, CredentialsError> {
        let value = std::env::var(var_name)
            .map_err(|_| CredentialsError::MissingEnv(var_name.to_string()))?;
        Self::from_value(&value)
    }

    /// Interpret a credentials value: inline JSON when it starts with `{`, a path otherwise
    pub fn from_value(value: &str) -> Result<Self, CredentialsError> {
        let trimmed = value.trim();
        if trimmed.starts_with('{') {
            return Self::from_json(trimmed);
        }

        let contents = std::fs::read_to_string(trimmed).map_err(|e| CredentialsError::Unreadable {
            path: trimmed.to_string(),
            message: e.to_string(),
        })?;
        Self::from_json(&contents)
    }

    fn check_fields(&self) -> Result<(), CredentialsError> {
        if self.key_type.is_empty() {
            return Err(CredentialsError::MissingField("type"));
        }
        if self.private_key.is_empty() {
            return Err(CredentialsError::MissingField("private_key"));
        }
        if self.client_email.is_empty() {
            return Err(CredentialsError::MissingField("client_email"));
        }
        Ok(())
    }
}

/// Claims of the JWT bearer assertion
#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: String,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

struct CachedToken {
    token: String,
    expires_at: Instant,
}

/// Exchanges signed service account assertions for access tokens and caches them
pub struct ServiceAccountTokenSource {
    key: ServiceAccountKey,
    encoding_key: EncodingKey,
    scope: String,
    client: Client,
    cached: Mutex<Option<CachedToken>>,
}

impl fmt::Debug for ServiceAccountTokenSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountTokenSource")
            .field("client_email", &self.key.client_email)
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

impl ServiceAccountTokenSource {
    /// Create a token source; fails if the private key is not a valid RSA PEM
    pub fn new(key: ServiceAccountKey, scopes: &[&str], timeout_secs: u64) -> Result<Self, CredentialsError> {
        let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .map_err(|e| CredentialsError::InvalidKey(e.to_string()))?;

        Ok(Self {
            key,
            encoding_key,
            scope: scopes.join(" "),
            client: super::http_client(timeout_secs),
            cached: Mutex::new(None),
        })
    }

    fn signed_assertion(&self) -> Result<String, ProviderError> {
        let now = Utc::now().timestamp();
        let claims = AssertionClaims {
            iss: &self.key.client_email,
            scope: self.scope.clone(),
            aud: &self.key.token_uri,
            iat: now,
            exp: now + ASSERTION_LIFETIME_SECS,
        };

        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.key.private_key_id.clone();

        encode(&header, &claims, &self.encoding_key)
            .map_err(|e| ProviderError::AuthenticationError(format!("Failed to sign assertion: {}", e)))
    }

    async fn fetch_token(&self) -> Result<CachedToken, ProviderError> {
        let assertion = self.signed_assertion()?;
        let response = self
            .client
            .post(&self.key.token_uri)
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<TokenErrorResponse>(&body) {
                Ok(err) => format!(
                    "{}: {}",
                    err.error,
                    err.error_description.unwrap_or_default()
                ),
                Err(_) => body,
            };
            error!("Token exchange failed ({}): {}", status, message);
            return Err(ProviderError::AuthenticationError(message));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;

        debug!("Obtained access token for {}", self.key.client_email);

        Ok(CachedToken {
            token: token.access_token,
            expires_at: Instant::now() + Duration::from_secs(token.expires_in),
        })
    }
}

#[async_trait]
impl TokenSource for ServiceAccountTokenSource {
    async fn access_token(&self) -> Result<String, ProviderError> {
        // Holding the lock across the refresh makes concurrent callers share one exchange
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.expires_at > Instant::now() + EXPIRY_MARGIN {
                return Ok(token.token.clone());
            }
        }

        let fresh = self.fetch_token().await?;
        let token = fresh.token.clone();
        *cached = Some(fresh);
        Ok(token)
    }
}

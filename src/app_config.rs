use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::language_utils::TargetLanguage;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Google API settings
    #[serde(default)]
    pub google: GoogleConfig,

    /// Translation settings
    #[serde(default)]
    pub translation: TranslationConfig,

    /// Progress store settings
    #[serde(default)]
    pub progress: ProgressConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Deployment environment, controls how much error detail reaches clients
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    #[default]
    Production,
}

impl std::str::FromStr for Environment {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            _ => Err(anyhow!("Invalid environment: {}", s)),
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServerConfig {
    /// Address to bind
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind
    #[serde(default = "default_port")]
    pub port: u16,

    /// Deployment environment
    #[serde(default)]
    pub environment: Environment,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            environment: Environment::default(),
        }
    }
}

impl ServerConfig {
    /// Whether raw error details may be included in error responses
    pub fn expose_error_details(&self) -> bool {
        self.environment == Environment::Development
    }
}

/// Google API configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GoogleConfig {
    /// Environment variable holding the service account JSON (or a path to it)
    #[serde(default = "default_credentials_env")]
    pub credentials_env: String,

    /// Cloud project id, used by the diagnostics report
    #[serde(default)]
    pub project_id: Option<String>,

    /// Optional API key for the Translation API; bearer auth is used when absent
    #[serde(default)]
    pub translate_api_key: Option<String>,

    /// Slides API base URL
    #[serde(default = "default_slides_endpoint")]
    pub slides_endpoint: String,

    /// Translation API base URL
    #[serde(default = "default_translate_endpoint")]
    pub translate_endpoint: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            credentials_env: default_credentials_env(),
            project_id: None,
            translate_api_key: None,
            slides_endpoint: default_slides_endpoint(),
            translate_endpoint: default_translate_endpoint(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// How translated text is written back to the presentation
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "snake_case")]
pub enum UpdateStrategy {
    /// Case-sensitive replace-all of the original text, scoped to the slide
    #[default]
    ReplaceAllText,
    /// Delete and re-insert the exact run range of each element
    TextRange,
}

/// Translation service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationConfig {
    /// Target language used when a request does not name one
    #[serde(default)]
    pub default_target_language: TargetLanguage,

    /// Source language assumed when detection fails
    #[serde(default = "default_fallback_language")]
    pub fallback_source_language: String,

    /// Slides processed at the same time
    #[serde(default = "default_concurrent_slides")]
    pub max_concurrent_slides: usize,

    /// Translation API calls in flight across the whole job
    #[serde(default = "default_concurrent_requests")]
    pub max_concurrent_requests: usize,

    /// How updates are written back
    #[serde(default)]
    pub update_strategy: UpdateStrategy,

    /// Whether identical texts reuse an earlier translation
    #[serde(default = "default_true")]
    pub cache_enabled: bool,

    /// Cached translations kept before the oldest are evicted
    #[serde(default = "default_cache_max_entries")]
    pub cache_max_entries: usize,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            default_target_language: TargetLanguage::default(),
            fallback_source_language: default_fallback_language(),
            max_concurrent_slides: default_concurrent_slides(),
            max_concurrent_requests: default_concurrent_requests(),
            update_strategy: UpdateStrategy::default(),
            cache_enabled: true,
            cache_max_entries: default_cache_max_entries(),
        }
    }
}

/// Progress store configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProgressConfig {
    /// Seconds a job record is kept after its last update
    #[serde(default = "default_progress_ttl_secs")]
    pub ttl_secs: u64,

    /// Seconds between background sweeps of expired records
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_progress_ttl_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_credentials_env() -> String {
    "GOOGLE_APPLICATION_CREDENTIALS".to_string()
}

fn default_slides_endpoint() -> String {
    "https://slides.googleapis.com".to_string()
}

fn default_translate_endpoint() -> String {
    "https://translation.googleapis.com".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_fallback_language() -> String {
    "en".to_string()
}

fn default_concurrent_slides() -> usize {
    4
}

fn default_concurrent_requests() -> usize {
    8
}

fn default_cache_max_entries() -> usize {
    crate::translation::cache::TranslationCache::DEFAULT_MAX_ENTRIES
}

fn default_progress_ttl_secs() -> u64 {
    3600
}

fn default_sweep_interval_secs() -> u64 {
    60
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load the configuration from a JSON file, writing defaults when it does not exist
    pub fn load_or_create(config_path: &str) -> Result<Self> {
        if Path::new(config_path).exists() {
            let file = File::open(config_path)
                .context(format!("Failed to open config file: {}", config_path))?;

            let reader = BufReader::new(file);
            let config: Config = serde_json::from_reader(reader)
                .context(format!("Failed to parse config file: {}", config_path))?;

            return Ok(config);
        }

        log::warn!("Config file not found at '{}', creating default config.", config_path);

        let config = Config::default();
        let config_json = serde_json::to_string_pretty(&config)
            .context("Failed to serialize default config to JSON")?;

        std::fs::write(config_path, config_json)
            .context(format!("Failed to write default config to file: {}", config_path))?;

        Ok(config)
    }

    /// Apply overrides from process environment variables
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides using a variable lookup function
    pub fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(host) = lookup("HOST") {
            self.server.host = host;
        }

        if let Some(port) = lookup("PORT") {
            self.server.port = port
                .parse()
                .context(format!("PORT must be a number, got '{}'", port))?;
        }

        if let Some(environment) = lookup("APP_ENV") {
            self.server.environment = environment.parse()?;
        }

        if let Some(project_id) = lookup("GOOGLE_CLOUD_PROJECT_ID") {
            self.google.project_id = Some(project_id);
        }

        if let Some(api_key) = lookup("GOOGLE_TRANSLATE_API_KEY") {
            self.google.translate_api_key = Some(api_key);
        }

        Ok(())
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        crate::language_utils::validate_language_code(&self.translation.fallback_source_language)
            .context("Invalid fallback source language")?;

        if self.translation.max_concurrent_slides == 0 {
            return Err(anyhow!("max_concurrent_slides must be at least 1"));
        }

        if self.translation.max_concurrent_requests == 0 {
            return Err(anyhow!("max_concurrent_requests must be at least 1"));
        }

        if self.progress.ttl_secs == 0 {
            return Err(anyhow!("progress.ttl_secs must be at least 1"));
        }

        if self.progress.sweep_interval_secs == 0 {
            return Err(anyhow!("progress.sweep_interval_secs must be at least 1"));
        }

        if self.translation.cache_enabled && self.translation.cache_max_entries == 0 {
            return Err(anyhow!("translation.cache_max_entries must be at least 1 when the cache is enabled"));
        }

        for (name, endpoint) in [
            ("slides_endpoint", &self.google.slides_endpoint),
            ("translate_endpoint", &self.google.translate_endpoint),
        ] {
            url::Url::parse(endpoint)
                .context(format!("Invalid google.{}: {}", name, endpoint))?;
        }

        if self.google.credentials_env.trim().is_empty() {
            return Err(anyhow!("google.credentials_env cannot be empty"));
        }

        Ok(())
    }
}

/*!
 * Credential diagnostics.
 *
 * Reports, per capability, whether the service is able to talk to Google:
 * required environment variables, service account parsing, signer
 * construction, and client construction. With `live` set the checks also
 * fetch an access token and issue one detection request.
 */

use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::app_config::GoogleConfig;
use crate::providers::TranslationProvider;
use crate::providers::google_auth::{ServiceAccountKey, ServiceAccountTokenSource, TokenSource, scopes};
use crate::providers::google_translate::GoogleTranslate;
use crate::providers::slides::GoogleSlides;

/// Environment variables the deployment is expected to define
pub const EXPECTED_ENV_VARS: &[&str] = &[
    "GOOGLE_CLOUD_PROJECT_ID",
    "GOOGLE_CLIENT_ID",
    "GOOGLE_CLIENT_SECRET",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CheckStatus {
    Pass,
    Fail,
}

impl CheckStatus {
    fn from_bool(passed: bool) -> Self {
        if passed { Self::Pass } else { Self::Fail }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EnvironmentCheck {
    pub status: CheckStatus,
    /// Variable name to whether it is set
    pub details: BTreeMap<String, bool>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialsCheck {
    pub status: CheckStatus,
    pub project_id: Option<String>,
    pub client_email: Option<String>,
    pub has_private_key: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComponentCheck {
    pub status: CheckStatus,
    pub error: Option<String>,
}

impl ComponentCheck {
    fn pass() -> Self {
        Self { status: CheckStatus::Pass, error: None }
    }

    fn fail(error: impl ToString) -> Self {
        Self { status: CheckStatus::Fail, error: Some(error.to_string()) }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticTests {
    pub environment_variables: EnvironmentCheck,
    pub credentials_parsing: CredentialsCheck,
    pub google_auth: ComponentCheck,
    pub slides_api: ComponentCheck,
    pub translation_api: ComponentCheck,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub live_access_token: Option<ComponentCheck>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub live_translation: Option<ComponentCheck>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticsReport {
    pub success: bool,
    pub tests: DiagnosticTests,
    pub timestamp: DateTime<Utc>,
}

impl DiagnosticsReport {
    /// Whether every check that ran passed
    pub fn all_passed(&self) -> bool {
        let tests = &self.tests;
        let component_checks = [
            Some(&tests.google_auth),
            Some(&tests.slides_api),
            Some(&tests.translation_api),
            tests.live_access_token.as_ref(),
            tests.live_translation.as_ref(),
        ];

        tests.environment_variables.status == CheckStatus::Pass
            && tests.credentials_parsing.status == CheckStatus::Pass
            && component_checks
                .iter()
                .flatten()
                .all(|check| check.status == CheckStatus::Pass)
    }
}

/// Run the diagnostics against the process environment
pub async fn run(config: &GoogleConfig, live: bool) -> DiagnosticsReport {
    run_with(config, |name| std::env::var(name).ok(), live).await
}

/// Run the diagnostics, reading variables through `lookup`
pub async fn run_with(
    config: &GoogleConfig,
    lookup: impl Fn(&str) -> Option<String>,
    live: bool,
) -> DiagnosticsReport {
    let environment_variables = check_environment(config, &lookup);

    let key = lookup(&config.credentials_env)
        .ok_or_else(|| format!("{} is not set", config.credentials_env))
        .and_then(|value| ServiceAccountKey::from_value(&value).map_err(|e| e.to_string()));

    let credentials_parsing = match &key {
        Ok(key) => CredentialsCheck {
            status: CheckStatus::from_bool(key.project_id.is_some()),
            project_id: key.project_id.clone(),
            client_email: Some(key.client_email.clone()),
            has_private_key: !key.private_key.is_empty(),
            error: None,
        },
        Err(e) => CredentialsCheck {
            status: CheckStatus::Fail,
            project_id: None,
            client_email: None,
            has_private_key: false,
            error: Some(e.clone()),
        },
    };

    let token_source: Result<Arc<dyn TokenSource>, String> = key.and_then(|key| {
        ServiceAccountTokenSource::new(key, scopes::ALL, config.timeout_secs)
            .map(|source| Arc::new(source) as Arc<dyn TokenSource>)
            .map_err(|e| e.to_string())
    });

    let (google_auth, slides_api) = match &token_source {
        Ok(source) => {
            let slides = GoogleSlides::new(&config.slides_endpoint, source.clone(), config.timeout_secs);
            debug!("Slides client ready: {:?}", slides);
            (ComponentCheck::pass(), ComponentCheck::pass())
        }
        Err(e) => (ComponentCheck::fail(e), ComponentCheck::fail("No usable credentials")),
    };

    let translate = match (&config.translate_api_key, &token_source) {
        (Some(api_key), _) if !api_key.is_empty() => Ok(GoogleTranslate::with_api_key(
            &config.translate_endpoint,
            api_key,
            config.timeout_secs,
        )),
        (_, Ok(source)) => Ok(GoogleTranslate::with_token_source(
            &config.translate_endpoint,
            source.clone(),
            config.timeout_secs,
        )),
        (_, Err(_)) => Err("No API key or service account available"),
    };
    let translation_api = match &translate {
        Ok(_) => ComponentCheck::pass(),
        Err(e) => ComponentCheck::fail(e),
    };

    let (live_access_token, live_translation) = if live {
        let token_check = match &token_source {
            Ok(source) => match source.access_token().await {
                Ok(_) => ComponentCheck::pass(),
                Err(e) => ComponentCheck::fail(e),
            },
            Err(_) => ComponentCheck::fail("Skipped: no service account"),
        };
        let translation_check = match &translate {
            Ok(client) => match client.test_connection().await {
                Ok(()) => ComponentCheck::pass(),
                Err(e) => ComponentCheck::fail(e),
            },
            Err(_) => ComponentCheck::fail("Skipped: no translation client"),
        };
        (Some(token_check), Some(translation_check))
    } else {
        (None, None)
    };

    let report = DiagnosticsReport {
        success: true,
        tests: DiagnosticTests {
            environment_variables,
            credentials_parsing,
            google_auth,
            slides_api,
            translation_api,
            live_access_token,
            live_translation,
        },
        timestamp: Utc::now(),
    };

    if !report.all_passed() {
        warn!("Credential diagnostics reported failures");
    }
    report
}

fn check_environment(config: &GoogleConfig, lookup: &impl Fn(&str) -> Option<String>) -> EnvironmentCheck {
    let details: BTreeMap<String, bool> = EXPECTED_ENV_VARS
        .iter()
        .copied()
        .chain(std::iter::once(config.credentials_env.as_str()))
        .map(|name| {
            let present = lookup(name).is_some_and(|value| !value.is_empty());
            (name.to_string(), present)
        })
        .collect();

    EnvironmentCheck {
        status: CheckStatus::from_bool(details.values().all(|present| *present)),
        details,
    }
}

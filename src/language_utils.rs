use anyhow::{Result, anyhow};
use isolang::Language;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Language utilities for the English/Chinese translation policy
///
/// Codes coming back from the detection API are BCP-47 tags such as `en`,
/// `zh-CN` or `zh-TW`. Validation and matching only look at the primary
/// subtag, which must be a known ISO 639-1 (or 639-3) code.

/// Target language used when an English source is auto-translated
pub const AUTO_CHINESE_TARGET: &str = "zh-CN";

/// Target language used for Chinese and any other source
pub const AUTO_DEFAULT_TARGET: &str = "en";

/// Requested target language for a translation job
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TargetLanguage {
    /// Flip English to Chinese and everything else to English
    #[default]
    Auto,
    /// Always translate into this language
    Explicit(String),
}

impl TargetLanguage {
    /// Pick the concrete target language for a detected source language
    pub fn resolve(&self, detected_source: &str) -> String {
        match self {
            Self::Explicit(code) => code.clone(),
            Self::Auto => {
                let primary = primary_subtag(detected_source);
                if primary == "en" {
                    AUTO_CHINESE_TARGET.to_string()
                } else {
                    // Chinese sources and anything unrecognised go to English
                    AUTO_DEFAULT_TARGET.to_string()
                }
            }
        }
    }
}

impl fmt::Display for TargetLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => write!(f, "auto"),
            Self::Explicit(code) => write!(f, "{}", code),
        }
    }
}

impl FromStr for TargetLanguage {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("auto") {
            return Ok(Self::Auto);
        }
        validate_language_code(trimmed)?;
        Ok(Self::Explicit(trimmed.to_string()))
    }
}

impl Serialize for TargetLanguage {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TargetLanguage {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Lowercased primary subtag of a language tag (`zh-CN` -> `zh`)
pub fn primary_subtag(code: &str) -> String {
    code.trim()
        .split(['-', '_'])
        .next()
        .unwrap_or_default()
        .to_lowercase()
}

/// Whether a detected language code denotes Chinese
pub fn is_chinese(code: &str) -> bool {
    primary_subtag(code) == "zh"
}

/// Validate that the primary subtag of a language tag is a known ISO 639 code
pub fn validate_language_code(code: &str) -> Result<()> {
    let primary = primary_subtag(code);
    let known = match primary.len() {
        2 => Language::from_639_1(&primary).is_some(),
        3 => Language::from_639_3(&primary).is_some(),
        _ => false,
    };

    if known {
        Ok(())
    } else {
        Err(anyhow!("Invalid language code: {}", code))
    }
}

/// Check if two language tags refer to the same base language
pub fn language_codes_match(code1: &str, code2: &str) -> bool {
    let first = primary_subtag(code1);
    !first.is_empty() && first == primary_subtag(code2)
}

/// Get the English language name from a code
pub fn get_language_name(code: &str) -> Result<String> {
    let primary = primary_subtag(code);
    let lang = match primary.len() {
        2 => Language::from_639_1(&primary),
        3 => Language::from_639_3(&primary),
        _ => None,
    }
    .ok_or_else(|| anyhow!("Failed to get language from code: {}", code))?;

    Ok(lang.to_name().to_string())
}

// API connection configuration

use crate::{ConfigError, ConfigValidator, Result, Validate};
use serde::{Deserialize, Deserializer, Serialize};
use std::time::Duration;

/// Raw connection keys as they appear in a configuration source.
///
/// Numeric keys accept numbers or numeric strings, since values loaded from
/// the environment are always strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base address of the remote API
    pub source: String,

    #[serde(default)]
    pub resource: Option<String>,

    #[serde(default)]
    pub resource_path: Option<String>,

    /// Seconds before a single attempt is abandoned
    #[serde(default, deserialize_with = "lenient_int")]
    pub timeout: Option<i64>,

    /// Retries after the first attempt
    #[serde(default, deserialize_with = "lenient_int")]
    pub retry_count: Option<i64>,
}

impl ApiConfig {
    /// Keys understood by [`ConfigManager::api_config`](crate::ConfigManager::api_config)
    pub const KEYS: [&'static str; 5] = [
        "source",
        "resource",
        "resource_path",
        "timeout",
        "retry_count",
    ];

    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            resource: None,
            resource_path: None,
            timeout: None,
            retry_count: None,
        }
    }

    /// Layer these values over `defaults`.
    ///
    /// An explicit value wins over the default. A timeout or retry count of
    /// `0` means "use the default", negative values are rejected. A resource
    /// path made only of whitespace falls back to the default, while an
    /// explicit empty string disables it.
    pub fn resolve(&self, defaults: &ApiDefaults) -> Result<ApiConnectionConfig> {
        self.validate()?;

        let resource = self
            .resource
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_string);

        let resource_path = match self.resource_path.as_deref() {
            Some("") => String::new(),
            Some(path) if !path.trim().is_empty() => path.trim().to_string(),
            _ => defaults.resource_path.clone(),
        };

        let timeout = match self.timeout {
            Some(seconds) if seconds > 0 => Duration::from_secs(seconds as u64),
            _ => defaults.timeout,
        };

        let retry_count = match self.retry_count {
            Some(count) if count > 0 => u32::try_from(count).map_err(|_| {
                ConfigError::ValidationError(format!("retry_count {} is too large", count))
            })?,
            _ => defaults.retry_count,
        };

        Ok(ApiConnectionConfig {
            source: self.source.trim().to_string(),
            resource,
            resource_path,
            timeout,
            retry_count,
        })
    }
}

impl Validate for ApiConfig {
    fn validate(&self) -> Result<()> {
        ConfigValidator::not_empty(self.source.trim(), "source")?;
        ConfigValidator::is_url(self.source.trim(), "source")?;
        if let Some(timeout) = self.timeout {
            ConfigValidator::non_negative(timeout, "timeout")?;
        }
        if let Some(retry_count) = self.retry_count {
            ConfigValidator::non_negative(retry_count, "retry_count")?;
        }
        Ok(())
    }
}

/// Fallback values used when a key is absent or zero
#[derive(Debug, Clone, PartialEq)]
pub struct ApiDefaults {
    pub resource_path: String,
    pub timeout: Duration,
    pub retry_count: u32,
}

impl Default for ApiDefaults {
    fn default() -> Self {
        Self {
            resource_path: "api/".to_string(),
            timeout: Duration::from_secs(30),
            retry_count: 0,
        }
    }
}

/// Connection values after layering, ready to build connection settings
#[derive(Debug, Clone, PartialEq)]
pub struct ApiConnectionConfig {
    pub source: String,
    pub resource: Option<String>,
    pub resource_path: String,
    pub timeout: Duration,
    pub retry_count: u32,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IntOrString {
    Int(i64),
    Text(String),
}

fn lenient_int<'de, D>(deserializer: D) -> std::result::Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<IntOrString>::deserialize(deserializer)? {
        None => Ok(None),
        Some(IntOrString::Int(value)) => Ok(Some(value)),
        Some(IntOrString::Text(text)) if text.trim().is_empty() => Ok(None),
        Some(IntOrString::Text(text)) => text
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("expected an integer, got {:?}", text))),
    }
}

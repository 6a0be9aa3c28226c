//! Connection settings.

use crate::{ApiError, Result};
use serene_config::ApiConnectionConfig;
use std::time::Duration;
use url::Url;

/// Timeout applied when nothing else is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Retries applied when nothing else is configured.
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 0;

/// Where requests go and how long they may take.
///
/// The source is composed once from the base address, resource path and
/// resource:
///
/// * the base address always ends with `/`
/// * the resource path ends with `/` unless it is empty
/// * the resource has no leading or trailing `/`
///
/// Settings are read-only once a handler has been built.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionSettings {
    base_address: String,
    resource: Option<String>,
    resource_path: String,
    source: Url,
    timeout: Duration,
    retry_attempts: u32,
}

impl ConnectionSettings {
    /// Create settings with the default timeout and retry count.
    ///
    /// ```
    /// use serene_http_client::ConnectionSettings;
    ///
    /// let settings = ConnectionSettings::new("http://x.test", Some("/widgets/"), Some("api")).unwrap();
    /// assert_eq!(settings.source().as_str(), "http://x.test/api/widgets");
    /// ```
    pub fn new(
        base_address: &str,
        resource: Option<&str>,
        resource_path: Option<&str>,
    ) -> Result<Self> {
        let base_address = base_address.trim();
        if base_address.is_empty() {
            return Err(ApiError::Configuration(
                "a base address is required".to_string(),
            ));
        }

        let base_address = format!("{}/", base_address.trim_end_matches('/'));
        let resource = resource
            .map(|r| r.trim().trim_matches('/'))
            .filter(|r| !r.is_empty())
            .map(str::to_string);
        let resource_path = normalize_path(resource_path.unwrap_or_default());

        let source = compose_source(&base_address, &resource_path, resource.as_deref())?;

        Ok(Self {
            base_address,
            resource,
            resource_path,
            source,
            timeout: DEFAULT_TIMEOUT,
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
        })
    }

    /// Create settings from layered configuration.
    pub fn from_config(config: &ApiConnectionConfig) -> Result<Self> {
        Ok(Self::new(
            &config.source,
            config.resource.as_deref(),
            Some(&config.resource_path),
        )?
        .with_timeout(config.timeout)
        .with_retry_attempts(config.retry_count))
    }

    /// Set the per-attempt timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the number of retries after the first attempt.
    pub fn with_retry_attempts(mut self, retry_attempts: u32) -> Self {
        self.retry_attempts = retry_attempts;
        self
    }

    /// Target a resource, recomposing the source.
    pub(crate) fn with_resource(&self, resource: &str) -> Result<Self> {
        if let Some(existing) = &self.resource {
            return Err(ApiError::ResourceAlreadySet(existing.clone()));
        }

        Ok(Self::new(&self.base_address, Some(resource), Some(&self.resource_path))?
            .with_timeout(self.timeout)
            .with_retry_attempts(self.retry_attempts))
    }

    pub fn base_address(&self) -> &str {
        &self.base_address
    }

    pub fn resource(&self) -> Option<&str> {
        self.resource.as_deref()
    }

    pub fn resource_path(&self) -> &str {
        &self.resource_path
    }

    /// Composed base address, resource path and resource.
    pub fn source(&self) -> &Url {
        &self.source
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn retry_attempts(&self) -> u32 {
        self.retry_attempts
    }
}

fn normalize_path(path: &str) -> String {
    let path = path.trim().trim_matches('/');
    if path.is_empty() {
        String::new()
    } else {
        format!("{}/", path)
    }
}

fn compose_source(base_address: &str, resource_path: &str, resource: Option<&str>) -> Result<Url> {
    let mut source = format!("{}{}", base_address, resource_path);
    if let Some(resource) = resource {
        source.push_str(resource);
    }

    Ok(Url::parse(&source)?)
}

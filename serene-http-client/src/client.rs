//! reqwest-backed transport and connection provider.

use async_trait::async_trait;
use http::HeaderValue;
use http::header::{AUTHORIZATION, CONTENT_TYPE};
use std::sync::Arc;
use tracing::debug;

use crate::{
    ApiError, Authentication, ConnectionProvider, ConnectionSettings, RawResponse, Result,
    Transport, TransportError, TransportHandle, TransportOutcome, TransportRequest,
};

/// User agent sent when none is configured.
pub const DEFAULT_USER_AGENT: &str = concat!("serene/", env!("CARGO_PKG_VERSION"));

/// Transport performing calls through a [`reqwest::Client`].
#[derive(Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    authorization: Option<HeaderValue>,
}

impl ReqwestTransport {
    /// Create a transport around an existing client.
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            authorization: None,
        }
    }

    /// Send credentials with every request.
    pub fn with_authorization(mut self, authorization: Option<HeaderValue>) -> Self {
        self.authorization = authorization;
        self
    }

    fn classify(error: reqwest::Error) -> TransportOutcome {
        if error.is_timeout() {
            TransportOutcome::TimedOut
        } else {
            TransportOutcome::Error(TransportError::Http(error))
        }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: &TransportRequest) -> TransportOutcome {
        let method = match request.method.to_http() {
            Ok(method) => method,
            Err(e) => return TransportOutcome::Error(TransportError::Other(e.to_string())),
        };

        let mut builder = self.client.request(method, request.url.clone());

        if let Some(authorization) = &self.authorization {
            builder = builder.header(AUTHORIZATION, authorization.clone());
        }

        if let Some(content) = &request.content {
            builder = builder
                .header(CONTENT_TYPE, content.media_type())
                .body(content.body().clone());
        }

        debug!(
            request_id = %request.identity,
            method = %request.method,
            url = %request.url,
            "Sending HTTP request"
        );

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => return Self::classify(e),
        };

        match RawResponse::from_reqwest(response).await {
            Ok(response) => TransportOutcome::Completed(response),
            Err(e) => Self::classify(e),
        }
    }
}

/// Connection provider backed by reqwest.
///
/// By default every acquisition builds a fresh client configured with the
/// connection's timeout, which is dropped when the attempt ends. With
/// [`with_override`](Self::with_override) a caller-supplied client is shared
/// by every attempt and never disposed.
#[derive(Clone)]
pub struct ClientFactory {
    user_agent: String,
    authorization: Option<HeaderValue>,
    client_override: Option<reqwest::Client>,
    shared: Option<Arc<dyn Transport>>,
}

impl ClientFactory {
    /// Create a factory building a new client per attempt.
    pub fn new() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            authorization: None,
            client_override: None,
            shared: None,
        }
    }

    /// Set the user agent of managed clients.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Send credentials with every request.
    pub fn with_authentication(mut self, authentication: &Authentication) -> Result<Self> {
        self.authorization = Some(authentication.header_value()?);
        self.share_override();
        Ok(self)
    }

    /// Use a caller-owned client for every attempt.
    pub fn with_override(mut self, client: reqwest::Client) -> Self {
        self.client_override = Some(client);
        self.share_override();
        self
    }

    /// Whether acquisitions borrow a caller-owned client.
    pub fn is_override(&self) -> bool {
        self.client_override.is_some()
    }

    fn share_override(&mut self) {
        self.shared = self.client_override.clone().map(|client| {
            Arc::new(
                ReqwestTransport::new(client).with_authorization(self.authorization.clone()),
            ) as Arc<dyn Transport>
        });
    }

    fn build_client(&self, settings: &ConnectionSettings) -> Result<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(settings.timeout())
            .user_agent(&self.user_agent)
            .gzip(true)
            .brotli(true)
            .build()
            .map_err(|e| ApiError::Configuration(format!("failed to build HTTP client: {}", e)))
    }
}

impl Default for ClientFactory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConnectionProvider for ClientFactory {
    async fn acquire(&self, settings: &ConnectionSettings) -> Result<TransportHandle> {
        if let Some(shared) = &self.shared {
            return Ok(TransportHandle::borrowed(shared.clone()));
        }

        let client = self.build_client(settings)?;
        debug!(source = %settings.source(), timeout = ?settings.timeout(), "Created HTTP client");

        Ok(TransportHandle::managed(
            ReqwestTransport::new(client).with_authorization(self.authorization.clone()),
        ))
    }
}

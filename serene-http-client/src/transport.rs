//! Transport abstraction.
//!
//! A [`Transport`] performs exactly one outbound call and reports how it
//! went as a [`TransportOutcome`]. A [`ConnectionProvider`] hands out a
//! [`TransportHandle`] per attempt, either owned by the attempt or borrowed
//! from the caller.

use crate::{ApiRequest, ConnectionSettings, Method, RequestContent, Result, TransportError};
use async_trait::async_trait;
use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use std::fmt;
use std::sync::Arc;
use tracing::debug;
use url::Url;
use uuid::Uuid;

/// What a transport sends.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportRequest {
    /// Identity of the originating request.
    pub identity: Uuid,
    pub method: Method,
    pub url: Url,
    pub content: Option<RequestContent>,
}

impl From<&ApiRequest> for TransportRequest {
    fn from(request: &ApiRequest) -> Self {
        Self {
            identity: request.identity(),
            method: request.method(),
            url: request.route().clone(),
            content: request.content().cloned(),
        }
    }
}

/// A response as received from the remote peer, whatever its status.
#[derive(Debug, Clone)]
pub struct RawResponse {
    status: StatusCode,
    reason: Option<String>,
    headers: HeaderMap,
    body: Bytes,
}

impl RawResponse {
    /// Create an empty response with the given status.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            reason: None,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    /// Override the reason phrase.
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Add a header, ignoring names or values that are not valid.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::try_from(name),
            HeaderValue::try_from(value),
        ) {
            self.headers.insert(name, value);
        }
        self
    }

    /// Set the body.
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Read a reqwest response, including its body.
    pub(crate) async fn from_reqwest(
        response: reqwest::Response,
    ) -> std::result::Result<Self, reqwest::Error> {
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        Ok(Self {
            status,
            reason: None,
            headers,
            body,
        })
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Check if the response was successful (2xx).
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// The reason phrase, falling back to the canonical one for the status.
    pub fn reason_phrase(&self) -> Option<&str> {
        self.reason
            .as_deref()
            .or_else(|| self.status.canonical_reason())
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }
}

/// Result of one outbound call.
#[derive(Debug)]
pub enum TransportOutcome {
    /// The peer answered, with any status code.
    Completed(RawResponse),
    /// The call was abandoned because it took too long.
    TimedOut,
    /// The call failed for another reason.
    Error(TransportError),
}

/// Performs outbound calls.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send one request.
    async fn send(&self, request: &TransportRequest) -> TransportOutcome;
}

/// A transport held for the duration of an attempt.
pub enum TransportHandle {
    /// Owned by the attempt and disposed when it ends.
    Managed(Box<dyn Transport>),
    /// Supplied by the caller and only borrowed.
    Override(Arc<dyn Transport>),
}

impl TransportHandle {
    /// Wrap a transport owned by the attempt.
    pub fn managed(transport: impl Transport + 'static) -> Self {
        Self::Managed(Box::new(transport))
    }

    /// Borrow a caller-owned transport.
    pub fn borrowed(transport: Arc<dyn Transport>) -> Self {
        Self::Override(transport)
    }

    /// Whether the handle outlives the attempt that acquired it.
    pub fn is_persistent(&self) -> bool {
        matches!(self, Self::Override(_))
    }

    pub async fn send(&self, request: &TransportRequest) -> TransportOutcome {
        match self {
            Self::Managed(transport) => transport.send(request).await,
            Self::Override(transport) => transport.send(request).await,
        }
    }

    /// Release the handle.
    ///
    /// Managed transports are dropped. Caller-owned transports are left
    /// untouched.
    pub fn dispose(self) {
        match self {
            Self::Managed(transport) => {
                drop(transport);
                debug!("Disposed managed transport");
            }
            Self::Override(_) => {}
        }
    }
}

impl fmt::Debug for TransportHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Managed(_) => f.write_str("TransportHandle::Managed"),
            Self::Override(_) => f.write_str("TransportHandle::Override"),
        }
    }
}

/// Supplies a transport handle per attempt.
#[async_trait]
pub trait ConnectionProvider: Send + Sync {
    /// Acquire a handle for the given connection.
    ///
    /// Fails only when the provider is misconfigured.
    async fn acquire(&self, settings: &ConnectionSettings) -> Result<TransportHandle>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Tracked(Arc<AtomicUsize>);

    impl Drop for Tracked {
        fn drop(&mut self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl Transport for Tracked {
        async fn send(&self, _request: &TransportRequest) -> TransportOutcome {
            TransportOutcome::Completed(RawResponse::new(StatusCode::NO_CONTENT))
        }
    }

    #[test]
    fn test_managed_handles_are_dropped_on_dispose() {
        let dropped = Arc::new(AtomicUsize::new(0));
        let handle = TransportHandle::managed(Tracked(dropped.clone()));

        assert!(!handle.is_persistent());
        handle.dispose();
        assert_eq!(dropped.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_borrowed_handles_survive_dispose() {
        let dropped = Arc::new(AtomicUsize::new(0));
        let shared: Arc<dyn Transport> = Arc::new(Tracked(dropped.clone()));
        let handle = TransportHandle::borrowed(shared.clone());

        assert!(handle.is_persistent());
        handle.dispose();
        assert_eq!(dropped.load(Ordering::SeqCst), 0);
        assert_eq!(Arc::strong_count(&shared), 1);
    }

    #[tokio::test]
    async fn test_handle_sends_through_transport() {
        let handle = TransportHandle::managed(Tracked(Arc::new(AtomicUsize::new(0))));
        let request = TransportRequest {
            identity: Uuid::new_v4(),
            method: Method::Get,
            url: Url::parse("http://x.test/api/widgets").unwrap(),
            content: None,
        };

        assert!(matches!(
            handle.send(&request).await,
            TransportOutcome::Completed(response) if response.status() == StatusCode::NO_CONTENT
        ));
    }

    #[test]
    fn test_reason_phrase_fallback() {
        let canonical = RawResponse::new(StatusCode::NOT_FOUND);
        assert_eq!(canonical.reason_phrase(), Some("Not Found"));

        let custom = RawResponse::new(StatusCode::NOT_FOUND).with_reason("No Such Widget");
        assert_eq!(custom.reason_phrase(), Some("No Such Widget"));
    }
}

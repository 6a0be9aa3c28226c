// Mock transports for testing handlers without a network

use async_trait::async_trait;
use bytes::Bytes;
use http::StatusCode;
use parking_lot::Mutex;
use serde::Serialize;
use serene_http_client::{
    ConnectionProvider, ConnectionSettings, Method, RawResponse, Result, Transport,
    TransportError, TransportHandle, TransportOutcome, TransportRequest,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone)]
enum Reply {
    Respond {
        status: StatusCode,
        reason: Option<String>,
        content_type: Option<&'static str>,
        body: Bytes,
    },
    TimedOut,
    Error(String),
}

#[derive(Debug)]
struct Delay {
    duration: Duration,
    remaining: AtomicU32,
}

impl Delay {
    /// Consume one delayed answer, if any are left.
    fn take(&self) -> Option<Duration> {
        self.remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .ok()
            .map(|_| self.duration)
    }
}

/// A scripted answer for [`MockTransport`].
///
/// Without matchers a response answers every request. Each matcher narrows
/// the requests it answers.
#[derive(Debug)]
pub struct MockResponse {
    reply: Reply,
    delay: Option<Delay>,
    method: Option<Method>,
    route: Option<String>,
    content: Option<std::result::Result<serde_json::Value, String>>,
}

impl MockResponse {
    fn from_reply(reply: Reply) -> Self {
        Self {
            reply,
            delay: None,
            method: None,
            route: None,
            content: None,
        }
    }

    /// Answer with `status` and no body.
    pub fn status(status: StatusCode) -> Self {
        Self::raw(status, Bytes::new())
    }

    /// Answer with `status` and an arbitrary body.
    pub fn raw(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self::from_reply(Reply::Respond {
            status,
            reason: None,
            content_type: None,
            body: body.into(),
        })
    }

    /// Answer `200 OK` with `value` serialized as JSON.
    ///
    /// A value that cannot be serialized produces a transport error when
    /// the response is used.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(body) => Self::from_reply(Reply::Respond {
                status: StatusCode::OK,
                reason: None,
                content_type: Some("application/json"),
                body: body.into(),
            }),
            Err(e) => Self::from_reply(Reply::Error(format!("invalid mock body: {}", e))),
        }
    }

    /// Abandon the call as if it took too long.
    pub fn timed_out() -> Self {
        Self::from_reply(Reply::TimedOut)
    }

    /// Fail the call before a response arrives.
    pub fn transport_error(message: impl Into<String>) -> Self {
        Self::from_reply(Reply::Error(message.into()))
    }

    /// Replace the status of a responding mock.
    pub fn with_status(mut self, new_status: StatusCode) -> Self {
        if let Reply::Respond { status, .. } = &mut self.reply {
            *status = new_status;
        }
        self
    }

    /// Replace the reason phrase of a responding mock.
    pub fn reason(mut self, phrase: impl Into<String>) -> Self {
        if let Reply::Respond { reason, .. } = &mut self.reply {
            *reason = Some(phrase.into());
        }
        self
    }

    /// Wait `duration` before answering the first `times` matching requests.
    pub fn delayed(mut self, duration: Duration, times: u32) -> Self {
        self.delay = Some(Delay {
            duration,
            remaining: AtomicU32::new(times),
        });
        self
    }

    /// Only answer requests using `method`.
    pub fn for_method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    /// Only answer requests to `route`, given either as a full URL or as a
    /// path such as `/api/widgets/1`.
    pub fn for_route(mut self, route: impl Into<String>) -> Self {
        self.route = Some(route.into());
        self
    }

    /// Only answer requests whose JSON body equals `content`.
    pub fn for_content<C: Serialize + ?Sized>(mut self, content: &C) -> Self {
        self.content = Some(serde_json::to_value(content).map_err(|e| e.to_string()));
        self
    }

    fn matches(&self, request: &TransportRequest) -> bool {
        if self.method.is_some_and(|method| method != request.method) {
            return false;
        }

        if let Some(route) = &self.route
            && request.url.as_str() != route
            && request.url.path() != route
        {
            return false;
        }

        match &self.content {
            None => true,
            Some(Err(_)) => false,
            Some(Ok(expected)) => request
                .content
                .as_ref()
                .and_then(|c| serde_json::from_slice::<serde_json::Value>(c.body()).ok())
                .is_some_and(|actual| &actual == expected),
        }
    }

    async fn answer(&self) -> TransportOutcome {
        if let Some(duration) = self.delay.as_ref().and_then(Delay::take) {
            tokio::time::sleep(duration).await;
        }

        match &self.reply {
            Reply::Respond {
                status,
                reason,
                content_type,
                body,
            } => {
                let mut response = RawResponse::new(*status).with_body(body.clone());
                if let Some(reason) = reason {
                    response = response.with_reason(reason.clone());
                }
                if let Some(content_type) = content_type {
                    response = response.with_header("content-type", content_type);
                }
                TransportOutcome::Completed(response)
            }
            Reply::TimedOut => TransportOutcome::TimedOut,
            Reply::Error(message) => {
                TransportOutcome::Error(TransportError::Other(message.clone()))
            }
        }
    }
}

struct MockInner {
    responses: Vec<MockResponse>,
    requests: Mutex<Vec<TransportRequest>>,
}

/// Transport answering from a list of [`MockResponse`]s.
///
/// The first response matching a request answers it. Every request is
/// recorded, matched or not.
#[derive(Clone)]
pub struct MockTransport {
    inner: Arc<MockInner>,
}

impl MockTransport {
    pub fn new(responses: impl IntoIterator<Item = MockResponse>) -> Self {
        Self {
            inner: Arc::new(MockInner {
                responses: responses.into_iter().collect(),
                requests: Mutex::new(Vec::new()),
            }),
        }
    }

    /// All requests received so far.
    pub fn requests(&self) -> Vec<TransportRequest> {
        self.inner.requests.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.inner.requests.lock().len()
    }

    /// The most recent request.
    pub fn last_request(&self) -> Option<TransportRequest> {
        self.inner.requests.lock().last().cloned()
    }

    pub fn clear_requests(&self) {
        self.inner.requests.lock().clear();
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: &TransportRequest) -> TransportOutcome {
        self.inner.requests.lock().push(request.clone());

        match self.inner.responses.iter().find(|r| r.matches(request)) {
            Some(response) => response.answer().await,
            None => {
                debug!(method = %request.method, route = %request.url, "No mock response matched");
                TransportOutcome::Error(TransportError::Other(format!(
                    "no mock response matches {} {}",
                    request.method, request.url
                )))
            }
        }
    }
}

/// Counts its own disposal.
struct Tracked {
    transport: MockTransport,
    disposed: Arc<AtomicUsize>,
}

impl Drop for Tracked {
    fn drop(&mut self) {
        self.disposed.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Transport for Tracked {
    async fn send(&self, request: &TransportRequest) -> TransportOutcome {
        self.transport.send(request).await
    }
}

/// Connection provider handing out a [`MockTransport`].
///
/// In managed mode each acquisition yields a fresh handle that is disposed
/// after its attempt. In override mode the same caller-owned transport is
/// lent to every attempt and never disposed.
#[derive(Clone)]
pub struct MockConnectionProvider {
    transport: MockTransport,
    shared: Option<Arc<dyn Transport>>,
    acquired: Arc<AtomicUsize>,
    disposed: Arc<AtomicUsize>,
}

impl MockConnectionProvider {
    /// Fresh managed handle per attempt.
    pub fn managed(transport: MockTransport) -> Self {
        Self {
            transport,
            shared: None,
            acquired: Arc::new(AtomicUsize::new(0)),
            disposed: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// One borrowed handle for every attempt.
    pub fn override_client(transport: MockTransport) -> Self {
        let shared: Arc<dyn Transport> = Arc::new(transport.clone());
        Self {
            shared: Some(shared),
            ..Self::managed(transport)
        }
    }

    pub fn transport(&self) -> &MockTransport {
        &self.transport
    }

    /// Number of handles acquired.
    pub fn acquired(&self) -> usize {
        self.acquired.load(Ordering::SeqCst)
    }

    /// Number of managed handles disposed.
    pub fn disposed(&self) -> usize {
        self.disposed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConnectionProvider for MockConnectionProvider {
    async fn acquire(&self, _settings: &ConnectionSettings) -> Result<TransportHandle> {
        self.acquired.fetch_add(1, Ordering::SeqCst);

        Ok(match &self.shared {
            Some(shared) => TransportHandle::borrowed(shared.clone()),
            None => TransportHandle::managed(Tracked {
                transport: self.transport.clone(),
                disposed: self.disposed.clone(),
            }),
        })
    }
}

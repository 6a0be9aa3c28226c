//! Retry engine.
//!
//! Drives the attempts of one request: acquire a transport handle, send the
//! request under the connection timeout, and retry immediately when the
//! attempt timed out. Any other outcome ends the loop. With
//! `retry_attempts = N` a request is attempted at most `N + 1` times.

use crate::{
    ApiError, ApiRequest, ConnectionProvider, ConnectionSettings, EventPublisher, Method,
    RawResponse, Result, RetryEvent, TransportError, TransportHandle, TransportOutcome,
    TransportRequest,
};
use tracing::{debug, error, warn};
use url::Url;

/// How a request execution ended.
#[derive(Debug)]
pub enum Execution {
    /// The peer answered, with any status code.
    Completed(RawResponse),
    /// The request could not be completed.
    Failed(TerminalFailure),
}

/// A failure that stops the retry loop.
#[derive(Debug)]
pub enum TerminalFailure {
    /// Every attempt timed out.
    TimedOut {
        route: Url,
        /// Attempts made, including the first.
        attempts: u32,
    },
    /// The transport failed for another reason.
    Transport {
        method: Method,
        cause: TransportError,
    },
}

/// Executes requests against one connection.
pub struct RetryEngine<'a> {
    settings: &'a ConnectionSettings,
    provider: &'a dyn ConnectionProvider,
    events: Option<&'a EventPublisher>,
}

impl<'a> RetryEngine<'a> {
    pub fn new(settings: &'a ConnectionSettings, provider: &'a dyn ConnectionProvider) -> Self {
        Self {
            settings,
            provider,
            events: None,
        }
    }

    /// Publish a [`RetryEvent`] before every retry.
    pub fn with_events(mut self, events: &'a EventPublisher) -> Self {
        self.events = Some(events);
        self
    }

    /// Execute a request.
    ///
    /// Returns `Err` only for programming errors: a request without a method,
    /// in-body content on a GET or DELETE, or a misconfigured provider. These
    /// are never retried.
    pub async fn execute(&self, request: &ApiRequest) -> Result<Execution> {
        let method = request.method();

        if method == Method::None {
            warn!(request_id = %request.identity(), "Request has no method");
            return Err(ApiError::InvalidMethod(method));
        }

        if !method.allows_body() && request.content().is_some() {
            warn!(
                request_id = %request.identity(),
                method = %method,
                "In-body content is not allowed for this method"
            );
            return Err(ApiError::BodyNotAllowed(method));
        }

        let outbound = TransportRequest::from(request);
        let retry_attempts = self.settings.retry_attempts();
        let mut held: Option<TransportHandle> = None;
        let mut attempt: u32 = 0;

        loop {
            let outcome = self.attempt(&mut held, &outbound).await;

            if let Some(handle) = held.take_if(|handle| !handle.is_persistent()) {
                handle.dispose();
            }

            match outcome? {
                TransportOutcome::Completed(response) => {
                    debug!(
                        request_id = %request.identity(),
                        status = %response.status(),
                        attempt = attempt + 1,
                        "Request completed"
                    );
                    return Ok(Execution::Completed(response));
                }
                TransportOutcome::TimedOut => {
                    if attempt == retry_attempts {
                        error!(
                            request_id = %request.identity(),
                            route = %request.route(),
                            attempts = attempt + 1,
                            "The request timed out; retry limit reached"
                        );
                        return Ok(Execution::Failed(TerminalFailure::TimedOut {
                            route: request.route().clone(),
                            attempts: attempt + 1,
                        }));
                    }

                    attempt += 1;
                    let retries_remaining = retry_attempts - attempt;

                    warn!(
                        request_id = %request.identity(),
                        route = %request.route(),
                        attempt,
                        retries_remaining,
                        "The request timed out; retrying"
                    );

                    if let Some(events) = self.events {
                        events.publish(RetryEvent::new(
                            request.identity(),
                            attempt,
                            retries_remaining,
                        ));
                    }
                }
                TransportOutcome::Error(cause) => {
                    error!(
                        request_id = %request.identity(),
                        method = %method,
                        error = %cause,
                        connection = cause.is_connection(),
                        "An exception occurred whilst performing the request"
                    );
                    return Ok(Execution::Failed(TerminalFailure::Transport { method, cause }));
                }
            }
        }
    }

    /// One attempt. The handle is put back into `held` once the call ends.
    async fn attempt(
        &self,
        held: &mut Option<TransportHandle>,
        request: &TransportRequest,
    ) -> Result<TransportOutcome> {
        let timeout = self.settings.timeout();

        let handle = match held.take() {
            Some(handle) => handle,
            None => match tokio::time::timeout(timeout, self.provider.acquire(self.settings)).await
            {
                Ok(acquired) => acquired?,
                Err(_) => return Ok(TransportOutcome::TimedOut),
            },
        };

        let outcome = match tokio::time::timeout(timeout, handle.send(request)).await {
            Ok(outcome) => outcome,
            Err(_) => TransportOutcome::TimedOut,
        };

        *held = Some(handle);
        Ok(outcome)
    }
}

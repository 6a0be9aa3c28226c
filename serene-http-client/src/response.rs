//! Response envelopes.
//!
//! Every request ends in an envelope. A successful envelope never carries a
//! message or an exception, and a failed one never carries a result.

use crate::ApiException;
use http::StatusCode;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;
use uuid::Uuid;

/// Status of a response, or none when no response was received.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Status(Option<StatusCode>);

impl Status {
    /// No response was received.
    pub const NONE: Status = Status(None);

    pub fn new(code: StatusCode) -> Self {
        Self(Some(code))
    }

    /// Get the status code, if a response was received.
    pub fn code(&self) -> Option<StatusCode> {
        self.0
    }

    pub fn is_none(&self) -> bool {
        self.0.is_none()
    }

    /// Check if the status is in the 2xx range.
    pub fn is_success(&self) -> bool {
        self.0.is_some_and(|code| code.is_success())
    }
}

impl From<StatusCode> for Status {
    fn from(code: StatusCode) -> Self {
        Self::new(code)
    }
}

impl PartialEq<StatusCode> for Status {
    fn eq(&self, other: &StatusCode) -> bool {
        self.0 == Some(*other)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(code) => write!(f, "{}", code),
            None => f.write_str("none"),
        }
    }
}

/// Outcome of a request without a payload.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    request_id: Uuid,
    status: Status,
    successful: bool,
    message: Option<String>,
    exception: Option<Arc<ApiException>>,
}

impl ApiResponse {
    /// Create a successful response.
    ///
    /// `status` must be a 2xx code; anything else is a failure.
    pub fn success(request_id: Uuid, status: StatusCode) -> Self {
        debug_assert!(
            status.is_success(),
            "a successful response needs a 2xx status, got {}",
            status
        );

        Self {
            request_id,
            status: Status::new(status),
            successful: true,
            message: None,
            exception: None,
        }
    }

    /// Create a failed response for an expected, non-exceptional outcome.
    pub fn failure(request_id: Uuid, status: impl Into<Status>, message: impl Into<String>) -> Self {
        Self {
            request_id,
            status: status.into(),
            successful: false,
            message: Some(message.into()),
            exception: None,
        }
    }

    /// Create a failed response caused by an exception.
    pub fn failure_with_exception(
        request_id: Uuid,
        status: impl Into<Status>,
        message: impl Into<String>,
        exception: ApiException,
    ) -> Self {
        Self {
            exception: Some(Arc::new(exception)),
            ..Self::failure(request_id, status, message)
        }
    }

    /// Identity of the request this response answers.
    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn was_successful(&self) -> bool {
        self.successful
    }

    pub fn has_exception(&self) -> bool {
        self.exception.is_some()
    }

    /// Why the request failed; `None` on success.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn exception(&self) -> Option<&ApiException> {
        self.exception.as_deref()
    }
}

/// Outcome of a request carrying a deserialized payload.
///
/// Derefs to the untyped [`ApiResponse`] for status and failure details.
#[derive(Debug, Clone)]
pub struct TypedApiResponse<T> {
    response: ApiResponse,
    result: Option<T>,
}

impl<T> TypedApiResponse<T> {
    /// Create a successful response with its payload.
    ///
    /// `status` must be a 2xx code; anything else is a failure.
    pub fn success(request_id: Uuid, status: StatusCode, result: T) -> Self {
        Self {
            response: ApiResponse::success(request_id, status),
            result: Some(result),
        }
    }

    /// Create a failed response for an expected, non-exceptional outcome.
    pub fn failure(request_id: Uuid, status: impl Into<Status>, message: impl Into<String>) -> Self {
        Self {
            response: ApiResponse::failure(request_id, status, message),
            result: None,
        }
    }

    /// Create a failed response caused by an exception.
    pub fn failure_with_exception(
        request_id: Uuid,
        status: impl Into<Status>,
        message: impl Into<String>,
        exception: ApiException,
    ) -> Self {
        Self {
            response: ApiResponse::failure_with_exception(request_id, status, message, exception),
            result: None,
        }
    }

    /// Carry over a failed untyped response.
    pub(crate) fn from_failure(response: ApiResponse) -> Self {
        debug_assert!(!response.was_successful());
        Self {
            response,
            result: None,
        }
    }

    /// The payload; only present on success.
    pub fn result(&self) -> Option<&T> {
        self.result.as_ref()
    }

    pub fn into_result(self) -> Option<T> {
        self.result
    }

    /// Drop the payload, keeping the untyped response.
    pub fn into_response(self) -> ApiResponse {
        self.response
    }
}

impl<T> Deref for TypedApiResponse<T> {
    type Target = ApiResponse;

    fn deref(&self) -> &Self::Target {
        &self.response
    }
}

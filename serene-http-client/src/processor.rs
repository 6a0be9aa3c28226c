//! Response processing.

use crate::{
    ApiException, ApiResponse, RawResponse, Serializer, Status, TerminalFailure,
    TypedApiResponse,
};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use uuid::Uuid;

const EMPTY_RESPONSE: &str = "received an empty response.";
const NO_CONTENT: &str = "no content was received in the response.";
const UNDESERIALIZABLE: &str = "could not deserialize returned value";
const RETRY_LIMIT_REACHED: &str = "request timed out; retry limit reached";

/// Turns raw responses and terminal failures into envelopes.
pub struct ResponseProcessor<'a, S> {
    request_id: Uuid,
    serializer: &'a S,
}

impl<'a, S: Serializer> ResponseProcessor<'a, S> {
    pub fn new(request_id: Uuid, serializer: &'a S) -> Self {
        Self {
            request_id,
            serializer,
        }
    }

    /// Build an untyped envelope.
    pub fn process(&self, response: Option<RawResponse>) -> ApiResponse {
        let Some(response) = response else {
            warn!(request_id = %self.request_id, "Received an empty response");
            return ApiResponse::failure(self.request_id, Status::NONE, EMPTY_RESPONSE);
        };

        if !response.is_success() {
            return self.unsuccessful(&response);
        }

        ApiResponse::success(self.request_id, response.status())
    }

    /// Build a typed envelope, deserializing the body.
    pub async fn process_typed<T>(&self, response: Option<RawResponse>) -> TypedApiResponse<T>
    where
        T: DeserializeOwned + Send,
    {
        let Some(response) = response else {
            warn!(request_id = %self.request_id, "Received an empty response");
            return TypedApiResponse::failure(self.request_id, Status::NONE, EMPTY_RESPONSE);
        };

        if !response.is_success() {
            return TypedApiResponse::from_failure(self.unsuccessful(&response));
        }

        if response.body().is_empty() {
            warn!(
                request_id = %self.request_id,
                status = %response.status(),
                "No content was received in the response"
            );
            return TypedApiResponse::failure(self.request_id, response.status(), NO_CONTENT);
        }

        match self.serializer.deserialize_async::<T>(response.body()).await {
            Ok(result) => TypedApiResponse::success(self.request_id, response.status(), result),
            Err(e) => {
                warn!(
                    request_id = %self.request_id,
                    error = %e,
                    "Could not deserialize returned value"
                );
                TypedApiResponse::failure_with_exception(
                    self.request_id,
                    response.status(),
                    UNDESERIALIZABLE,
                    ApiException::Deserialization(e),
                )
            }
        }
    }

    /// Build the envelope for a request that could not be completed.
    pub fn failure(&self, failure: TerminalFailure) -> ApiResponse {
        match failure {
            TerminalFailure::TimedOut { route, attempts } => ApiResponse::failure_with_exception(
                self.request_id,
                Status::NONE,
                RETRY_LIMIT_REACHED,
                ApiException::Timeout { route, attempts },
            ),
            TerminalFailure::Transport { method, cause } => ApiResponse::failure_with_exception(
                self.request_id,
                Status::NONE,
                format!(
                    "an exception occurred whilst performing a HTTP {} request",
                    method
                ),
                ApiException::Transport {
                    method,
                    source: cause,
                },
            ),
        }
    }

    fn unsuccessful(&self, response: &RawResponse) -> ApiResponse {
        let reason = response
            .reason_phrase()
            .unwrap_or("the request was not successful");

        debug!(
            request_id = %self.request_id,
            status = %response.status(),
            reason,
            "Request was not successful"
        );

        ApiResponse::failure(self.request_id, response.status(), reason)
    }
}

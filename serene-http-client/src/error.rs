//! Error types.
//!
//! [`ApiError`] is returned only for misuse of the API and is never retried.
//! Ordinary request failures are absorbed into an
//! [`ApiResponse`](crate::ApiResponse), optionally carrying an
//! [`ApiException`] as their cause.

use crate::{Method, SerializerError};
use thiserror::Error;
use url::Url;

/// Result type for handler operations.
pub type Result<T> = std::result::Result<T, ApiError>;

/// Programming errors surfaced directly to the caller.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request has no usable method.
    #[error("{0} is not a valid request method")]
    InvalidMethod(Method),

    /// A GET or DELETE request was given a body.
    #[error("a {0} request cannot carry in-body content")]
    BodyNotAllowed(Method),

    /// The handler was disposed.
    #[error("the api handler has been disposed")]
    Disposed,

    /// A request builder method was used more than once.
    #[error("{0} cannot be called twice")]
    CalledTwice(&'static str),

    /// The connection already targets a resource.
    #[error("the connection already targets the resource {0:?}")]
    ResourceAlreadySet(String),

    /// The route could not be composed.
    #[error("invalid route: {0}")]
    InvalidRoute(String),

    /// The query could not be composed.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// Request content could not be serialized.
    #[error("failed to serialize request content: {0}")]
    Serialization(#[source] SerializerError),

    /// Missing or inconsistent handler configuration.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Configuration source error.
    #[error(transparent)]
    Config(#[from] serene_config::ConfigError),

    /// URL parsing error.
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// The blocking runtime could not be started.
    #[error("failed to start runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

/// Cause attached to a failed response.
#[derive(Debug, Error)]
pub enum ApiException {
    /// Every attempt timed out.
    #[error("request to {route} timed out after {attempts} attempt(s); retry limit reached")]
    Timeout {
        /// Route of the abandoned request.
        route: Url,
        /// Attempts made, including the first.
        attempts: u32,
    },

    /// The transport failed for a reason other than a timeout.
    #[error("an error occurred whilst performing a HTTP {method} request: {source}")]
    Transport {
        /// Method of the failed request.
        method: Method,
        /// Underlying transport failure.
        #[source]
        source: TransportError,
    },

    /// The response body could not be deserialized.
    #[error("could not deserialize returned value: {0}")]
    Deserialization(#[source] SerializerError),
}

impl ApiException {
    /// Check if this is a timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Check if this is a transport failure.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }

    /// Check if this is a deserialization failure.
    pub fn is_deserialization(&self) -> bool {
        matches!(self, Self::Deserialization(_))
    }
}

/// Transport-level failure causes.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Underlying HTTP client error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Connection error.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Any other failure.
    #[error("{0}")]
    Other(String),
}

impl TransportError {
    /// Check if this is a connection error.
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_)) || matches!(self, Self::Http(e) if e.is_connect())
    }
}

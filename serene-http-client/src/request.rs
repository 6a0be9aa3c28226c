//! Request descriptors.

use crate::{ApiError, Result};
use bytes::Bytes;
use std::fmt;
use tracing::warn;
use url::Url;
use uuid::Uuid;

/// HTTP verb of an API request.
///
/// `None` is a placeholder that is never valid for an outbound call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Method {
    #[default]
    None,
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    /// Whether a request using this method may carry a body.
    pub fn allows_body(self) -> bool {
        matches!(self, Method::Post | Method::Put | Method::Patch)
    }

    /// Get the method name as it appears on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Method::None => "NONE",
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }

    /// Convert to an [`http::Method`], rejecting `None`.
    pub fn to_http(self) -> Result<http::Method> {
        match self {
            Method::None => Err(ApiError::InvalidMethod(self)),
            Method::Get => Ok(http::Method::GET),
            Method::Post => Ok(http::Method::POST),
            Method::Put => Ok(http::Method::PUT),
            Method::Patch => Ok(http::Method::PATCH),
            Method::Delete => Ok(http::Method::DELETE),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pre-serialized request body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContent {
    body: Bytes,
    media_type: String,
}

impl RequestContent {
    /// Media type used when none is given.
    pub const JSON: &'static str = "application/json";

    /// Create content with an explicit media type.
    pub fn new(body: impl Into<Bytes>, media_type: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            media_type: media_type.into(),
        }
    }

    /// Create JSON content.
    pub fn json(body: impl Into<Bytes>) -> Self {
        Self::new(body, Self::JSON)
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}

/// One logical outbound call.
///
/// The route is fully composed before the request reaches the retry engine.
/// Descriptors are immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    identity: Uuid,
    method: Method,
    route: Url,
    content: Option<RequestContent>,
}

impl ApiRequest {
    /// Create a request descriptor.
    ///
    /// Fails with [`ApiError::InvalidMethod`] for [`Method::None`].
    pub fn new(method: Method, route: Url, content: Option<RequestContent>) -> Result<Self> {
        if method == Method::None {
            warn!(route = %route, "Rejected request without a method");
            return Err(ApiError::InvalidMethod(method));
        }

        Ok(Self {
            identity: Uuid::new_v4(),
            method,
            route,
            content,
        })
    }

    /// Correlation id shared by the logs, events and response of this request.
    pub fn identity(&self) -> Uuid {
        self.identity
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn route(&self) -> &Url {
        &self.route
    }

    pub fn content(&self) -> Option<&RequestContent> {
        self.content.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route() -> Url {
        Url::parse("http://x.test/api/widgets").unwrap()
    }

    #[test]
    fn test_none_method_is_rejected() {
        let result = ApiRequest::new(Method::None, route(), None);
        assert!(matches!(result, Err(ApiError::InvalidMethod(Method::None))));
    }

    #[test]
    fn test_each_request_gets_its_own_identity() {
        let first = ApiRequest::new(Method::Get, route(), None).unwrap();
        let second = ApiRequest::new(Method::Get, route(), None).unwrap();

        assert_ne!(first.identity(), second.identity());
        assert_eq!(first.route().as_str(), "http://x.test/api/widgets");
        assert!(first.content().is_none());
    }

    #[test]
    fn test_body_rules() {
        assert!(!Method::Get.allows_body());
        assert!(!Method::Delete.allows_body());
        assert!(Method::Post.allows_body());
        assert!(Method::Put.allows_body());
        assert!(Method::Patch.allows_body());
    }

    #[test]
    fn test_http_conversion() {
        assert_eq!(Method::Patch.to_http().unwrap(), http::Method::PATCH);
        assert!(Method::None.to_http().is_err());
        assert_eq!(Method::Delete.to_string(), "DELETE");
    }

    #[test]
    fn test_content_defaults_to_json() {
        let content = RequestContent::json(r#"{"id":1}"#);
        assert_eq!(content.media_type(), "application/json");
        assert_eq!(content.len(), 8);
    }
}

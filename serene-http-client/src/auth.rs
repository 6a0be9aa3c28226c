//! Request credentials.

use crate::{ApiError, Result};
use base64::Engine;
use http::HeaderValue;

/// Credentials sent as the `Authorization` header of every request.
#[derive(Clone, PartialEq, Eq)]
pub enum Authentication {
    /// `Authorization: Bearer <token>`
    Bearer(String),
    /// `Authorization: Basic <base64(username:password)>`
    Basic { username: String, password: String },
}

impl Authentication {
    /// Create bearer credentials.
    pub fn bearer(token: impl Into<String>) -> Self {
        Self::Bearer(token.into())
    }

    /// Create basic credentials.
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::Basic {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Authentication scheme.
    pub fn scheme(&self) -> &'static str {
        match self {
            Self::Bearer(_) => "Bearer",
            Self::Basic { .. } => "Basic",
        }
    }

    /// Credentials as they appear after the scheme.
    pub fn parameter(&self) -> String {
        match self {
            Self::Bearer(token) => token.clone(),
            Self::Basic { username, password } => base64::engine::general_purpose::STANDARD
                .encode(format!("{}:{}", username, password)),
        }
    }

    /// Build the `Authorization` header value.
    pub fn header_value(&self) -> Result<HeaderValue> {
        let mut value = HeaderValue::try_from(format!("{} {}", self.scheme(), self.parameter()))
            .map_err(|e| ApiError::Configuration(format!("invalid credentials: {}", e)))?;
        value.set_sensitive(true);
        Ok(value)
    }
}

impl std::fmt::Debug for Authentication {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Authentication")
            .field(&self.scheme())
            .finish()
    }
}

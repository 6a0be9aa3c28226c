//! # Serene HTTP Client
//!
//! Typed handlers for RESTful APIs. A handler composes requests against one
//! connection, performs them with timeout-triggered retry and turns every
//! outcome into a response envelope.
//!
//! ## Features
//!
//! - **Envelopes**: ordinary failures (timeouts, transport errors, non-2xx
//!   statuses, undeserializable bodies) never surface as `Err`
//! - **Retry on timeout**: `retry_attempts = N` means one attempt plus up to
//!   `N` immediate retries
//! - **Request builder**: endpoints, templated endpoints, query strings from
//!   serializable values, in-body content
//! - **Pluggable transport**: reqwest by default, any [`ConnectionProvider`]
//!   otherwise
//! - **Lifecycle events**: request, retry and response notifications on a
//!   [`serene_events::EventBus`]
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use serene_http_client::ApiHandler;
//! use std::time::Duration;
//!
//! #[derive(serde::Serialize, serde::Deserialize)]
//! struct Widget { id: u32, name: String }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let widgets = ApiHandler::builder()
//!         .use_source("https://api.example.com", Some("widgets"), None)
//!         .timeout(Duration::from_secs(5))
//!         .retry_attempts(2)
//!         .build()?;
//!
//!     let response = widgets.get::<Widget>(1).await?;
//!     match response.result() {
//!         Some(widget) => println!("{}", widget.name),
//!         None => eprintln!("{}: {:?}", response.status(), response.message()),
//!     }
//!
//!     Ok(())
//! }
//! ```

mod auth;
mod blocking;
mod builder;
mod client;
mod connection;
mod crud;
mod error;
mod events;
mod handler;
mod processor;
mod query;
mod request;
mod response;
mod retry;
mod serializer;
mod transport;

pub use auth::Authentication;
pub use blocking::BlockingApiHandler;
pub use builder::RequestBuilder;
pub use client::{ClientFactory, DEFAULT_USER_AGENT, ReqwestTransport};
pub use connection::{ConnectionSettings, DEFAULT_RETRY_ATTEMPTS, DEFAULT_TIMEOUT};
pub use error::{ApiError, ApiException, Result, TransportError};
pub use events::{EventPublisher, RequestEvent, ResponseEvent, RetryEvent};
pub use handler::{ApiHandler, ApiHandlerBuilder};
pub use processor::ResponseProcessor;
pub use query::QueryFactory;
pub use request::{ApiRequest, Method, RequestContent};
pub use response::{ApiResponse, Status, TypedApiResponse};
pub use retry::{Execution, RetryEngine, TerminalFailure};
pub use serializer::{JsonSerializer, Serializer, SerializerError};
pub use transport::{
    ConnectionProvider, RawResponse, Transport, TransportHandle, TransportOutcome,
    TransportRequest,
};

// Re-export common types
pub use bytes::Bytes;
pub use http::StatusCode;
pub use url::Url;

/// Prelude for common imports.
///
/// ```
/// use serene_http_client::prelude::*;
/// ```
pub mod prelude {
    pub use crate::auth::Authentication;
    pub use crate::blocking::BlockingApiHandler;
    pub use crate::error::{ApiError, ApiException, Result};
    pub use crate::handler::{ApiHandler, ApiHandlerBuilder};
    pub use crate::request::{ApiRequest, Method};
    pub use crate::response::{ApiResponse, Status, TypedApiResponse};
    pub use crate::serializer::{JsonSerializer, Serializer};
    pub use crate::transport::{ConnectionProvider, Transport, TransportOutcome};
    pub use http::StatusCode;
}

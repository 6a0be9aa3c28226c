//! Testing utilities for Serene API handlers.
//!
//! Handlers take their transport from a
//! [`ConnectionProvider`](serene_http_client::ConnectionProvider), so tests
//! can swap the network for scripted answers.
//!
//! ## Features
//!
//! - **MockResponse** - Scripted status, reason, body, delay and matchers
//! - **MockTransport** - First matching response wins, requests are recorded
//! - **MockConnectionProvider** - Managed or override handles, with
//!   acquire/dispose accounting
//! - **Assertions** - Envelope assertions
//!
//! ## Quick Start
//!
//! ```
//! use serene_http_client::{ApiHandler, StatusCode};
//! use serene_testing::*;
//!
//! # tokio_test::block_on(async {
//! let transport = MockTransport::new([
//!     MockResponse::status(StatusCode::NOT_FOUND).for_route("/api/widgets/9"),
//!     MockResponse::json(&serde_json::json!({ "id": 1 })),
//! ]);
//! let provider = MockConnectionProvider::managed(transport.clone());
//!
//! let handler = ApiHandler::builder()
//!     .use_source("http://x.test", Some("widgets"), None)
//!     .connection_provider(provider.clone())
//!     .build()
//!     .unwrap();
//!
//! let found = handler.get::<serde_json::Value>(1).await.unwrap();
//! assert_success(&found);
//! assert_eq!(found.result().unwrap()["id"], 1);
//!
//! let missing = handler.get::<serde_json::Value>(9).await.unwrap();
//! assert_status(&missing, StatusCode::NOT_FOUND);
//!
//! assert_eq!(transport.request_count(), 2);
//! assert_eq!(provider.disposed(), 2);
//! # });
//! ```

mod assertions;
mod mock;

pub use assertions::*;
pub use mock::{MockConnectionProvider, MockResponse, MockTransport};

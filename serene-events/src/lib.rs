//! Lifecycle events for Serene API handlers
//!
//! A small in-process publish/subscribe bus. API handlers publish
//! `RequestEvent`, `RetryEvent` and `ResponseEvent` notifications through it
//! without waiting for listeners; a failing or slow listener never changes
//! the outcome of a request.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use serene_events::*;
//!
//! let bus = EventBus::new();
//!
//! bus.subscribe::<RetryEvent, _>(TypedEventHandler::new(FnEventHandler::new(
//!     |event: &RetryEvent| -> Result<(), EventHandlerError> {
//!         tracing::warn!(attempt = event.attempt, "request retried");
//!         Ok(())
//!     },
//! )));
//!
//! let handler = ApiHandler::builder()
//!     .use_source("https://api.example.com", Some("widgets"), None)
//!     .event_bus(bus.clone())
//!     .build()?;
//! ```
//!
//! ## Configuration
//!
//! ```rust,ignore
//! let bus = EventBusBuilder::new()
//!     .async_handling(true)           // Run handlers concurrently
//!     .continue_on_error(true)        // Don't stop on handler errors
//!     .enable_logging(false)
//!     .build();
//! ```

pub mod bus;
pub mod event;

pub use bus::{EventBus, EventBusBuilder, EventBusConfig, EventBusError};
pub use event::{
    DynEventHandler, Event, EventHandler, EventHandlerError, EventMetadata, FnEventHandler,
    TypedEventHandler,
};

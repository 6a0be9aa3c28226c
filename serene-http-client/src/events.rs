//! Lifecycle events raised while performing requests.

use crate::{ApiRequest, Method, Status};
use chrono::{DateTime, Utc};
use serene_events::{Event, EventBus, EventMetadata};
use std::any::Any;
use std::time::Duration;
use url::Url;
use uuid::Uuid;

macro_rules! lifecycle_event {
    ($event:ident, $name:literal) => {
        impl $event {
            /// Name under which the event is published.
            pub const NAME: &'static str = $name;
        }

        impl Event for $event {
            fn event_name(&self) -> &str {
                &self.metadata.name
            }

            fn event_id(&self) -> Uuid {
                self.metadata.id
            }

            fn timestamp(&self) -> DateTime<Utc> {
                self.metadata.timestamp
            }

            fn correlation_id(&self) -> Option<Uuid> {
                self.metadata.correlation_id
            }

            fn as_any(&self) -> &dyn Any {
                self
            }

            fn clone_event(&self) -> Box<dyn Event> {
                Box::new(self.clone())
            }
        }
    };
}

/// A request is about to be performed.
#[derive(Debug, Clone)]
pub struct RequestEvent {
    pub metadata: EventMetadata,
    pub method: Method,
    pub route: Url,
}

impl RequestEvent {
    pub fn new(request: &ApiRequest) -> Self {
        Self {
            metadata: EventMetadata::new(Self::NAME).with_correlation_id(request.identity()),
            method: request.method(),
            route: request.route().clone(),
        }
    }
}

lifecycle_event!(RequestEvent, "request_started");

/// An attempt timed out and the request is being retried.
#[derive(Debug, Clone)]
pub struct RetryEvent {
    pub metadata: EventMetadata,
    /// Retry about to be made, starting at 1.
    pub attempt: u32,
    /// Retries left after this one.
    pub retries_remaining: u32,
}

impl RetryEvent {
    pub fn new(request_id: Uuid, attempt: u32, retries_remaining: u32) -> Self {
        Self {
            metadata: EventMetadata::new(Self::NAME).with_correlation_id(request_id),
            attempt,
            retries_remaining,
        }
    }
}

lifecycle_event!(RetryEvent, "retry_occurring");

/// A request finished, successfully or not.
#[derive(Debug, Clone)]
pub struct ResponseEvent {
    pub metadata: EventMetadata,
    pub status: Status,
    pub successful: bool,
    pub elapsed: Duration,
}

impl ResponseEvent {
    pub fn new(request_id: Uuid, status: Status, successful: bool, elapsed: Duration) -> Self {
        Self {
            metadata: EventMetadata::new(Self::NAME).with_correlation_id(request_id),
            status,
            successful,
            elapsed,
        }
    }
}

lifecycle_event!(ResponseEvent, "response_received");

/// Fire-and-forget publication of lifecycle events.
///
/// Publishing never waits for listeners and never fails; without a bus it
/// does nothing.
#[derive(Debug, Clone, Default)]
pub struct EventPublisher {
    bus: Option<EventBus>,
}

impl EventPublisher {
    pub fn new(bus: EventBus) -> Self {
        Self { bus: Some(bus) }
    }

    /// A publisher that drops every event.
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.bus.is_some()
    }

    pub fn publish<E: Event>(&self, event: E) {
        if let Some(bus) = &self.bus {
            bus.publish_detached(event);
        }
    }
}

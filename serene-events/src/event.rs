//! Event definitions and traits

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt::Debug;
use uuid::Uuid;

/// Event trait
///
/// Every lifecycle notification published through the [`EventBus`](crate::EventBus)
/// implements this trait.
pub trait Event: Send + Sync + Debug + 'static {
    /// Get event name
    fn event_name(&self) -> &str;

    /// Get event ID
    fn event_id(&self) -> Uuid;

    /// Get event timestamp
    fn timestamp(&self) -> DateTime<Utc>;

    /// Identity of the request this event belongs to, if any.
    fn correlation_id(&self) -> Option<Uuid> {
        None
    }

    /// Cast to Any for downcasting
    fn as_any(&self) -> &dyn Any;

    /// Clone the event (box clone pattern)
    fn clone_event(&self) -> Box<dyn Event>;
}

/// Base event metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMetadata {
    /// Unique event ID
    pub id: Uuid,

    /// Event name/type
    pub name: String,

    /// Timestamp when event was created
    pub timestamp: DateTime<Utc>,

    /// Request identity the event was raised for
    pub correlation_id: Option<Uuid>,

    /// Name of the handler that raised the event
    pub source: Option<String>,
}

impl EventMetadata {
    /// Create new event metadata
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            timestamp: Utc::now(),
            correlation_id: None,
            source: None,
        }
    }

    /// Set correlation ID
    pub fn with_correlation_id(mut self, id: Uuid) -> Self {
        self.correlation_id = Some(id);
        self
    }

    /// Set the raising handler's name
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// Event handler trait
#[async_trait]
pub trait EventHandler<E: Event>: Send + Sync {
    /// Handle the event
    async fn handle(&self, event: &E) -> Result<(), EventHandlerError>;
}

/// Event handler error
#[derive(Debug, thiserror::Error)]
pub enum EventHandlerError {
    #[error("Handler failed: {0}")]
    HandlerFailed(String),

    #[error("Event processing error: {0}")]
    ProcessingError(String),
}

/// Type-erased event handler
#[async_trait]
pub trait DynEventHandler: Send + Sync {
    /// Handle event (type-erased)
    async fn handle_dyn(&self, event: &dyn Event) -> Result<(), EventHandlerError>;
}

/// Wrapper for typed event handlers
pub struct TypedEventHandler<E: Event, H: EventHandler<E>> {
    handler: H,
    _phantom: std::marker::PhantomData<E>,
}

impl<E: Event, H: EventHandler<E>> TypedEventHandler<E, H> {
    pub fn new(handler: H) -> Self {
        Self {
            handler,
            _phantom: std::marker::PhantomData,
        }
    }
}

#[async_trait]
impl<E: Event, H: EventHandler<E> + 'static> DynEventHandler for TypedEventHandler<E, H> {
    async fn handle_dyn(&self, event: &dyn Event) -> Result<(), EventHandlerError> {
        match event.as_any().downcast_ref::<E>() {
            Some(typed_event) => self.handler.handle(typed_event).await,
            None => Err(EventHandlerError::HandlerFailed(format!(
                "type mismatch for event {}",
                event.event_name()
            ))),
        }
    }
}

/// Closure-backed handler, handy for tests and simple listeners.
pub struct FnEventHandler<F> {
    handler: F,
}

impl<F> FnEventHandler<F> {
    pub fn new(handler: F) -> Self {
        Self { handler }
    }
}

#[async_trait]
impl<E, F> EventHandler<E> for FnEventHandler<F>
where
    E: Event,
    F: Fn(&E) -> Result<(), EventHandlerError> + Send + Sync,
{
    async fn handle(&self, event: &E) -> Result<(), EventHandlerError> {
        (self.handler)(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone)]
    struct TestEvent {
        metadata: EventMetadata,
    }

    impl Event for TestEvent {
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

    #[derive(Debug, Clone)]
    struct OtherEvent;

    impl Event for OtherEvent {
        fn event_name(&self) -> &str {
            "other"
        }

        fn event_id(&self) -> Uuid {
            Uuid::nil()
        }

        fn timestamp(&self) -> DateTime<Utc> {
            Utc::now()
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn clone_event(&self) -> Box<dyn Event> {
            Box::new(self.clone())
        }
    }

    #[test]
    fn test_event_metadata() {
        let request = Uuid::new_v4();
        let metadata = EventMetadata::new("request")
            .with_correlation_id(request)
            .with_source("WidgetHandler");

        assert_eq!(metadata.name, "request");
        assert_eq!(metadata.correlation_id, Some(request));
        assert_eq!(metadata.source.as_deref(), Some("WidgetHandler"));
    }

    #[tokio::test]
    async fn test_typed_handler_rejects_other_event_types() {
        let handler = TypedEventHandler::<TestEvent, _>::new(FnEventHandler::new(
            |_: &TestEvent| -> Result<(), EventHandlerError> { Ok(()) },
        ));

        let matching = TestEvent {
            metadata: EventMetadata::new("test"),
        };
        assert!(handler.handle_dyn(&matching).await.is_ok());
        assert!(handler.handle_dyn(&OtherEvent).await.is_err());
    }
}

//! Event Bus implementation

use crate::event::{DynEventHandler, Event, EventHandlerError};
use dashmap::DashMap;
use std::any::TypeId;
use std::sync::Arc;
use tracing::{debug, error, trace};

/// Event bus for in-process lifecycle notifications
#[derive(Clone)]
pub struct EventBus {
    /// Handlers registered for each event type
    handlers: Arc<DashMap<TypeId, Vec<Arc<dyn DynEventHandler>>>>,

    /// Configuration
    config: Arc<EventBusConfig>,
}

/// Event bus configuration
#[derive(Debug, Clone)]
pub struct EventBusConfig {
    /// Run handlers concurrently on spawned tasks
    pub async_handling: bool,

    /// Continue on handler error
    pub continue_on_error: bool,

    /// Enable event logging
    pub enable_logging: bool,
}

impl Default for EventBusConfig {
    fn default() -> Self {
        Self {
            async_handling: true,
            continue_on_error: true,
            enable_logging: true,
        }
    }
}

impl EventBus {
    /// Create new event bus
    pub fn new() -> Self {
        Self::with_config(EventBusConfig::default())
    }

    /// Create event bus with custom config
    pub fn with_config(config: EventBusConfig) -> Self {
        Self {
            handlers: Arc::new(DashMap::new()),
            config: Arc::new(config),
        }
    }

    /// Subscribe a handler to an event type
    ///
    /// ```rust,ignore
    /// bus.subscribe::<RetryEvent, _>(TypedEventHandler::new(RetryCounter::default()));
    /// ```
    pub fn subscribe<E, H>(&self, handler: H)
    where
        E: Event,
        H: DynEventHandler + 'static,
    {
        let type_id = TypeId::of::<E>();
        self.handlers
            .entry(type_id)
            .or_default()
            .push(Arc::new(handler));

        if self.config.enable_logging {
            debug!(event_type = std::any::type_name::<E>(), "Subscribed event handler");
        }
    }

    /// Publish an event and wait for every handler to finish.
    pub async fn publish<E: Event>(&self, event: E) -> Result<(), EventBusError> {
        let type_id = TypeId::of::<E>();

        if self.config.enable_logging {
            trace!(
                event = event.event_name(),
                event_id = %event.event_id(),
                "Publishing event"
            );
        }

        let handlers = match self.handlers.get(&type_id) {
            Some(handlers) => handlers.clone(),
            None => return Ok(()),
        };

        let event: Arc<dyn Event> = Arc::new(event);
        let mut errors = Vec::new();

        if self.config.async_handling {
            let mut tasks = Vec::with_capacity(handlers.len());

            for handler in handlers.iter() {
                let handler = handler.clone();
                let event = event.clone();
                tasks.push(tokio::spawn(
                    async move { handler.handle_dyn(event.as_ref()).await },
                ));
            }

            for task in tasks {
                let outcome = match task.await {
                    Ok(outcome) => outcome,
                    Err(e) => Err(EventHandlerError::HandlerFailed(e.to_string())),
                };

                if let Err(e) = outcome {
                    error!(event = event.event_name(), error = %e, "Event handler failed");
                    errors.push(e);
                    if !self.config.continue_on_error {
                        break;
                    }
                }
            }
        } else {
            for handler in handlers.iter() {
                if let Err(e) = handler.handle_dyn(event.as_ref()).await {
                    error!(event = event.event_name(), error = %e, "Event handler failed");
                    errors.push(e);
                    if !self.config.continue_on_error {
                        break;
                    }
                }
            }
        }

        if !errors.is_empty() && !self.config.continue_on_error {
            return Err(EventBusError::HandlersFailed(errors));
        }

        Ok(())
    }

    /// Publish without waiting for the outcome.
    ///
    /// The event is handed to a spawned task on the current tokio runtime.
    /// Failures are logged and dropped; without a runtime the event is
    /// discarded.
    pub fn publish_detached<E: Event>(&self, event: E) {
        if self.handler_count::<E>() == 0 {
            return;
        }

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(_) => {
                debug!(
                    event = event.event_name(),
                    "No async runtime available, dropping event"
                );
                return;
            }
        };

        let bus = self.clone();
        runtime.spawn(async move {
            let name = event.event_name().to_string();
            if let Err(e) = bus.publish(event).await {
                debug!(event = %name, error = %e, "Detached event publication failed");
            }
        });
    }

    /// Unsubscribe all handlers for an event type
    pub fn unsubscribe<E: Event>(&self) {
        self.handlers.remove(&TypeId::of::<E>());
    }

    /// Clear all handlers
    pub fn clear(&self) {
        self.handlers.clear();
    }

    /// Get handler count for an event type
    pub fn handler_count<E: Event>(&self) -> usize {
        self.handlers
            .get(&TypeId::of::<E>())
            .map(|h| h.len())
            .unwrap_or(0)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("event_types", &self.handlers.len())
            .field("config", &self.config)
            .finish()
    }
}

/// Event bus errors
#[derive(Debug, thiserror::Error)]
pub enum EventBusError {
    #[error("One or more handlers failed")]
    HandlersFailed(Vec<EventHandlerError>),
}

/// Event bus builder
pub struct EventBusBuilder {
    config: EventBusConfig,
}

impl EventBusBuilder {
    /// Create new event bus builder
    pub fn new() -> Self {
        Self {
            config: EventBusConfig::default(),
        }
    }

    /// Enable/disable async handling
    pub fn async_handling(mut self, enabled: bool) -> Self {
        self.config.async_handling = enabled;
        self
    }

    /// Enable/disable continue on error
    pub fn continue_on_error(mut self, enabled: bool) -> Self {
        self.config.continue_on_error = enabled;
        self
    }

    /// Enable/disable logging
    pub fn enable_logging(mut self, enabled: bool) -> Self {
        self.config.enable_logging = enabled;
        self
    }

    /// Build the event bus
    pub fn build(self) -> EventBus {
        EventBus::with_config(self.config)
    }
}

impl Default for EventBusBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{EventHandler, EventMetadata, FnEventHandler, TypedEventHandler};
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use std::any::Any;
    use std::sync::atomic::{AtomicU32, Ordering};
    use uuid::Uuid;

    #[derive(Debug, Clone)]
    struct RetryNoticed {
        metadata: EventMetadata,
    }

    impl RetryNoticed {
        fn new() -> Self {
            Self {
                metadata: EventMetadata::new("retry"),
            }
        }
    }

    impl Event for RetryNoticed {
        fn event_name(&self) -> &str {
            &self.metadata.name
        }

        fn event_id(&self) -> Uuid {
            self.metadata.id
        }

        fn timestamp(&self) -> DateTime<Utc> {
            self.metadata.timestamp
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn clone_event(&self) -> Box<dyn Event> {
            Box::new(self.clone())
        }
    }

    #[derive(Clone)]
    struct Counter {
        counter: Arc<AtomicU32>,
    }

    impl Counter {
        fn new() -> Self {
            Self {
                counter: Arc::new(AtomicU32::new(0)),
            }
        }

        fn count(&self) -> u32 {
            self.counter.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl EventHandler<RetryNoticed> for Counter {
        async fn handle(&self, _event: &RetryNoticed) -> Result<(), EventHandlerError> {
            self.counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn failing() -> TypedEventHandler<RetryNoticed, impl EventHandler<RetryNoticed>> {
        TypedEventHandler::new(FnEventHandler::new(
            |_: &RetryNoticed| -> Result<(), EventHandlerError> {
                Err(EventHandlerError::ProcessingError("boom".to_string()))
            },
        ))
    }

    #[tokio::test]
    async fn test_event_bus_publish() {
        let bus = EventBus::new();
        let handler = Counter::new();

        bus.subscribe::<RetryNoticed, _>(TypedEventHandler::new(handler.clone()));
        bus.publish(RetryNoticed::new()).await.unwrap();

        assert_eq!(handler.count(), 1);
    }

    #[tokio::test]
    async fn test_multiple_handlers() {
        let bus = EventBus::new();
        let first = Counter::new();
        let second = Counter::new();

        bus.subscribe::<RetryNoticed, _>(TypedEventHandler::new(first.clone()));
        bus.subscribe::<RetryNoticed, _>(TypedEventHandler::new(second.clone()));
        bus.publish(RetryNoticed::new()).await.unwrap();

        assert_eq!(first.count(), 1);
        assert_eq!(second.count(), 1);
    }

    #[tokio::test]
    async fn test_failures_are_swallowed_when_continuing() {
        let bus = EventBus::new();
        let counter = Counter::new();

        bus.subscribe::<RetryNoticed, _>(failing());
        bus.subscribe::<RetryNoticed, _>(TypedEventHandler::new(counter.clone()));

        assert!(bus.publish(RetryNoticed::new()).await.is_ok());
        assert_eq!(counter.count(), 1);
    }

    #[tokio::test]
    async fn test_failures_surface_when_stopping_on_error() {
        let bus = EventBusBuilder::new()
            .async_handling(false)
            .continue_on_error(false)
            .build();
        bus.subscribe::<RetryNoticed, _>(failing());

        let result = bus.publish(RetryNoticed::new()).await;
        assert!(matches!(result, Err(EventBusError::HandlersFailed(errors)) if errors.len() == 1));
    }

    #[tokio::test]
    async fn test_publish_detached_runs_in_background() {
        let bus = EventBus::new();
        let handler = Counter::new();
        bus.subscribe::<RetryNoticed, _>(TypedEventHandler::new(handler.clone()));

        bus.publish_detached(RetryNoticed::new());

        for _ in 0..50 {
            if handler.count() == 1 {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert_eq!(handler.count(), 1);
    }

    #[test]
    fn test_publish_detached_without_runtime_is_ignored() {
        let bus = EventBus::new();
        bus.subscribe::<RetryNoticed, _>(TypedEventHandler::new(Counter::new()));

        bus.publish_detached(RetryNoticed::new());
    }

    #[test]
    fn test_handler_count() {
        let bus = EventBus::new();
        assert_eq!(bus.handler_count::<RetryNoticed>(), 0);

        bus.subscribe::<RetryNoticed, _>(TypedEventHandler::new(Counter::new()));
        assert_eq!(bus.handler_count::<RetryNoticed>(), 1);

        bus.unsubscribe::<RetryNoticed>();
        assert_eq!(bus.handler_count::<RetryNoticed>(), 0);
    }
}

//! API handler.

use crate::{
    ApiError, ApiRequest, ApiResponse, Authentication, ClientFactory, ConnectionProvider,
    ConnectionSettings, EventPublisher, Execution, JsonSerializer, Method, RequestBuilder,
    RequestEvent, ResponseEvent, ResponseProcessor, Result, RetryEngine, Serializer,
    TypedApiResponse,
};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serene_config::{ApiDefaults, ConfigManager};
use serene_events::EventBus;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Dependencies owned by a handler until it is disposed.
struct HandlerDependencies<S> {
    serializer: S,
    provider: Arc<dyn ConnectionProvider>,
    events: EventPublisher,
}

/// Performs requests against one API connection.
///
/// Every request ends in an envelope; only programming errors (see
/// [`ApiError`]) are returned as `Err`. Handlers are cheap to share behind an
/// `Arc` and may perform requests concurrently.
///
/// ```rust,no_run
/// use serene_http_client::{ApiHandler, Method};
///
/// #[derive(serde::Deserialize)]
/// struct Widget { id: u32 }
///
/// # async fn run() -> serene_http_client::Result<()> {
/// let handler = ApiHandler::builder()
///     .use_source("https://api.example.com", Some("widgets"), None)
///     .retry_attempts(2)
///     .build()?;
///
/// let response = handler
///     .request_typed::<Widget, _>(Method::Get, |r| r.with_endpoint(1))
///     .await?;
///
/// if let Some(widget) = response.result() {
///     println!("widget {}", widget.id);
/// }
/// # Ok(())
/// # }
/// ```
pub struct ApiHandler<S = JsonSerializer> {
    settings: Arc<ConnectionSettings>,
    dependencies: RwLock<Option<Arc<HandlerDependencies<S>>>>,
}

impl ApiHandler<JsonSerializer> {
    /// Start building a handler using JSON content.
    pub fn builder() -> ApiHandlerBuilder<JsonSerializer> {
        ApiHandlerBuilder::new()
    }
}

impl<S: Serializer> ApiHandler<S> {
    pub fn settings(&self) -> &ConnectionSettings {
        &self.settings
    }

    pub fn is_disposed(&self) -> bool {
        self.dependencies.read().is_none()
    }

    /// Release the serializer and connection provider.
    ///
    /// Returns `false` when the handler was already disposed. Requests
    /// already in flight run to completion.
    pub fn dispose(&self) -> bool {
        match self.dependencies.write().take() {
            Some(_) => {
                debug!(source = %self.settings.source(), "Disposed API handler");
                true
            }
            None => false,
        }
    }

    fn dependencies(&self) -> Result<Arc<HandlerDependencies<S>>> {
        self.dependencies.read().clone().ok_or(ApiError::Disposed)
    }

    /// Build a request against this handler's connection.
    pub fn build_request<F>(&self, method: Method, build: F) -> Result<ApiRequest>
    where
        F: for<'b> FnOnce(RequestBuilder<'b, S>) -> RequestBuilder<'b, S>,
    {
        let dependencies = self.dependencies()?;
        build(RequestBuilder::new(&self.settings, &dependencies.serializer, method)).build()
    }

    /// Perform a request without a response payload.
    pub async fn perform_request(&self, request: &ApiRequest) -> Result<ApiResponse> {
        let dependencies = self.dependencies()?;
        let started = self.start(&dependencies, request);

        let processor = ResponseProcessor::new(request.identity(), &dependencies.serializer);
        let response = match self.execute(&dependencies, request).await? {
            Execution::Completed(raw) => processor.process(Some(raw)),
            Execution::Failed(failure) => processor.failure(failure),
        };

        self.finish(&dependencies, &response, started);
        Ok(response)
    }

    /// Perform a request and deserialize the response payload.
    pub async fn perform_request_typed<T>(&self, request: &ApiRequest) -> Result<TypedApiResponse<T>>
    where
        T: DeserializeOwned + Send,
    {
        let dependencies = self.dependencies()?;
        let started = self.start(&dependencies, request);

        let processor = ResponseProcessor::new(request.identity(), &dependencies.serializer);
        let response = match self.execute(&dependencies, request).await? {
            Execution::Completed(raw) => processor.process_typed(Some(raw)).await,
            Execution::Failed(failure) => TypedApiResponse::from_failure(processor.failure(failure)),
        };

        self.finish(&dependencies, &response, started);
        Ok(response)
    }

    /// Build and perform a request without a response payload.
    pub async fn request<F>(&self, method: Method, build: F) -> Result<ApiResponse>
    where
        F: for<'b> FnOnce(RequestBuilder<'b, S>) -> RequestBuilder<'b, S>,
    {
        let request = self.build_request(method, build)?;
        self.perform_request(&request).await
    }

    /// Build and perform a request, deserializing the response payload.
    pub async fn request_typed<T, F>(&self, method: Method, build: F) -> Result<TypedApiResponse<T>>
    where
        T: DeserializeOwned + Send,
        F: for<'b> FnOnce(RequestBuilder<'b, S>) -> RequestBuilder<'b, S>,
    {
        let request = self.build_request(method, build)?;
        self.perform_request_typed(&request).await
    }

    fn start(&self, dependencies: &HandlerDependencies<S>, request: &ApiRequest) -> Instant {
        info!(
            request_id = %request.identity(),
            method = %request.method(),
            route = %request.route(),
            "Performing request"
        );
        dependencies.events.publish(RequestEvent::new(request));
        Instant::now()
    }

    async fn execute(
        &self,
        dependencies: &HandlerDependencies<S>,
        request: &ApiRequest,
    ) -> Result<Execution> {
        RetryEngine::new(&self.settings, dependencies.provider.as_ref())
            .with_events(&dependencies.events)
            .execute(request)
            .await
    }

    fn finish(&self, dependencies: &HandlerDependencies<S>, response: &ApiResponse, started: Instant) {
        let elapsed = started.elapsed();

        if response.was_successful() {
            info!(
                request_id = %response.request_id(),
                status = %response.status(),
                elapsed_ms = elapsed.as_millis() as u64,
                "Request succeeded"
            );
        } else {
            warn!(
                request_id = %response.request_id(),
                status = %response.status(),
                message = response.message().unwrap_or_default(),
                has_exception = response.has_exception(),
                "Request failed"
            );
        }

        dependencies.events.publish(ResponseEvent::new(
            response.request_id(),
            response.status(),
            response.was_successful(),
            elapsed,
        ));
    }
}

impl<S> std::fmt::Debug for ApiHandler<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiHandler")
            .field("settings", &self.settings)
            .field("disposed", &self.dependencies.read().is_none())
            .finish()
    }
}

struct Source {
    base_address: String,
    resource: Option<String>,
    resource_path: Option<String>,
}

/// Builder for [`ApiHandler`].
///
/// The connection comes from [`use_source`](Self::use_source) or
/// [`use_configuration`](Self::use_configuration). Explicit `timeout` and
/// `retry_attempts` win over configured values, which win over the
/// [`ApiDefaults`].
pub struct ApiHandlerBuilder<S = JsonSerializer> {
    source: Option<Source>,
    configuration: Option<serene_config::ApiConfig>,
    timeout: Option<Duration>,
    retry_attempts: Option<u32>,
    defaults: ApiDefaults,
    serializer: S,
    provider: Option<Arc<dyn ConnectionProvider>>,
    client_override: Option<reqwest::Client>,
    authentication: Option<Authentication>,
    user_agent: Option<String>,
    events: EventPublisher,
    error: Option<ApiError>,
}

impl ApiHandlerBuilder<JsonSerializer> {
    pub fn new() -> Self {
        Self {
            source: None,
            configuration: None,
            timeout: None,
            retry_attempts: None,
            defaults: ApiDefaults::default(),
            serializer: JsonSerializer::new(),
            provider: None,
            client_override: None,
            authentication: None,
            user_agent: None,
            events: EventPublisher::disabled(),
            error: None,
        }
    }
}

impl Default for ApiHandlerBuilder<JsonSerializer> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Serializer> ApiHandlerBuilder<S> {
    fn fail(&mut self, error: ApiError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    /// Connect to `base_address`, optionally scoped to a resource.
    ///
    /// Without a resource path the default one (`api/`) is used; pass
    /// `Some("")` for none.
    pub fn use_source(
        mut self,
        base_address: impl Into<String>,
        resource: Option<&str>,
        resource_path: Option<&str>,
    ) -> Self {
        if self.source.is_some() || self.configuration.is_some() {
            self.fail(ApiError::CalledTwice("use_source"));
            return self;
        }

        self.source = Some(Source {
            base_address: base_address.into(),
            resource: resource.map(str::to_string),
            resource_path: resource_path.map(str::to_string),
        });
        self
    }

    /// Read the connection from configuration.
    ///
    /// See [`ConfigManager::api_config`] for how `section` is looked up.
    pub fn use_configuration(mut self, config: &ConfigManager, section: Option<&str>) -> Self {
        if self.source.is_some() || self.configuration.is_some() {
            self.fail(ApiError::CalledTwice("use_configuration"));
            return self;
        }

        match config.api_config(section) {
            Ok(configuration) => self.configuration = Some(configuration),
            Err(e) => self.fail(e.into()),
        }
        self
    }

    /// Abandon an attempt after `timeout`.
    ///
    /// A zero timeout counts as unset, as it does in configuration.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout).filter(|t| !t.is_zero());
        self
    }

    /// Retry timed out requests up to `retry_attempts` times.
    pub fn retry_attempts(mut self, retry_attempts: u32) -> Self {
        self.retry_attempts = Some(retry_attempts);
        self
    }

    /// Replace the fallback values.
    pub fn defaults(mut self, defaults: ApiDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    /// Use another serializer.
    pub fn serializer<T: Serializer>(self, serializer: T) -> ApiHandlerBuilder<T> {
        ApiHandlerBuilder {
            source: self.source,
            configuration: self.configuration,
            timeout: self.timeout,
            retry_attempts: self.retry_attempts,
            defaults: self.defaults,
            serializer,
            provider: self.provider,
            client_override: self.client_override,
            authentication: self.authentication,
            user_agent: self.user_agent,
            events: self.events,
            error: self.error,
        }
    }

    /// Acquire transports from a custom provider.
    pub fn connection_provider(mut self, provider: impl ConnectionProvider + 'static) -> Self {
        self.provider = Some(Arc::new(provider));
        self
    }

    /// Share a caller-owned client between every attempt.
    ///
    /// The client is never disposed by the handler.
    pub fn client_override(mut self, client: reqwest::Client) -> Self {
        self.client_override = Some(client);
        self
    }

    /// Send credentials with every request.
    pub fn authentication(mut self, authentication: Authentication) -> Self {
        self.authentication = Some(authentication);
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Publish lifecycle events on `bus`.
    pub fn event_bus(mut self, bus: EventBus) -> Self {
        self.events = EventPublisher::new(bus);
        self
    }

    fn connection(&mut self) -> Result<ConnectionSettings> {
        let settings = match (self.source.take(), self.configuration.take()) {
            (Some(source), _) => {
                let resource_path = source
                    .resource_path
                    .unwrap_or_else(|| self.defaults.resource_path.clone());

                ConnectionSettings::new(
                    &source.base_address,
                    source.resource.as_deref(),
                    Some(&resource_path),
                )?
                .with_timeout(self.defaults.timeout)
                .with_retry_attempts(self.defaults.retry_count)
            }
            (None, Some(configuration)) => {
                ConnectionSettings::from_config(&configuration.resolve(&self.defaults)?)?
            }
            (None, None) => {
                return Err(ApiError::Configuration(
                    "no source configured; call use_source or use_configuration".to_string(),
                ));
            }
        };

        let settings = match self.timeout {
            Some(timeout) => settings.with_timeout(timeout),
            None => settings,
        };

        Ok(match self.retry_attempts {
            Some(retry_attempts) => settings.with_retry_attempts(retry_attempts),
            None => settings,
        })
    }

    fn provider(&mut self) -> Result<Arc<dyn ConnectionProvider>> {
        if let Some(provider) = self.provider.take() {
            if self.client_override.is_some() || self.authentication.is_some() {
                return Err(ApiError::Configuration(
                    "client_override and authentication apply to the default provider only"
                        .to_string(),
                ));
            }
            return Ok(provider);
        }

        let mut factory = ClientFactory::new();
        if let Some(user_agent) = self.user_agent.take() {
            factory = factory.with_user_agent(user_agent);
        }
        if let Some(authentication) = &self.authentication {
            factory = factory.with_authentication(authentication)?;
        }
        if let Some(client) = self.client_override.take() {
            factory = factory.with_override(client);
        }

        Ok(Arc::new(factory))
    }

    /// Build the handler.
    pub fn build(mut self) -> Result<ApiHandler<S>> {
        if let Some(error) = self.error.take() {
            return Err(error);
        }

        let settings = self.connection()?;
        let provider = self.provider()?;

        debug!(
            source = %settings.source(),
            timeout = ?settings.timeout(),
            retry_attempts = settings.retry_attempts(),
            "Built API handler"
        );

        Ok(ApiHandler {
            settings: Arc::new(settings),
            dependencies: RwLock::new(Some(Arc::new(HandlerDependencies {
                serializer: self.serializer,
                provider,
                events: self.events,
            }))),
        })
    }
}

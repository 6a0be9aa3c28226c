//! Blocking facade over [`ApiHandler`].

use crate::{
    ApiHandler, ApiRequest, ApiResponse, JsonSerializer, Method, RequestBuilder, Result,
    Serializer, TypedApiResponse,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt::Display;
use tokio::runtime::{Builder, Runtime};

/// Synchronous wrapper owning a runtime with one worker thread.
///
/// Event listeners keep running on the worker between calls.
/// Must not be used from within an async context.
pub struct BlockingApiHandler<S = JsonSerializer> {
    handler: ApiHandler<S>,
    runtime: Runtime,
}

impl<S: Serializer> BlockingApiHandler<S> {
    pub fn new(handler: ApiHandler<S>) -> Result<Self> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()?;
        Ok(Self { handler, runtime })
    }

    /// The wrapped asynchronous handler.
    pub fn handler(&self) -> &ApiHandler<S> {
        &self.handler
    }

    pub fn dispose(&self) -> bool {
        self.handler.dispose()
    }

    pub fn perform_request(&self, request: &ApiRequest) -> Result<ApiResponse> {
        self.runtime.block_on(self.handler.perform_request(request))
    }

    pub fn perform_request_typed<T>(&self, request: &ApiRequest) -> Result<TypedApiResponse<T>>
    where
        T: DeserializeOwned + Send,
    {
        self.runtime.block_on(self.handler.perform_request_typed(request))
    }

    pub fn request<F>(&self, method: Method, build: F) -> Result<ApiResponse>
    where
        F: for<'b> FnOnce(RequestBuilder<'b, S>) -> RequestBuilder<'b, S>,
    {
        self.runtime.block_on(self.handler.request(method, build))
    }

    pub fn request_typed<T, F>(&self, method: Method, build: F) -> Result<TypedApiResponse<T>>
    where
        T: DeserializeOwned + Send,
        F: for<'b> FnOnce(RequestBuilder<'b, S>) -> RequestBuilder<'b, S>,
    {
        self.runtime.block_on(self.handler.request_typed(method, build))
    }

    pub fn get<T>(&self, identifier: impl Display) -> Result<TypedApiResponse<T>>
    where
        T: DeserializeOwned + Send,
    {
        self.runtime.block_on(self.handler.get(identifier))
    }

    pub fn get_all<T>(&self) -> Result<TypedApiResponse<Vec<T>>>
    where
        T: DeserializeOwned + Send,
    {
        self.runtime.block_on(self.handler.get_all())
    }

    pub fn create<T>(&self, resource: &T) -> Result<TypedApiResponse<T>>
    where
        T: Serialize + DeserializeOwned + Send,
    {
        self.runtime.block_on(self.handler.create(resource))
    }

    pub fn replace<T>(&self, resource: &T) -> Result<TypedApiResponse<T>>
    where
        T: Serialize + DeserializeOwned + Send,
    {
        self.runtime.block_on(self.handler.replace(resource))
    }

    pub fn update<T>(&self, resource: &T) -> Result<TypedApiResponse<T>>
    where
        T: Serialize + DeserializeOwned + Send,
    {
        self.runtime.block_on(self.handler.update(resource))
    }

    pub fn delete(&self, identifier: impl Display) -> Result<ApiResponse> {
        self.runtime.block_on(self.handler.delete(identifier))
    }
}

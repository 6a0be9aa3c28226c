//! CRUD helpers for handlers bound to a single resource.

use crate::{ApiHandler, ApiResponse, Method, Result, Serializer, TypedApiResponse};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt::Display;

impl<S: Serializer> ApiHandler<S> {
    /// `GET {source}/{identifier}`
    pub async fn get<T>(&self, identifier: impl Display) -> Result<TypedApiResponse<T>>
    where
        T: DeserializeOwned + Send,
    {
        self.request_typed(Method::Get, |r| r.with_endpoint(identifier))
            .await
    }

    /// `GET {source}`
    pub async fn get_all<T>(&self) -> Result<TypedApiResponse<Vec<T>>>
    where
        T: DeserializeOwned + Send,
    {
        self.request_typed(Method::Get, |r| r).await
    }

    /// `POST {source}` with the resource in the body.
    pub async fn create<T>(&self, resource: &T) -> Result<TypedApiResponse<T>>
    where
        T: Serialize + DeserializeOwned + Send,
    {
        self.request_typed(Method::Post, |r| r.with_in_body_content(resource))
            .await
    }

    /// `PUT {source}` with the resource in the body.
    pub async fn replace<T>(&self, resource: &T) -> Result<TypedApiResponse<T>>
    where
        T: Serialize + DeserializeOwned + Send,
    {
        self.request_typed(Method::Put, |r| r.with_in_body_content(resource))
            .await
    }

    /// `PATCH {source}` with the resource in the body.
    pub async fn update<T>(&self, resource: &T) -> Result<TypedApiResponse<T>>
    where
        T: Serialize + DeserializeOwned + Send,
    {
        self.request_typed(Method::Patch, |r| r.with_in_body_content(resource))
            .await
    }

    /// `DELETE {source}/{identifier}`
    pub async fn delete(&self, identifier: impl Display) -> Result<ApiResponse> {
        self.request(Method::Delete, |r| r.with_endpoint(identifier))
            .await
    }
}

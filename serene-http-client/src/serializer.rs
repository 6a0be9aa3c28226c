//! Content serialization.

use crate::RequestContent;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::future::Future;
use thiserror::Error;

/// Serializer errors.
///
/// Deserialization failures are their own kind so that response processing
/// can tell them apart from everything else.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SerializerError {
    /// A value could not be turned into request content.
    #[error("serialization failed: {0}")]
    Serialize(String),

    /// Response content could not be turned into a value.
    #[error("deserialization failed: {0}")]
    Deserialize(String),
}

/// Converts request and response content.
pub trait Serializer: Send + Sync + 'static {
    /// Serialize a value into request content.
    fn serialize<T>(&self, value: &T) -> Result<RequestContent, SerializerError>
    where
        T: Serialize + ?Sized;

    /// Deserialize response content.
    fn deserialize<T>(&self, content: &[u8]) -> Result<T, SerializerError>
    where
        T: DeserializeOwned;

    /// Serialize a value into request content asynchronously.
    fn serialize_async<T>(
        &self,
        value: &T,
    ) -> impl Future<Output = Result<RequestContent, SerializerError>> + Send
    where
        T: Serialize + ?Sized,
    {
        let result = self.serialize(value);
        async move { result }
    }

    /// Deserialize response content asynchronously.
    fn deserialize_async<T>(
        &self,
        content: &[u8],
    ) -> impl Future<Output = Result<T, SerializerError>> + Send
    where
        T: DeserializeOwned + Send,
    {
        let result = self.deserialize(content);
        async move { result }
    }
}

/// JSON serializer backed by `serde_json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerializer {
    pretty: bool,
}

impl JsonSerializer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit indented JSON.
    pub fn pretty() -> Self {
        Self { pretty: true }
    }
}

impl Serializer for JsonSerializer {
    fn serialize<T>(&self, value: &T) -> Result<RequestContent, SerializerError>
    where
        T: Serialize + ?Sized,
    {
        let body = if self.pretty {
            serde_json::to_vec_pretty(value)
        } else {
            serde_json::to_vec(value)
        }
        .map_err(|e| SerializerError::Serialize(e.to_string()))?;

        Ok(RequestContent::json(body))
    }

    fn deserialize<T>(&self, content: &[u8]) -> Result<T, SerializerError>
    where
        T: DeserializeOwned,
    {
        serde_json::from_slice(content).map_err(|e| SerializerError::Deserialize(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Widget {
        id: u32,
        name: String,
    }

    #[test]
    fn test_serialize_produces_json_content() {
        let content = JsonSerializer::new()
            .serialize(&Widget {
                id: 1,
                name: "sprocket".to_string(),
            })
            .unwrap();

        assert_eq!(content.media_type(), "application/json");
        assert_eq!(content.body().as_ref(), br#"{"id":1,"name":"sprocket"}"#);
    }

    #[test]
    fn test_pretty_output() {
        let content = JsonSerializer::pretty().serialize(&vec![1, 2]).unwrap();
        assert!(content.body().contains(&b'\n'));
    }

    #[test]
    fn test_deserialize_error_kind() {
        let result: Result<Widget, _> = JsonSerializer::new().deserialize(b"{not json");
        assert!(matches!(result, Err(SerializerError::Deserialize(_))));
    }

    #[tokio::test]
    async fn test_async_forms() {
        let serializer = JsonSerializer::new();
        let content = serializer.serialize_async(&[1, 2, 3]).await.unwrap();
        let values: Vec<u8> = serializer.deserialize_async(content.body()).await.unwrap();

        assert_eq!(values, vec![1, 2, 3]);
    }
}

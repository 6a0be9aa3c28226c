//! Request builder.

use crate::{
    ApiError, ApiRequest, ConnectionSettings, Method, QueryFactory, RequestContent, Result,
    Serializer,
};
use serde::Serialize;
use std::fmt::Display;
use url::Url;

/// Fluent builder for [`ApiRequest`]s.
///
/// The route is the connection source followed by the endpoint and the
/// query. Each method may be used once; mistakes are reported by
/// [`build`](Self::build).
///
/// ```rust,ignore
/// let request = handler.build_request(Method::Get, |r| {
///     r.with_endpoint_template("{0}/parts/{1}", &[&42, &"hinge"])
///         .with_query_fields(&search, &["page"])
/// })?;
/// ```
pub struct RequestBuilder<'a, S> {
    settings: &'a ConnectionSettings,
    serializer: &'a S,
    method: Method,
    resource: Option<String>,
    endpoint: Option<String>,
    query: Option<String>,
    content: Option<RequestContent>,
    error: Option<ApiError>,
}

impl<'a, S: Serializer> RequestBuilder<'a, S> {
    pub fn new(settings: &'a ConnectionSettings, serializer: &'a S, method: Method) -> Self {
        Self {
            settings,
            serializer,
            method,
            resource: None,
            endpoint: None,
            query: None,
            content: None,
            error: None,
        }
    }

    fn fail(&mut self, error: ApiError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    /// Target a resource when the connection has none.
    pub fn against_resource(mut self, resource: impl Into<String>) -> Self {
        if self.resource.is_some() {
            self.fail(ApiError::CalledTwice("against_resource"));
        } else {
            self.resource = Some(resource.into());
        }
        self
    }

    /// Append an endpoint to the route.
    pub fn with_endpoint(mut self, endpoint: impl Display) -> Self {
        if self.endpoint.is_some() {
            self.fail(ApiError::CalledTwice("with_endpoint"));
        } else {
            self.endpoint = Some(endpoint.to_string());
        }
        self
    }

    /// Append an endpoint built from a template with `{0}`, `{1}`...
    /// placeholders.
    pub fn with_endpoint_template(mut self, template: &str, parameters: &[&dyn Display]) -> Self {
        if self.endpoint.is_some() {
            self.fail(ApiError::CalledTwice("with_endpoint_template"));
            return self;
        }

        match fill_template(template, parameters) {
            Ok(endpoint) => self.endpoint = Some(endpoint),
            Err(e) => self.fail(e),
        }
        self
    }

    /// Add every field of `query` to the query string.
    pub fn with_query<Q: Serialize + ?Sized>(self, query: &Q) -> Self {
        let built = QueryFactory::build(query);
        self.set_query("with_query", built)
    }

    /// Add the named fields of `query` to the query string.
    pub fn with_query_fields<Q: Serialize + ?Sized>(self, query: &Q, fields: &[&str]) -> Self {
        let built = QueryFactory::build_fields(query, fields);
        self.set_query("with_query_fields", built)
    }

    fn set_query(mut self, method: &'static str, built: Result<String>) -> Self {
        if self.query.is_some() {
            self.fail(ApiError::CalledTwice(method));
            return self;
        }

        match built {
            Ok(query) => self.query = Some(query),
            Err(e) => self.fail(e),
        }
        self
    }

    /// Serialize `content` as the request body.
    pub fn with_in_body_content<C: Serialize + ?Sized>(mut self, content: &C) -> Self {
        if self.content.is_some() {
            self.fail(ApiError::CalledTwice("with_in_body_content"));
            return self;
        }

        match self.serializer.serialize(content) {
            Ok(content) => self.content = Some(content),
            Err(e) => self.fail(ApiError::Serialization(e)),
        }
        self
    }

    /// Compose the route and create the request.
    pub fn build(self) -> Result<ApiRequest> {
        if let Some(error) = self.error {
            return Err(error);
        }

        let mut route = match &self.resource {
            Some(resource) => self.settings.with_resource(resource)?.source().to_string(),
            None => self.settings.source().to_string(),
        };

        if let Some(endpoint) = &self.endpoint {
            let endpoint = endpoint.trim().trim_start_matches('/');
            if !endpoint.is_empty() {
                if !route.ends_with('/') {
                    route.push('/');
                }
                route.push_str(endpoint);
            }
        }

        let mut route = Url::parse(&route)
            .map_err(|e| ApiError::InvalidRoute(format!("{}: {}", route, e)))?;

        if let Some(query) = &self.query {
            route.set_query(Some(query));
        }

        ApiRequest::new(self.method, route, self.content)
    }
}

fn fill_template(template: &str, parameters: &[&dyn Display]) -> Result<String> {
    let mut filled = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        filled.push_str(&rest[..open]);
        let after = &rest[open + 1..];

        let Some(close) = after.find('}') else {
            return Err(ApiError::InvalidRoute(format!(
                "unclosed placeholder in {:?}",
                template
            )));
        };

        let index: usize = after[..close].trim().parse().map_err(|_| {
            ApiError::InvalidRoute(format!("invalid placeholder in {:?}", template))
        })?;

        let parameter = parameters.get(index).ok_or_else(|| {
            ApiError::InvalidRoute(format!(
                "no parameter for placeholder {{{}}} in {:?}",
                index, template
            ))
        })?;

        filled.push_str(&parameter.to_string());
        rest = &after[close + 1..];
    }

    filled.push_str(rest);
    Ok(filled)
}

//! Contract with the network-interception host (a browser context).

use crate::error::MockError;
use async_trait::async_trait;
use bytes::Bytes;
use futures::future::BoxFuture;
use http::Method;
use std::collections::HashMap;
use std::sync::Arc;

/// Failure reported by the host
pub type HostError = Box<dyn std::error::Error + Send + Sync>;

/// Intercepted HTTP request, read-only
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterceptedRequest {
    /// Full request URL
    pub url: String,
    /// HTTP method
    pub method: Method,
    /// Request headers, names lower-cased
    pub headers: HashMap<String, String>,
    /// Raw request body
    pub post_data: Option<Bytes>,
}

impl InterceptedRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method,
            headers: HashMap::new(),
            post_data: None,
        }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_lowercase(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.post_data = Some(body.into());
        self
    }

    /// Header value by case-insensitive name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Response used to fulfill an intercepted request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fulfillment {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: Bytes,
}

/// Control object for one intercepted exchange
#[async_trait]
pub trait Route: Send {
    /// Answer the request without touching the network
    async fn fulfill(&mut self, response: Fulfillment) -> Result<(), HostError>;
    /// Send the request to its real destination
    async fn continue_unmodified(&mut self) -> Result<(), HostError>;
}

/// Callback invoked by the host for every exchange matching a rule
pub type RouteHandler = Arc<
    dyn Fn(Box<dyn Route>, InterceptedRequest) -> BoxFuture<'static, Result<(), MockError>>
        + Send
        + Sync,
>;

/// Host able to install interception rules
#[async_trait]
pub trait RouteHost: Send + Sync {
    /// Install a rule for URLs matching `pattern` (`*` does not cross `/`)
    async fn route(&self, pattern: &str, handler: RouteHandler) -> Result<(), HostError>;
}

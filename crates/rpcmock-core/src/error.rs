//! Errors raised by registration and exchange handling.

use crate::host::HostError;
use crate::types::descriptor::MethodKind;
use thiserror::Error;

/// Mock router error
#[derive(Debug, Error)]
pub enum MockError {
    /// Registration targets a streaming method
    #[error("Cannot add non-unary method. {service}/{method} is {kind}")]
    UnsupportedMethodKind {
        service: String,
        method: String,
        kind: MethodKind,
    },
    /// Service registration names a method the service does not declare
    #[error("No method handler found for {method} on service {service}")]
    UnknownMethod { service: String, method: String },
    /// The RPC router answered without a body
    #[error("No response body for {url}")]
    NoResponseBody { url: String },
    /// A service-wide rule intercepted a path with no declared method
    #[error("No associated method found for url {url}")]
    UnmatchedUrl { url: String },
    /// Request declared JSON but the body does not parse
    #[error("Invalid JSON request body: {0}")]
    InvalidJsonBody(#[source] serde_json::Error),
    /// Response body exceeded the configured read limit
    #[error("Response body exceeds {limit} bytes")]
    ResponseTooLarge { limit: u64 },
    /// Response body stream failed
    #[error("Failed to read response body: {0}")]
    ResponseBody(#[source] std::io::Error),
    /// The interception host rejected an operation
    #[error("Route host error: {0}")]
    Host(#[source] HostError),
    /// A rule returned without fulfilling or continuing the request
    #[error("Route for {url} was neither fulfilled nor continued")]
    Unhandled { url: String },
}

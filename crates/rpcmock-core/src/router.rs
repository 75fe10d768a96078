//! Contract with the external RPC router.
//!
//! The router owns the wire formats, dispatch, and error-to-wire mapping. This
//! crate only hands it a method, an implementation, and a normalized request,
//! and reads back a normalized response.

use crate::config::options::RouterOptions;
use crate::types::descriptor::{MethodDescriptor, ServiceDescriptor};
use async_trait::async_trait;
use bytes::Bytes;
use futures::future::BoxFuture;
use futures::stream::BoxStream;
use futures::FutureExt;
use http::HeaderMap;
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Connect status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Code {
    Canceled,
    Unknown,
    InvalidArgument,
    DeadlineExceeded,
    NotFound,
    AlreadyExists,
    PermissionDenied,
    ResourceExhausted,
    FailedPrecondition,
    Aborted,
    OutOfRange,
    Unimplemented,
    Internal,
    Unavailable,
    DataLoss,
    Unauthenticated,
}

impl Code {
    /// Wire spelling of the code
    pub fn as_str(self) -> &'static str {
        match self {
            Code::Canceled => "canceled",
            Code::Unknown => "unknown",
            Code::InvalidArgument => "invalid_argument",
            Code::DeadlineExceeded => "deadline_exceeded",
            Code::NotFound => "not_found",
            Code::AlreadyExists => "already_exists",
            Code::PermissionDenied => "permission_denied",
            Code::ResourceExhausted => "resource_exhausted",
            Code::FailedPrecondition => "failed_precondition",
            Code::Aborted => "aborted",
            Code::OutOfRange => "out_of_range",
            Code::Unimplemented => "unimplemented",
            Code::Internal => "internal",
            Code::Unavailable => "unavailable",
            Code::DataLoss => "data_loss",
            Code::Unauthenticated => "unauthenticated",
        }
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured failure returned by a method implementation.
///
/// The router turns it into its own error response, so the client sees an
/// ordinary RPC failure carrying `code` and `message`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("[{code}] {message}")]
pub struct RpcError {
    pub code: Code,
    pub message: String,
}

impl RpcError {
    pub fn new(code: Code, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

type ImplFn = dyn Fn(Value) -> BoxFuture<'static, Result<Value, RpcError>> + Send + Sync;

/// Type-erased unary method implementation.
///
/// Receives the decoded input message and returns the output message. An empty
/// object is a valid output: the router fills in the output type's defaults.
#[derive(Clone)]
pub struct MethodImpl(Arc<ImplFn>);

impl MethodImpl {
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, RpcError>> + Send + 'static,
    {
        Self(Arc::new(move |input: Value| f(input).boxed()))
    }

    /// Implementation that always answers with an empty message
    pub fn empty() -> Self {
        Self::new(|_| async { Ok(Value::Object(serde_json::Map::new())) })
    }

    pub fn call(&self, input: Value) -> BoxFuture<'static, Result<Value, RpcError>> {
        (self.0)(input)
    }

    /// Whether both handles point at the same implementation
    pub fn ptr_eq(&self, other: &MethodImpl) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for MethodImpl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MethodImpl(..)")
    }
}

/// Request body as handed to the router
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// Parsed JSON value
    Json(Value),
    /// Raw bytes, empty when the request had no body
    Binary(Bytes),
}

/// Normalized server-side request
#[derive(Debug, Clone)]
pub struct UniversalServerRequest {
    pub method: String,
    pub url: String,
    pub header: HeaderMap,
    pub http_version: String,
    pub body: RequestBody,
    pub signal: CancellationToken,
}

/// Normalized server-side response
pub struct UniversalServerResponse {
    pub status: u16,
    pub header: Option<HeaderMap>,
    pub body: Option<BoxStream<'static, std::io::Result<Bytes>>>,
}

impl fmt::Debug for UniversalServerResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UniversalServerResponse")
            .field("status", &self.status)
            .field("header", &self.header)
            .field("body", &self.body.as_ref().map(|_| ".."))
            .finish()
    }
}

/// Handler built by the router for one method
#[async_trait]
pub trait UniversalHandler: Send + Sync {
    async fn handle(&self, request: UniversalServerRequest) -> UniversalServerResponse;
}

/// External RPC router
pub trait RpcRouter: Send + Sync {
    /// Build the handler serving `method` of `service` with `implementation`
    fn rpc(
        &self,
        service: &ServiceDescriptor,
        method: &MethodDescriptor,
        implementation: MethodImpl,
        options: &RouterOptions,
    ) -> Arc<dyn UniversalHandler>;
}

//! Test fixtures: descriptors, a JSON router, and a fake backend.

use crate::config::options::RouterOptions;
use crate::host::{Fulfillment, InterceptedRequest};
use crate::router::{
    Code, MethodImpl, RequestBody, RpcError, RpcRouter, UniversalHandler, UniversalServerRequest,
    UniversalServerResponse,
};
use crate::types::descriptor::{MethodDescriptor, MethodKind, ServiceDescriptor};
use async_trait::async_trait;
use bytes::Bytes;
use futures::{stream, StreamExt};
use http::{HeaderMap, HeaderValue, Method};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub const BASE_URL: &str = "https://demo.connectrpc.com";
pub const ELIZA: &str = "connectrpc.eliza.v1.ElizaService";
pub const TEST_SERVICE: &str = "test.v1.TestService";

pub fn test_service() -> ServiceDescriptor {
    ServiceDescriptor::new(TEST_SERVICE)
        .with_method("unaryOne", MethodDescriptor::unary("UnaryOne"))
        .with_method("unaryTwo", MethodDescriptor::unary("UnaryTwo"))
        .with_method(
            "serverStreaming",
            MethodDescriptor::new("ServerStreaming", MethodKind::ServerStreaming),
        )
}

pub fn eliza_service() -> ServiceDescriptor {
    ServiceDescriptor::new(ELIZA)
        .with_method("say", MethodDescriptor::unary("Say"))
        .with_method(
            "converse",
            MethodDescriptor::new("Converse", MethodKind::BiDiStreaming),
        )
        .with_method(
            "introduce",
            MethodDescriptor::new("Introduce", MethodKind::ServerStreaming),
        )
}

/// JSON POST to `{BASE_URL}/{service}/{method}`
pub fn json_call(service: &str, method: &str, body: Value) -> InterceptedRequest {
    InterceptedRequest::new(Method::POST, format!("{BASE_URL}/{service}/{method}"))
        .with_header("Content-Type", "application/json")
        .with_header("Connect-Protocol-Version", "1")
        .with_body(body.to_string())
}

pub fn say(sentence: &str) -> InterceptedRequest {
    json_call(ELIZA, "Say", json!({ "sentence": sentence }))
}

pub fn body_json(fulfillment: &Fulfillment) -> Value {
    serde_json::from_slice(&fulfillment.body).unwrap_or(Value::Null)
}

/// `sentence` field of a JSON response, empty when absent (proto3 default)
pub fn sentence(fulfillment: &Fulfillment) -> String {
    body_json(fulfillment)["sentence"]
        .as_str()
        .unwrap_or_default()
        .to_owned()
}

/// Stand-in for the real Eliza backend
pub async fn eliza_backend(request: InterceptedRequest) -> Fulfillment {
    let input: Value = request
        .post_data
        .as_deref()
        .and_then(|b| serde_json::from_slice(b).ok())
        .unwrap_or(Value::Null);
    let said = input["sentence"].as_str().unwrap_or_default();
    let mut headers = HashMap::new();
    headers.insert("content-type".to_owned(), "application/json".to_owned());
    Fulfillment {
        status: 200,
        headers,
        body: Bytes::from(json!({ "sentence": format!("ELIZA heard: {said}") }).to_string()),
    }
}

pub fn http_status(code: Code) -> u16 {
    match code {
        Code::Canceled => 499,
        Code::Unknown | Code::Internal | Code::DataLoss => 500,
        Code::InvalidArgument | Code::FailedPrecondition | Code::OutOfRange => 400,
        Code::DeadlineExceeded => 504,
        Code::NotFound => 404,
        Code::AlreadyExists | Code::Aborted => 409,
        Code::PermissionDenied => 403,
        Code::ResourceExhausted => 429,
        Code::Unimplemented => 501,
        Code::Unavailable => 503,
        Code::Unauthenticated => 401,
    }
}

/// What a `JsonRouter` handler was asked to serve
#[derive(Debug, Clone)]
pub struct Served {
    pub service: String,
    pub method: String,
    pub request: UniversalServerRequest,
    pub options: RouterOptions,
}

/// Router speaking Connect-style JSON for both body kinds.
#[derive(Clone, Default)]
pub struct JsonRouter {
    served: Arc<Mutex<Vec<Served>>>,
    omit_body: bool,
}

impl JsonRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Router whose handlers answer without a body
    pub fn without_body() -> Self {
        Self {
            omit_body: true,
            ..Self::default()
        }
    }

    pub fn served(&self) -> Vec<Served> {
        self.served.lock().unwrap().clone()
    }
}

impl RpcRouter for JsonRouter {
    fn rpc(
        &self,
        service: &ServiceDescriptor,
        method: &MethodDescriptor,
        implementation: MethodImpl,
        options: &RouterOptions,
    ) -> Arc<dyn UniversalHandler> {
        Arc::new(JsonHandler {
            service: service.type_name.clone(),
            method: method.name.clone(),
            implementation,
            options: options.clone(),
            router: self.clone(),
        })
    }
}

struct JsonHandler {
    service: String,
    method: String,
    implementation: MethodImpl,
    options: RouterOptions,
    router: JsonRouter,
}

impl JsonHandler {
    fn decode(body: &RequestBody) -> Result<Value, RpcError> {
        let value = match body {
            RequestBody::Json(value) => value.clone(),
            RequestBody::Binary(bytes) if bytes.is_empty() => Value::Null,
            RequestBody::Binary(bytes) => serde_json::from_slice(bytes)
                .map_err(|e| RpcError::new(Code::InvalidArgument, e.to_string()))?,
        };
        Ok(if value.is_null() { json!({}) } else { value })
    }
}

#[async_trait]
impl UniversalHandler for JsonHandler {
    async fn handle(&self, request: UniversalServerRequest) -> UniversalServerResponse {
        self.router.served.lock().unwrap().push(Served {
            service: self.service.clone(),
            method: self.method.clone(),
            request: request.clone(),
            options: self.options.clone(),
        });

        let result = match Self::decode(&request.body) {
            Ok(input) => self.implementation.call(input).await,
            Err(e) => Err(e),
        };
        let (status, payload) = match result {
            Ok(output) => (200, output),
            Err(e) => (
                http_status(e.code),
                json!({ "code": e.code.as_str(), "message": e.message }),
            ),
        };

        let mut header = HeaderMap::new();
        header.insert("content-type", HeaderValue::from_static("application/json"));
        let body = (!self.router.omit_body).then(|| {
            let bytes = Bytes::from(payload.to_string());
            stream::once(async move { Ok::<_, std::io::Error>(bytes) }).boxed()
        });
        UniversalServerResponse {
            status,
            header: Some(header),
            body,
        }
    }
}

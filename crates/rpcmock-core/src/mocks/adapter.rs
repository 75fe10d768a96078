//! Translation between intercepted exchanges and router requests/responses.

use crate::error::MockError;
use crate::host::{Fulfillment, InterceptedRequest, Route};
use crate::matching::{from_header_map, is_json_content_type, to_header_map};
use crate::router::{RequestBody, UniversalHandler, UniversalServerRequest};
use bytes::{Bytes, BytesMut};
use futures::stream::BoxStream;
use futures::StreamExt;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

/// HTTP version reported to the router for intercepted requests
pub const HTTP_VERSION: &str = "2.0";

/// Decode the request body: parsed JSON for JSON requests, raw bytes otherwise.
pub fn decode_body(request: &InterceptedRequest) -> Result<RequestBody, MockError> {
    let raw = request.post_data.clone().unwrap_or_default();
    if !is_json_content_type(&request.headers) {
        return Ok(RequestBody::Binary(raw));
    }
    if raw.is_empty() {
        return Ok(RequestBody::Json(Value::Null));
    }
    serde_json::from_slice(&raw)
        .map(RequestBody::Json)
        .map_err(MockError::InvalidJsonBody)
}

/// Build the normalized request handed to the router.
///
/// The cancellation token is never fired.
pub fn to_server_request(
    request: &InterceptedRequest,
) -> Result<UniversalServerRequest, MockError> {
    Ok(UniversalServerRequest {
        method: request.method.as_str().to_owned(),
        url: request.url.clone(),
        header: to_header_map(&request.headers),
        http_version: HTTP_VERSION.to_owned(),
        body: decode_body(request)?,
        signal: CancellationToken::new(),
    })
}

/// Drain a response body into one buffer, failing past `limit` bytes.
pub async fn read_all_bytes(
    mut body: BoxStream<'static, std::io::Result<Bytes>>,
    limit: u64,
) -> Result<Bytes, MockError> {
    let mut buffer = BytesMut::new();
    while let Some(chunk) = body.next().await {
        let chunk = chunk.map_err(MockError::ResponseBody)?;
        if (buffer.len() + chunk.len()) as u64 > limit {
            return Err(MockError::ResponseTooLarge { limit });
        }
        buffer.extend_from_slice(&chunk);
    }
    Ok(buffer.freeze())
}

/// Serve one intercepted exchange with a router-built handler and fulfill it.
///
/// Errors raised by the method implementation never reach this function: the
/// router has already encoded them into the response.
pub async fn fulfill_with_handler(
    handler: &dyn UniversalHandler,
    route: &mut dyn Route,
    request: &InterceptedRequest,
    read_max_bytes: u64,
) -> Result<(), MockError> {
    let server_request = to_server_request(request)?;
    let response = handler.handle(server_request).await;

    let headers = from_header_map(response.header.as_ref());
    let body = response.body.ok_or_else(|| MockError::NoResponseBody {
        url: request.url.clone(),
    })?;
    let body = read_all_bytes(body, read_max_bytes).await?;

    route
        .fulfill(Fulfillment {
            status: response.status,
            headers,
            body,
        })
        .await
        .map_err(MockError::Host)
}

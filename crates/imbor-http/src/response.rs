//! Gateway response serialization and error formatting.

use crate::body::ImborResponseBody;
use crate::error::GatewayError;

/// Content type for plain JSON responses.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Content type for compacted JSON-LD responses.
pub const JSON_LD_CONTENT_TYPE: &str = "application/ld+json";

/// Content type for the query page.
pub const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";

/// Header carrying the per-request identifier.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Serialize a gateway error into a JSON response body.
///
/// ```json
/// { "error": "BadGateway", "message": "LDP query failed", "upstreamStatus": 401 }
/// ```
#[must_use]
pub fn error_to_json(error: &GatewayError) -> Vec<u8> {
    let mut value = serde_json::json!({
        "error": error.code.as_str(),
        "message": error.message,
    });
    if let Some(status) = error.upstream_status {
        value["upstreamStatus"] = serde_json::Value::from(status);
    }
    serde_json::to_vec(&value).expect("JSON serialization of error cannot fail")
}

/// Convert a `GatewayError` into a complete HTTP error response.
#[must_use]
pub fn error_to_response(
    error: &GatewayError,
    request_id: &str,
) -> http::Response<ImborResponseBody> {
    let json = error_to_json(error);

    http::Response::builder()
        .status(error.status_code)
        .header("content-type", JSON_CONTENT_TYPE)
        .header(REQUEST_ID_HEADER, request_id)
        .body(ImborResponseBody::from_bytes(json))
        .expect("valid error response")
}

/// Build a `200 OK` response from serialized bytes.
#[must_use]
pub fn json_response(
    json: Vec<u8>,
    content_type: &'static str,
) -> http::Response<ImborResponseBody> {
    http::Response::builder()
        .status(http::StatusCode::OK)
        .header("content-type", content_type)
        .body(ImborResponseBody::from_bytes(json))
        .expect("valid JSON response")
}

/// Serialize a JSON value into a `200 OK` response.
pub fn value_response(
    value: &serde_json::Value,
    content_type: &'static str,
) -> Result<http::Response<ImborResponseBody>, GatewayError> {
    let json = serde_json::to_vec(value).map_err(|e| {
        GatewayError::internal_error("Failed to serialize response").with_source(e)
    })?;
    Ok(json_response(json, content_type))
}

/// Build a `200 OK` HTML response.
#[must_use]
pub fn html_response(html: String) -> http::Response<ImborResponseBody> {
    http::Response::builder()
        .status(http::StatusCode::OK)
        .header("content-type", HTML_CONTENT_TYPE)
        .body(ImborResponseBody::from_string(html))
        .expect("valid HTML response")
}

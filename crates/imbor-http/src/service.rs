//! Gateway HTTP service implementing the hyper `Service` trait.

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::body::Incoming;

use crate::body::ImborResponseBody;
use crate::dispatch::{ImborHandler, ImborOperation, dispatch_operation};
use crate::error::GatewayError;
use crate::form::extract_query;
use crate::response::{JSON_CONTENT_TYPE, REQUEST_ID_HEADER, error_to_response, html_response};
use crate::router::{Route, resolve_route};
use crate::ui::{base_url_from_headers, render_query_page};

/// Default cap on the `POST /endpoint/sparql` body (1 MiB).
pub const DEFAULT_MAX_QUERY_BYTES: usize = 1024 * 1024;

/// Value of the `server` response header.
pub const SERVER_NAME: &str = "imbor-gateway";

/// Configuration for the gateway HTTP service.
#[derive(Debug, Clone)]
pub struct ImborHttpConfig {
    /// Whether to emit permissive CORS headers and answer preflight requests.
    pub cors: bool,
    /// Largest accepted SPARQL request body in bytes.
    pub max_query_bytes: usize,
}

impl Default for ImborHttpConfig {
    fn default() -> Self {
        Self {
            cors: false,
            max_query_bytes: DEFAULT_MAX_QUERY_BYTES,
        }
    }
}

/// Hyper `Service` implementation for the gateway.
///
/// Wraps an [`ImborHandler`] implementation and routes incoming HTTP
/// requests to the appropriate LDP operation.
#[derive(Debug)]
pub struct ImborHttpService<H: ImborHandler> {
    handler: Arc<H>,
    config: Arc<ImborHttpConfig>,
}

impl<H: ImborHandler> ImborHttpService<H> {
    /// Create a new `ImborHttpService`.
    pub fn new(handler: Arc<H>, config: ImborHttpConfig) -> Self {
        Self {
            handler,
            config: Arc::new(config),
        }
    }

    /// Run a request with any body type through the full pipeline.
    pub async fn handle<B>(&self, req: http::Request<B>) -> http::Response<ImborResponseBody>
    where
        B: http_body::Body<Data = Bytes>,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let request_id = uuid::Uuid::new_v4().to_string();
        let method = req.method().clone();
        let path = req.uri().path().to_owned();

        let response = process_request(req, self.handler.as_ref(), &self.config, &request_id).await;
        let response = add_common_headers(response, &request_id, self.config.cors);

        tracing::info!(
            %method,
            %path,
            status = response.status().as_u16(),
            request_id = %request_id,
            "handled gateway request"
        );
        response
    }
}

impl<H: ImborHandler> Clone for ImborHttpService<H> {
    fn clone(&self) -> Self {
        Self {
            handler: Arc::clone(&self.handler),
            config: Arc::clone(&self.config),
        }
    }
}

impl<H: ImborHandler> hyper::service::Service<http::Request<Incoming>> for ImborHttpService<H> {
    type Response = http::Response<ImborResponseBody>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: http::Request<Incoming>) -> Self::Future {
        let service = self.clone();
        Box::pin(async move { Ok(service.handle(req).await) })
    }
}

/// Process a single gateway request.
async fn process_request<H, B>(
    req: http::Request<B>,
    handler: &H,
    config: &ImborHttpConfig,
    request_id: &str,
) -> http::Response<ImborResponseBody>
where
    H: ImborHandler,
    B: http_body::Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let (parts, incoming) = req.into_parts();

    // 1. CORS preflight.
    if config.cors && parts.method == http::Method::OPTIONS {
        return preflight_response();
    }

    // 2. Route.
    let route = match resolve_route(&parts.method, parts.uri.path()) {
        Ok(route) => route,
        Err(err) => return error_to_response(&err, request_id),
    };

    // 3. Turn the route into an operation, or answer locally.
    let op = match route {
        Route::Operation(op) => op,
        Route::Health => return health_response(),
        Route::QueryUi => {
            let base_url = base_url_from_headers(&parts.headers);
            return html_response(render_query_page(&base_url));
        }
        Route::SparqlEndpoint => {
            match read_query(&parts, incoming, config.max_query_bytes).await {
                Ok(query) => ImborOperation::SparqlSelect { query },
                Err(err) => return error_to_response(&err, request_id),
            }
        }
    };

    // 4. Dispatch to handler.
    match dispatch_operation(handler, op).await {
        Ok(response) => response,
        Err(err) => {
            if err.status_code.is_server_error() {
                tracing::warn!(
                    error = %err,
                    upstream_status = ?err.upstream_status,
                    "LDP operation failed",
                );
            }
            error_to_response(&err, request_id)
        }
    }
}

/// Read the SPARQL query from the body, enforcing the size cap.
///
/// An oversized body is rejected before the handler is ever called.
async fn read_query<B>(
    parts: &http::request::Parts,
    incoming: B,
    max_bytes: usize,
) -> Result<String, GatewayError>
where
    B: http_body::Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let declared = parts
        .headers
        .get(http::header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok());
    if declared.is_some_and(|len| len > max_bytes as u64) {
        return Err(GatewayError::payload_too_large(max_bytes));
    }

    let body = collect_body(incoming, max_bytes).await?;

    let content_type = parts
        .headers
        .get(http::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());
    extract_query(content_type, &body)
}

/// Collect the incoming body into a single `Bytes` buffer of at most `limit` bytes.
async fn collect_body<B>(incoming: B, limit: usize) -> Result<Bytes, GatewayError>
where
    B: http_body::Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    Limited::new(incoming, limit)
        .collect()
        .await
        .map(http_body_util::Collected::to_bytes)
        .map_err(|e| {
            if e.downcast_ref::<LengthLimitError>().is_some() {
                GatewayError::payload_too_large(limit)
            } else {
                GatewayError::bad_request(format!("Failed to read request body: {e}"))
            }
        })
}

fn health_response() -> http::Response<ImborResponseBody> {
    let body = serde_json::json!({
        "status": "running",
        "service": "imbor",
        "version": env!("CARGO_PKG_VERSION"),
    });

    http::Response::builder()
        .status(http::StatusCode::OK)
        .header("content-type", JSON_CONTENT_TYPE)
        .body(ImborResponseBody::from_string(body.to_string()))
        .expect("valid health response")
}

fn preflight_response() -> http::Response<ImborResponseBody> {
    http::Response::builder()
        .status(http::StatusCode::NO_CONTENT)
        .header("access-control-allow-methods", "GET, POST, OPTIONS")
        .header("access-control-allow-headers", "Content-Type, Accept")
        .header("access-control-max-age", "86400")
        .body(ImborResponseBody::empty())
        .expect("valid preflight response")
}

/// Add common response headers to every gateway response.
fn add_common_headers(
    mut response: http::Response<ImborResponseBody>,
    request_id: &str,
    cors: bool,
) -> http::Response<ImborResponseBody> {
    let headers = response.headers_mut();

    if let Ok(hv) = http::HeaderValue::from_str(request_id) {
        headers.entry(REQUEST_ID_HEADER).or_insert(hv);
    }

    headers.insert("server", http::HeaderValue::from_static(SERVER_NAME));

    if cors {
        headers.insert(
            "access-control-allow-origin",
            http::HeaderValue::from_static("*"),
        );
    }

    response
}

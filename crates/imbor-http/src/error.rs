//! Gateway error types.
//!
//! Errors are rendered as JSON:
//!
//! ```json
//! { "error": "BadGateway", "message": "LDP query failed", "upstreamStatus": 401 }
//! ```

use std::fmt;

/// Well-known gateway error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[non_exhaustive]
pub enum GatewayErrorCode {
    /// Malformed request (missing form field, bad encoding).
    BadRequest,
    /// No route for the path.
    NotFound,
    /// The path exists but not for this method.
    MethodNotAllowed,
    /// The request body exceeds the configured cap.
    PayloadTooLarge,
    /// The remote LDP answered with a non-200 status or an unreadable body.
    BadGateway,
    /// The call to the LDP was cancelled.
    ServiceUnavailable,
    /// The call to the LDP timed out.
    GatewayTimeout,
    /// Anything else.
    #[default]
    InternalError,
}

impl GatewayErrorCode {
    /// Returns the short error code string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BadRequest => "BadRequest",
            Self::NotFound => "NotFound",
            Self::MethodNotAllowed => "MethodNotAllowed",
            Self::PayloadTooLarge => "PayloadTooLarge",
            Self::BadGateway => "BadGateway",
            Self::ServiceUnavailable => "ServiceUnavailable",
            Self::GatewayTimeout => "GatewayTimeout",
            Self::InternalError => "InternalError",
        }
    }

    /// Returns the default HTTP status code for this error.
    #[must_use]
    pub fn default_status_code(&self) -> http::StatusCode {
        match self {
            Self::BadRequest => http::StatusCode::BAD_REQUEST,
            Self::NotFound => http::StatusCode::NOT_FOUND,
            Self::MethodNotAllowed => http::StatusCode::METHOD_NOT_ALLOWED,
            Self::PayloadTooLarge => http::StatusCode::PAYLOAD_TOO_LARGE,
            Self::BadGateway => http::StatusCode::BAD_GATEWAY,
            Self::ServiceUnavailable => http::StatusCode::SERVICE_UNAVAILABLE,
            Self::GatewayTimeout => http::StatusCode::GATEWAY_TIMEOUT,
            Self::InternalError => http::StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for GatewayErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A gateway error response.
#[derive(Debug)]
pub struct GatewayError {
    /// The error code.
    pub code: GatewayErrorCode,
    /// A human-readable error message.
    pub message: String,
    /// The HTTP status code.
    pub status_code: http::StatusCode,
    /// Status returned by the LDP, when the failure came from upstream.
    pub upstream_status: Option<u16>,
    /// The underlying source error, if any.
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GatewayError({}): {}", self.code, self.message)
    }
}

impl std::error::Error for GatewayError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

impl GatewayError {
    /// Create a new `GatewayError` with a custom message.
    #[must_use]
    pub fn with_message(code: GatewayErrorCode, message: impl Into<String>) -> Self {
        Self {
            status_code: code.default_status_code(),
            message: message.into(),
            code,
            upstream_status: None,
            source: None,
        }
    }

    /// Set the source error.
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Record the status the LDP answered with.
    #[must_use]
    pub fn with_upstream_status(mut self, status: u16) -> Self {
        self.upstream_status = Some(status);
        self
    }

    // -- Convenience constructors --

    /// Malformed request.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::with_message(GatewayErrorCode::BadRequest, message)
    }

    /// No route matches the path.
    #[must_use]
    pub fn not_found(path: &str) -> Self {
        Self::with_message(GatewayErrorCode::NotFound, format!("No route for {path}"))
    }

    /// The route does not accept this method.
    #[must_use]
    pub fn method_not_allowed(method: &http::Method, path: &str) -> Self {
        Self::with_message(
            GatewayErrorCode::MethodNotAllowed,
            format!("{method} is not allowed on {path}"),
        )
    }

    /// The body exceeds `limit` bytes.
    #[must_use]
    pub fn payload_too_large(limit: usize) -> Self {
        Self::with_message(
            GatewayErrorCode::PayloadTooLarge,
            format!("Payload too large (> {limit} bytes)"),
        )
    }

    /// The LDP failed.
    #[must_use]
    pub fn bad_gateway(message: impl Into<String>) -> Self {
        Self::with_message(GatewayErrorCode::BadGateway, message)
    }

    /// The LDP call was cancelled.
    #[must_use]
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::with_message(GatewayErrorCode::ServiceUnavailable, message)
    }

    /// The LDP call timed out.
    #[must_use]
    pub fn gateway_timeout(message: impl Into<String>) -> Self {
        Self::with_message(GatewayErrorCode::GatewayTimeout, message)
    }

    /// Internal server error.
    #[must_use]
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::with_message(GatewayErrorCode::InternalError, message)
    }
}
